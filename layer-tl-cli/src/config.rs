//! `tlplan.toml` and `--schema` arguments.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use layer_tl_parser::SchemaConfig;
use layer_tl_plan::Config;
use serde::Deserialize;

/// Contents of the `--config` file.
///
/// ```toml
/// [[schemas]]
/// path = "api.tl"
///
/// [[schemas]]
/// path = "mtproto.json"
/// name = "mtproto"
/// namespace_prefix = "mtproto"
/// default_supertype = "MTProtoObject"
///
/// [capabilities.exact]
/// "InputPeer" = ["Peer"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Schemas to merge, in order.
    pub schemas: Vec<SchemaEntry>,
    /// Plan settings.
    #[serde(flatten)]
    pub plan: Config,
}

/// One `[[schemas]]` table.
#[derive(Debug, Deserialize)]
pub struct SchemaEntry {
    /// Schema file; `.json` selects the JSON front-end.
    pub path: PathBuf,
    /// Merge settings.
    #[serde(flatten)]
    pub config: SchemaConfig,
}

impl FileConfig {
    /// Reads and parses a TOML config. Relative schema paths are resolved
    /// against the config file's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if let Some(dir) = path.parent() {
            for entry in &mut config.schemas {
                if entry.path.is_relative() {
                    entry.path = dir.join(&entry.path);
                }
            }
        }
        Ok(config)
    }
}

/// `--schema PATH[=PREFIX]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaArg {
    /// Schema file.
    pub path: PathBuf,
    /// Namespace prefix, empty for the primary schema.
    pub prefix: String,
}

impl FromStr for SchemaArg {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (path, prefix) = match raw.rsplit_once('=') {
            Some((path, prefix)) => (path, prefix),
            None => (raw, ""),
        };
        if path.is_empty() {
            return Err(format!("missing schema path in `{raw}`"));
        }
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid namespace prefix `{prefix}`"));
        }
        Ok(Self { path: path.into(), prefix: prefix.to_owned() })
    }
}

impl SchemaArg {
    /// Merge settings for this schema. `supertype` overrides the default
    /// supertype of unprefixed schemas.
    pub fn schema_config(&self, supertype: Option<&str>) -> SchemaConfig {
        match self.prefix.as_str() {
            "" => {
                let mut config = SchemaConfig::default();
                if let Some(supertype) = supertype {
                    config.default_supertype = supertype.to_owned();
                }
                config
            }
            "mtproto" => SchemaConfig::mtproto(),
            prefix => SchemaConfig {
                name: prefix.to_owned(),
                namespace_prefix: prefix.to_owned(),
                ..SchemaConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_tl_parser::IdFormat;

    #[test]
    fn schema_arg_with_and_without_prefix() {
        let arg: SchemaArg = "api.tl".parse().unwrap();
        assert_eq!(arg.prefix, "");
        assert_eq!(arg.schema_config(Some("ApiObject")).default_supertype, "ApiObject");

        let arg: SchemaArg = "dir/mtproto.json=mtproto".parse().unwrap();
        assert_eq!(arg.path, PathBuf::from("dir/mtproto.json"));
        assert_eq!(arg.schema_config(Some("ignored")), SchemaConfig::mtproto());

        assert!("=x".parse::<SchemaArg>().is_err());
        assert!("a.tl=bad-prefix".parse::<SchemaArg>().is_err());
    }

    #[test]
    fn toml_config() {
        let config: FileConfig = toml::from_str(
            r#"
[[schemas]]
path = "api.tl"

[[schemas]]
path = "mtproto.json"
name = "mtproto"
namespace_prefix = "mtproto"
default_supertype = "MTProtoObject"
id_format = "decimal"

[capabilities.exact]
"InputPeer" = ["Peer"]

[[capabilities.patterns]]
pattern = "^Input"
tags = ["Input"]
"#,
        )
        .unwrap();
        assert_eq!(config.schemas.len(), 2);
        assert_eq!(config.schemas[0].config, SchemaConfig::default());
        assert_eq!(config.schemas[1].config.namespace_prefix, "mtproto");
        assert_eq!(config.schemas[1].config.id_format, IdFormat::Decimal);
        assert_eq!(config.plan.capabilities.exact["InputPeer"], ["Peer"]);
        assert_eq!(config.plan.capabilities.patterns[0].tags, ["Input"]);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tlplan.toml");
        std::fs::write(&path, "[[schemas]]\npath = \"api.tl\"\n").unwrap();
        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.schemas[0].path, dir.path().join("api.tl"));
    }
}
