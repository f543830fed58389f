//! The in-memory schema model and its per-schema merge configuration.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::iterator::DeclarationReader;
use crate::lexer::Lexer;
use crate::tl::{Category, Declaration};

/// How JSON `id` strings are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdFormat {
    /// `0x` prefixes or hex letters mean hexadecimal, anything else decimal.
    #[default]
    Auto,
    /// Always hexadecimal.
    Hex,
    /// Always decimal, signed or unsigned 32-bit.
    Decimal,
}

/// Per-schema settings applied while merging several schemas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Human readable label used in diagnostics, e.g. `api` or `mtproto`.
    pub name: String,
    /// Namespace prefix prepended to every type key of this schema.
    /// Empty for the primary API schema.
    pub namespace_prefix: String,
    /// Supertype tag every resolved type of this schema carries.
    pub default_supertype: String,
    /// Interpretation of JSON identifiers.
    pub id_format: IdFormat,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            name: "api".into(),
            namespace_prefix: String::new(),
            default_supertype: "TlObject".into(),
            id_format: IdFormat::Auto,
        }
    }
}

impl SchemaConfig {
    /// The conventional configuration of the low-level transport schema.
    pub fn mtproto() -> Self {
        Self {
            name: "mtproto".into(),
            namespace_prefix: "mtproto".into(),
            default_supertype: "MTProtoObject".into(),
            id_format: IdFormat::Auto,
        }
    }
}

/// All constructors and methods of one schema, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Merge settings.
    pub config: SchemaConfig,
    /// The layer from `// LAYER N` or the JSON `version` field.
    pub layer: Option<u32>,
    /// Data constructors.
    pub constructors: Vec<Declaration>,
    /// RPC methods.
    pub methods: Vec<Declaration>,
}

impl Schema {
    /// An empty schema.
    pub fn new(config: SchemaConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Appends a declaration to the list matching its category.
    pub fn push(&mut self, declaration: Declaration) {
        match declaration.category {
            Category::Constructor => self.constructors.push(declaration),
            Category::Method => self.methods.push(declaration),
        }
    }

    /// Constructors followed by methods.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.constructors.iter().chain(&self.methods)
    }

    /// Reads IDL text from any byte source.
    pub fn from_tl_reader<R: Read>(reader: R, config: SchemaConfig) -> Result<Self, ParseError> {
        let mut schema = Self::new(config);
        let mut declarations = DeclarationReader::new(Lexer::new(reader));
        for declaration in declarations.by_ref() {
            schema.push(declaration?);
        }
        schema.layer = declarations.layer();
        schema.log_loaded();
        Ok(schema)
    }

    /// Parses in-memory IDL text.
    pub fn from_tl_str(src: &str, config: SchemaConfig) -> Result<Self, ParseError> {
        Self::from_tl_reader(src.as_bytes(), config)
    }

    /// Parses a JSON schema document.
    pub fn from_json_str(src: &str, config: SchemaConfig) -> Result<Self, ParseError> {
        let schema = crate::json::parse_json_schema(src, config)?;
        schema.log_loaded();
        Ok(schema)
    }

    /// Reads a JSON schema document from any byte source.
    pub fn from_json_reader<R: Read>(mut reader: R, config: SchemaConfig) -> Result<Self, ParseError> {
        let mut src = String::new();
        reader.read_to_string(&mut src)?;
        Self::from_json_str(&src, config)
    }

    /// Loads a schema file, choosing the JSON front-end for `.json` files and
    /// the IDL lexer for everything else.
    pub fn load(path: impl AsRef<Path>, config: SchemaConfig) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        log::debug!("[tl-parse] reading {}", path.display());
        if is_json {
            Self::from_json_reader(file, config)
        } else {
            Self::from_tl_reader(file, config)
        }
    }

    fn log_loaded(&self) {
        log::info!(
            "[tl-parse] schema `{}`: {} constructors, {} methods{}",
            self.config.name,
            self.constructors.len(),
            self.methods.len(),
            self.layer.map(|l| format!(", layer {l}")).unwrap_or_default(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_are_routed_by_section() {
        let src = "\
// LAYER 7
boolFalse#bc799737 = Bool;
boolTrue#997275b5 = Bool;
---functions---
ping#7abe77ec ping_id:long = Pong;
";
        let schema = Schema::from_tl_str(src, SchemaConfig::default()).unwrap();
        assert_eq!(schema.layer, Some(7));
        assert_eq!(schema.constructors.len(), 2);
        assert_eq!(schema.methods.len(), 1);
        assert_eq!(schema.methods[0].category, Category::Method);
        assert_eq!(schema.declarations().count(), 3);
    }

    #[test]
    fn mtproto_config() {
        let config = SchemaConfig::mtproto();
        assert_eq!(config.namespace_prefix, "mtproto");
        assert_eq!(config.default_supertype, "MTProtoObject");
    }
}
