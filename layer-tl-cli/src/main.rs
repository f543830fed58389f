//! tlplan: compile TL schemas into wire plans.
//!
//! ```text
//! tlplan --schema api.tl --schema mtproto.tl=mtproto --format summary
//! tlplan --config tlplan.toml --output plans.json
//! ```
//!
//! Logging follows `RUST_LOG`; `-v`/`-q` change the default level.

mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use layer_tl_parser::{Schema, SchemaConfig};
use layer_tl_plan::{Config, compile};

use crate::config::{FileConfig, SchemaArg};

#[derive(Parser, Debug)]
#[command(name = "tlplan")]
#[command(about = "Compile TL schemas into wire-layout and dispatch plans", long_about = None)]
struct Cli {
    /// TOML file listing schemas and capability tags
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Schema file (.tl or .json), optionally with a namespace prefix
    #[arg(short = 's', long = "schema", value_name = "PATH[=PREFIX]")]
    schemas: Vec<SchemaArg>,

    /// Default supertype of unprefixed schemas given with --schema
    #[arg(long = "supertype", value_name = "NAME")]
    supertype: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    format: Format,

    /// Write to FILE instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// More logging (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Format {
    /// The full plan set as pretty JSON
    Json,
    /// One line per declaration
    Summary,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    run(cli)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let (entries, plan_config) = collect_schemas(&cli)?;
    if entries.is_empty() {
        bail!("no schemas given; use --schema or a --config file with [[schemas]]");
    }

    let mut schemas = Vec::with_capacity(entries.len());
    for (path, schema_config) in entries {
        let schema = Schema::load(&path, schema_config)
            .with_context(|| format!("loading schema {}", path.display()))?;
        schemas.push(schema);
    }

    let plans = compile(&schemas, &plan_config).context("compiling plans")?;
    let rendered = match cli.format {
        Format::Json => output::render_json(&plans)?,
        Format::Summary => output::render_summary(&plans),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("[tlplan] wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Schemas from the config file first, then from `--schema`, in order.
fn collect_schemas(cli: &Cli) -> anyhow::Result<(Vec<(PathBuf, SchemaConfig)>, Config)> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let mut entries: Vec<(PathBuf, SchemaConfig)> =
        file.schemas.into_iter().map(|e| (e.path, e.config)).collect();
    entries.extend(
        cli.schemas
            .iter()
            .map(|arg| (arg.path.clone(), arg.schema_config(cli.supertype.as_deref()))),
    );
    Ok((entries, file.plan))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn cli_parses_repeated_schemas() {
        let cli = Cli::try_parse_from([
            "tlplan", "-s", "api.tl", "--schema", "mtproto.tl=mtproto", "-f", "summary", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.schemas.len(), 2);
        assert_eq!(cli.schemas[1].prefix, "mtproto");
        assert_eq!(cli.format, Format::Summary);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["tlplan", "-q", "-v"]).is_err());
    }

    #[test]
    fn runs_end_to_end_into_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("api.tl");
        std::fs::write(&schema, "pair#1 a:int b:long = Pair;\n").unwrap();
        let out = dir.path().join("plans.txt");

        let args: Vec<OsString> = vec![
            "tlplan".into(),
            "--schema".into(),
            schema.into_os_string(),
            "--format".into(),
            "summary".into(),
            "--output".into(),
            out.clone().into_os_string(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        run(cli).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.lines().any(|l| l.starts_with("00000001") && l.ends_with("size=16")));
    }

    #[test]
    fn missing_schemas_is_an_error() {
        let cli = Cli::try_parse_from(["tlplan"]).unwrap();
        assert!(run(cli).is_err());
    }
}
