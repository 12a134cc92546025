use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::backend::BackendsConfig;
use crate::bench::CompareOptions;
use crate::error::Error;
use crate::models::{BackendId, SearchPhrase};

/// Top-level CLI entrypoint for `dualsearch`.
#[derive(Parser, Debug)]
#[command(
    name = "dualsearch",
    about = "Query PostgreSQL and Elasticsearch side by side and compare their latency",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Increase log verbosity (`-v` info, `-vv` debug). `RUST_LOG`
    /// overrides this when set.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one phrase against one backend and print the hits.
    Search(SearchArgs),
    /// Time every phrase in a file against both backends.
    Compare(CompareArgs),
    /// Fetch a single record by identifier.
    Get(GetArgs),
}

/// Connection settings shared by every subcommand.
///
/// Unset flags fall back to the project config file and then to the
/// built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// PostgreSQL connection URL.
    #[arg(long = "pg-url", env = "DUALSEARCH_PG_URL")]
    pub pg_url: Option<String>,

    /// Table holding the searchable records.
    #[arg(long = "pg-table")]
    pub pg_table: Option<String>,

    /// Elasticsearch URL scheme (`http` or `https`).
    #[arg(long = "es-scheme")]
    pub es_scheme: Option<String>,

    /// Elasticsearch host name.
    #[arg(long = "es-host", env = "DUALSEARCH_ES_HOST")]
    pub es_host: Option<String>,

    /// Elasticsearch port.
    #[arg(long = "es-port", env = "DUALSEARCH_ES_PORT")]
    pub es_port: Option<u16>,

    /// Elasticsearch index. Searches span every index when omitted;
    /// `get` requires one.
    #[arg(long = "es-index", env = "DUALSEARCH_ES_INDEX")]
    pub es_index: Option<String>,
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Phrase to search for.
    pub phrase: String,

    /// Backend to query (`pg` or `es`).
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Output format (table or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments specific to the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Newline-delimited file of phrases, one per line.
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Additional trial rounds beyond the first (default 0).
    #[arg(short = 'r', long = "retakes")]
    pub retakes: Option<u32>,

    /// Leading samples per phrase excluded from statistics (default 1).
    #[arg(long = "warmup")]
    pub warmup: Option<usize>,

    /// Abort when a single dispatch takes longer than this many
    /// milliseconds. No limit when omitted.
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Output format (table or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also write the JSON report to this path.
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments specific to the `get` subcommand.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Record identifier.
    pub id: Option<String>,

    /// Backend to read from (`pg` or `es`).
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

/// A validated `search` invocation.
///
/// The backend stays textual: the dispatcher owns identifier validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub backend: String,
    pub phrase: SearchPhrase,
}

/// A validated `compare` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparePlan {
    pub file: PathBuf,
    pub options: CompareOptions,
    pub timeout: Option<Duration>,
}

/// A validated `get` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub backend: BackendId,
    pub id: String,
}

/// Overlay explicit connection flags onto `base`.
pub fn backends_config_from_args(args: &ConnectionArgs, base: BackendsConfig) -> BackendsConfig {
    let mut config = base;

    if let Some(url) = &args.pg_url {
        config.postgres.url = url.clone();
    }
    if let Some(table) = &args.pg_table {
        config.postgres.table = table.clone();
    }
    if let Some(scheme) = &args.es_scheme {
        config.elastic.scheme = scheme.clone();
    }
    if let Some(host) = &args.es_host {
        config.elastic.host = host.clone();
    }
    if let Some(port) = args.es_port {
        config.elastic.port = port;
    }
    if let Some(index) = &args.es_index {
        config.elastic.index = Some(index.clone());
    }

    config
}

pub fn search_request_from_args(args: &SearchArgs) -> Result<SearchRequest> {
    let Some(backend) = args.backend.clone() else {
        return Err(Error::MissingInput(
            "no backend selected; pass --backend pg|es or set [search].backend".to_string(),
        )
        .into());
    };

    Ok(SearchRequest {
        backend,
        phrase: SearchPhrase::new(args.phrase.clone()),
    })
}

pub fn compare_plan_from_args(args: &CompareArgs) -> Result<ComparePlan> {
    let Some(file) = args.file.clone() else {
        return Err(Error::MissingInput(
            "no phrase file given; pass --file PATH or set [compare].file".to_string(),
        )
        .into());
    };

    let defaults = CompareOptions::default();
    let options = CompareOptions {
        retakes: args.retakes.unwrap_or(defaults.retakes),
        warmup: args.warmup.unwrap_or(defaults.warmup),
    };

    Ok(ComparePlan {
        file,
        options,
        timeout: args.timeout_ms.map(Duration::from_millis),
    })
}

pub fn get_request_from_args(args: &GetArgs) -> Result<GetRequest> {
    let Some(id) = args.id.clone() else {
        return Err(Error::MissingInput("no record identifier given".to_string()).into());
    };
    let Some(backend) = args.backend.as_deref() else {
        return Err(Error::MissingInput(
            "no backend selected; pass --backend pg|es".to_string(),
        )
        .into());
    };

    Ok(GetRequest {
        backend: backend.parse()?,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(backend: Option<&str>) -> SearchArgs {
        SearchArgs {
            phrase: "moby dick".to_string(),
            backend: backend.map(str::to_string),
            format: OutputFormat::Table,
            connection: ConnectionArgs::default(),
        }
    }

    fn compare_args(file: Option<&str>) -> CompareArgs {
        CompareArgs {
            file: file.map(PathBuf::from),
            retakes: None,
            warmup: None,
            timeout_ms: None,
            format: OutputFormat::Table,
            out: None,
            connection: ConnectionArgs::default(),
        }
    }

    fn core_error(err: &anyhow::Error) -> &Error {
        err.downcast_ref::<Error>().expect("core error")
    }

    #[test]
    fn cli_parses_flattened_connection_flags() {
        let cli = Cli::try_parse_from([
            "dualsearch",
            "-vv",
            "search",
            "emma",
            "--backend",
            "es",
            "--es-host",
            "search.internal",
            "--es-port",
            "9201",
            "--format",
            "json",
        ])
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.backend.as_deref(), Some("es"));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.connection.es_host.as_deref(), Some("search.internal"));
        assert_eq!(args.connection.es_port, Some(9201));
    }

    #[test]
    fn search_request_keeps_backend_text_for_dispatcher() {
        let request = search_request_from_args(&search_args(Some("solr"))).expect("request");
        assert_eq!(request.backend, "solr");
        assert_eq!(request.phrase.as_str(), "moby dick");
    }

    #[test]
    fn search_without_backend_is_missing_input() {
        let err = search_request_from_args(&search_args(None)).expect_err("missing backend");
        assert!(matches!(core_error(&err), Error::MissingInput(_)));
    }

    #[test]
    fn compare_plan_applies_builtin_defaults() {
        let plan = compare_plan_from_args(&compare_args(Some("phrases.txt"))).expect("plan");
        assert_eq!(plan.file, PathBuf::from("phrases.txt"));
        assert_eq!(plan.options.retakes, 0);
        assert_eq!(plan.options.warmup, 1);
        assert_eq!(plan.timeout, None);
    }

    #[test]
    fn compare_plan_respects_all_fields() {
        let mut args = compare_args(Some("phrases.txt"));
        args.retakes = Some(3);
        args.warmup = Some(0);
        args.timeout_ms = Some(1500);

        let plan = compare_plan_from_args(&args).expect("plan");
        assert_eq!(plan.options.retakes, 3);
        assert_eq!(plan.options.warmup, 0);
        assert_eq!(plan.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn compare_without_file_is_missing_input() {
        let err = compare_plan_from_args(&compare_args(None)).expect_err("missing file");
        assert!(matches!(core_error(&err), Error::MissingInput(_)));
    }

    #[test]
    fn get_request_validates_backend() {
        let args = GetArgs {
            id: Some("2701".to_string()),
            backend: Some("mongo".to_string()),
            connection: ConnectionArgs::default(),
        };
        let err = get_request_from_args(&args).expect_err("invalid backend");
        assert!(matches!(core_error(&err), Error::InvalidBackend(s) if s == "mongo"));

        let args = GetArgs {
            id: None,
            backend: Some("pg".to_string()),
            connection: ConnectionArgs::default(),
        };
        let err = get_request_from_args(&args).expect_err("missing id");
        assert!(matches!(core_error(&err), Error::MissingInput(_)));
    }

    #[test]
    fn connection_flags_override_base_config() {
        let args = ConnectionArgs {
            pg_url: Some("postgres://db:5433/library".to_string()),
            pg_table: None,
            es_scheme: Some("https".to_string()),
            es_host: None,
            es_port: Some(9243),
            es_index: Some("books".to_string()),
        };

        let config = backends_config_from_args(&args, BackendsConfig::default());
        assert_eq!(config.postgres.url, "postgres://db:5433/library");
        assert_eq!(config.postgres.table, "books");
        assert_eq!(config.elastic.base_url(), "https://localhost:9243");
        assert_eq!(config.elastic.index.as_deref(), Some("books"));
    }
}
