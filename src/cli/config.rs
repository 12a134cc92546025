use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::backend::BackendsConfig;
use crate::cli::args::OutputFormat;
use crate::cli::{CompareArgs, GetArgs, SearchArgs};

/// Top-level representation of `.dualsearch/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub postgres: Option<PostgresSection>,

    #[serde(default)]
    pub elasticsearch: Option<ElasticsearchSection>,

    #[serde(default)]
    pub search: Option<SearchSection>,

    #[serde(default)]
    pub compare: Option<CompareSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostgresSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub id_column: Option<String>,
    #[serde(default)]
    pub payload_column: Option<String>,
    #[serde(default)]
    pub vector_column: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ElasticsearchSection {
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub index: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareSection {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub retakes: Option<u32>,
    #[serde(default)]
    pub warmup: Option<usize>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub out: Option<PathBuf>,
}

/// Discover and load a project-local `.dualsearch/config.toml` (or
/// `.dualsearch/dualsearch.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = find_project_config(&cwd);

    let Some(path) = config_path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let project_dir = current.join(".dualsearch");
        let config_toml = project_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let named_toml = project_dir.join("dualsearch.toml");
        if named_toml.is_file() {
            return Some(named_toml);
        }

        dir = current.parent();
    }

    None
}

/// Backend connection settings from the config file, layered over the
/// built-in defaults. Command-line flags are applied afterwards.
pub fn backends_config(config: Option<&CliConfig>) -> BackendsConfig {
    let mut backends = BackendsConfig::default();
    let Some(config) = config else {
        return backends;
    };

    if let Some(pg) = &config.postgres {
        let target = &mut backends.postgres;
        if let Some(url) = &pg.url {
            target.url = url.clone();
        }
        if let Some(table) = &pg.table {
            target.table = table.clone();
        }
        if let Some(column) = &pg.id_column {
            target.id_column = column.clone();
        }
        if let Some(column) = &pg.payload_column {
            target.payload_column = column.clone();
        }
        if let Some(column) = &pg.vector_column {
            target.vector_column = column.clone();
        }
        if let Some(max) = pg.max_connections {
            target.max_connections = max;
        }
    }

    if let Some(es) = &config.elasticsearch {
        let target = &mut backends.elastic;
        if let Some(scheme) = &es.scheme {
            target.scheme = scheme.clone();
        }
        if let Some(host) = &es.host {
            target.host = host.clone();
        }
        if let Some(port) = es.port {
            target.port = port;
        }
        if es.index.is_some() {
            target.index = es.index.clone();
        }
    }

    backends
}

pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    if let Some(search) = &config.search {
        if args.backend.is_none() {
            if let Some(backend) = &search.backend {
                args.backend = Some(backend.clone());
            }
        }

        if matches!(args.format, OutputFormat::Table) {
            if let Some(format) = search.format {
                args.format = format;
            }
        }
    }
}

pub fn apply_compare_config_defaults(config: &CliConfig, args: &mut CompareArgs) {
    if let Some(compare) = &config.compare {
        if args.file.is_none() {
            if let Some(file) = &compare.file {
                args.file = Some(file.clone());
            }
        }

        if args.retakes.is_none() {
            args.retakes = compare.retakes;
        }

        if args.warmup.is_none() {
            args.warmup = compare.warmup;
        }

        if args.timeout_ms.is_none() {
            args.timeout_ms = compare.timeout_ms;
        }

        if matches!(args.format, OutputFormat::Table) {
            if let Some(format) = compare.format {
                args.format = format;
            }
        }

        if args.out.is_none() {
            if let Some(out) = &compare.out {
                args.out = Some(out.clone());
            }
        }
    }
}

pub fn apply_get_config_defaults(config: &CliConfig, args: &mut GetArgs) {
    if args.backend.is_none() {
        if let Some(search) = &config.search {
            args.backend = search.backend.clone();
        }
    }
}
