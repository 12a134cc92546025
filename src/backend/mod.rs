//! Backend query adapters and the lookup table that routes to them.
//!
//! Each backend is reached through a plain async function stored in an
//! [`AdapterTable`] keyed by [`BackendId`]. Adding a backend means adding
//! an enum variant, an adapter and one table entry.

mod elastic;
mod postgres;

pub use elastic::{ElasticAdapter, ElasticConfig};
pub use postgres::{PostgresAdapter, PostgresConfig, MAX_RELATIONAL_HITS};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::Result;
use crate::models::{BackendId, Hit, SearchPhrase};

/// Future returned by an adapter invocation.
pub type AdapterFuture = BoxFuture<'static, Result<Vec<Hit>>>;

/// Search function for one backend: phrase in, ranked hits out.
pub type Adapter = Arc<dyn Fn(SearchPhrase) -> AdapterFuture + Send + Sync>;

/// Wrap an async closure as an [`Adapter`].
pub fn adapter_fn<F, Fut>(f: F) -> Adapter
where
    F: Fn(SearchPhrase) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Hit>>> + Send + 'static,
{
    Arc::new(move |phrase| f(phrase).boxed())
}

/// Connection settings for both backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendsConfig {
    pub postgres: PostgresConfig,
    pub elastic: ElasticConfig,
}

/// Lookup table mapping backend identifiers to adapter functions.
#[derive(Clone, Default)]
pub struct AdapterTable {
    entries: HashMap<BackendId, Adapter>,
}

impl AdapterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the adapter for a backend.
    pub fn register(&mut self, backend: BackendId, adapter: Adapter) -> &mut Self {
        self.entries.insert(backend, adapter);
        self
    }

    pub fn get(&self, backend: BackendId) -> Option<&Adapter> {
        self.entries.get(&backend)
    }

    pub fn contains(&self, backend: BackendId) -> bool {
        self.entries.contains_key(&backend)
    }

    /// Build the production table with both backends wired from `config`.
    ///
    /// The PostgreSQL pool connects lazily, so no I/O happens here; the
    /// first query against each backend pays the connection cost.
    pub fn from_config(config: &BackendsConfig) -> Result<Self> {
        let mut table = Self::new();
        for backend in BackendId::ALL {
            table.register(backend, build_adapter(backend, config)?);
        }
        Ok(table)
    }

    /// Build a table holding only `backend`.
    ///
    /// Settings for the other backend are never read, so a broken
    /// `[postgres]` section does not affect an Elasticsearch-only run.
    pub fn for_backend(backend: BackendId, config: &BackendsConfig) -> Result<Self> {
        let mut table = Self::new();
        table.register(backend, build_adapter(backend, config)?);
        Ok(table)
    }
}

impl std::fmt::Debug for AdapterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("AdapterTable").field("backends", &keys).finish()
    }
}

fn build_adapter(backend: BackendId, config: &BackendsConfig) -> Result<Adapter> {
    let adapter = match backend {
        BackendId::Pg => {
            let postgres = PostgresAdapter::connect_lazy(&config.postgres)?;
            Arc::new(postgres).into_adapter()
        }
        BackendId::Es => {
            let elastic = ElasticAdapter::new(config.elastic.clone())?;
            Arc::new(elastic).into_adapter()
        }
    };
    Ok(adapter)
}

/// Fetch a single record by identifier from the selected backend.
pub async fn fetch_record(
    backend: BackendId,
    config: &BackendsConfig,
    id: &str,
) -> Result<Option<Hit>> {
    match backend {
        BackendId::Pg => {
            PostgresAdapter::connect_lazy(&config.postgres)?
                .fetch(id)
                .await
        }
        BackendId::Es => ElasticAdapter::new(config.elastic.clone())?.fetch(id).await,
    }
}
