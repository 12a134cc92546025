//! Timed routing of a logical query to a backend adapter.
//!
//! The dispatcher is the single entry point used by both the `search`
//! command and the comparison engine. It validates the backend identifier
//! before any I/O, measures the adapter call with a monotonic clock and
//! wraps the hits in a [`SearchResult`].

use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::AdapterTable;
use crate::error::{Error, Result};
use crate::models::{BackendId, SearchPhrase, SearchResult};

/// Routes phrases to backend adapters and records elapsed time.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    adapters: AdapterTable,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(adapters: AdapterTable) -> Self {
        Self {
            adapters,
            timeout: None,
        }
    }

    /// Bound every dispatch by `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Dispatch by textual backend identifier (`"pg"` or `"es"`).
    ///
    /// Unknown identifiers fail with [`Error::InvalidBackend`] before any
    /// adapter is touched.
    pub async fn dispatch(&self, backend: &str, phrase: SearchPhrase) -> Result<SearchResult> {
        let backend: BackendId = backend.parse()?;
        self.dispatch_to(backend, phrase).await
    }

    /// Dispatch to an already-resolved backend.
    pub async fn dispatch_to(
        &self,
        backend: BackendId,
        phrase: SearchPhrase,
    ) -> Result<SearchResult> {
        let adapter = self
            .adapters
            .get(backend)
            .cloned()
            .ok_or(Error::Unregistered(backend))?;

        let start = Instant::now();
        let call = adapter(phrase.clone());
        let hits = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout {
                    backend,
                    after_ms: duration_to_ms(limit),
                })??,
            None => call.await?,
        };
        let elapsed_ms = duration_to_ms(start.elapsed());

        debug!(
            backend = %backend,
            phrase = %phrase,
            hits = hits.len(),
            elapsed_ms,
            "dispatch complete"
        );

        Ok(SearchResult::new(backend, phrase, hits, elapsed_ms))
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
