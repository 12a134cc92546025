//! Elasticsearch query-string search adapter.
//!
//! Issues `GET /[{index}/]_search?q=<phrase>` and maps the native
//! `hits.hits[]` envelope into normalized hits, preserving the engine's
//! ranking order.

use std::sync::Arc;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::backend::{adapter_fn, Adapter};
use crate::error::{Error, Result};
use crate::models::{BackendId, Hit, SearchPhrase};

/// Endpoint settings for the search-engine backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Index to search; `None` searches every index.
    pub index: Option<String>,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 9200,
            index: None,
        }
    }
}

impl ElasticConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:9200`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DocEnvelope {
    #[serde(rename = "_id")]
    id: String,
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<serde_json::Value>,
}

/// HTTP client for an Elasticsearch endpoint.
pub struct ElasticAdapter {
    client: Client,
    config: ElasticConfig,
}

impl ElasticAdapter {
    pub fn new(config: ElasticConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| Error::http(BackendId::Es, err))?;

        Ok(Self { client, config })
    }

    /// Expose this adapter as an entry for the adapter table.
    pub fn into_adapter(self: Arc<Self>) -> Adapter {
        adapter_fn(move |phrase| {
            let this = Arc::clone(&self);
            async move { this.search(&phrase).await }
        })
    }

    /// Execute a query-string search, returning hits in native rank order.
    pub async fn search(&self, phrase: &SearchPhrase) -> Result<Vec<Hit>> {
        let url = self.search_url();
        debug!(%url, phrase = %phrase, "running search-engine query");

        let body = self
            .client
            .get(&url)
            .query(&[("q", phrase.as_str())])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| Error::http(BackendId::Es, err))?
            .bytes()
            .await
            .map_err(|err| Error::http(BackendId::Es, err))?;

        parse_search_envelope(&body)
    }

    /// Look up a single document by identifier.
    ///
    /// Requires a configured index; a 404 maps to `Ok(None)`.
    pub async fn fetch(&self, id: &str) -> Result<Option<Hit>> {
        let Some(index) = self.config.index.as_deref() else {
            return Err(Error::Config(
                "an Elasticsearch index must be configured to fetch by id".to_string(),
            ));
        };

        let url = self.doc_url(index, id)?;
        debug!(%url, "fetching search-engine document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| Error::http(BackendId::Es, err))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .error_for_status()
            .map_err(|err| Error::http(BackendId::Es, err))?
            .bytes()
            .await
            .map_err(|err| Error::http(BackendId::Es, err))?;

        parse_doc_envelope(&body)
    }

    /// `{base}/{index}/_doc/{id}` with each segment percent-encoded.
    fn doc_url(&self, index: &str, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url())
            .map_err(|err| Error::Config(format!("invalid Elasticsearch endpoint: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| Error::Config("Elasticsearch endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend([index, "_doc", id]);
        Ok(url)
    }

    fn search_url(&self) -> String {
        let base = self.config.base_url();
        match self.config.index.as_deref() {
            Some(index) if !index.is_empty() => format!("{base}/{index}/_search"),
            _ => format!("{base}/_search"),
        }
    }
}

fn parse_search_envelope(body: &[u8]) -> Result<Vec<Hit>> {
    let envelope: SearchEnvelope = serde_json::from_slice(body)
        .map_err(|err| Error::malformed(BackendId::Es, err.to_string()))?;

    Ok(envelope
        .hits
        .hits
        .into_iter()
        .map(|raw| Hit {
            id: raw.id,
            detail: raw.source,
            score: None,
        })
        .collect())
}

fn parse_doc_envelope(body: &[u8]) -> Result<Option<Hit>> {
    let envelope: DocEnvelope = serde_json::from_slice(body)
        .map_err(|err| Error::malformed(BackendId::Es, err.to_string()))?;

    if !envelope.found {
        return Ok(None);
    }

    let detail = envelope
        .source
        .ok_or_else(|| Error::malformed(BackendId::Es, "document found without `_source`"))?;

    Ok(Some(Hit {
        id: envelope.id,
        detail,
        score: None,
    }))
}
