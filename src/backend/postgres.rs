//! PostgreSQL full-text search adapter.
//!
//! The adapter expects a table shaped like:
//!
//! - `id`: primary key, any type castable to `text`
//! - `data`: `jsonb` document payload
//! - `search_vector`: `tsvector` over the searchable text
//!
//! Table and column names are configurable. They are validated as plain
//! SQL identifiers and quoted into the statements. The phrase itself is
//! always bound as the single `$1` parameter.

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::backend::{adapter_fn, Adapter};
use crate::error::{Error, Result};
use crate::models::{BackendId, Hit, SearchPhrase};

/// Maximum number of rows returned by a relational search.
pub const MAX_RELATIONAL_HITS: usize = 10;

/// Connection and schema settings for the relational backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub table: String,
    pub id_column: String,
    pub payload_column: String,
    pub vector_column: String,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/books".to_string(),
            table: "books".to_string(),
            id_column: "id".to_string(),
            payload_column: "data".to_string(),
            vector_column: "search_vector".to_string(),
            max_connections: 5,
        }
    }
}

/// Ranked full-text search over a PostgreSQL table.
pub struct PostgresAdapter {
    pool: PgPool,
    search_sql: String,
    fetch_sql: String,
}

impl PostgresAdapter {
    /// Build the adapter without opening a connection.
    ///
    /// The pool connects on first use. This must be called from within a
    /// tokio runtime.
    pub fn connect_lazy(config: &PostgresConfig) -> Result<Self> {
        let search_sql = build_search_sql(config)?;
        let fetch_sql = build_fetch_sql(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_lazy(&config.url)
            .map_err(|err| Error::Config(format!("invalid PostgreSQL URL: {err}")))?;

        Ok(Self {
            pool,
            search_sql,
            fetch_sql,
        })
    }

    /// Expose this adapter as an entry for the adapter table.
    pub fn into_adapter(self: Arc<Self>) -> Adapter {
        adapter_fn(move |phrase| {
            let this = Arc::clone(&self);
            async move { this.search(&phrase).await }
        })
    }

    /// Run the ranked search and return at most [`MAX_RELATIONAL_HITS`]
    /// hits ordered by descending rank.
    pub async fn search(&self, phrase: &SearchPhrase) -> Result<Vec<Hit>> {
        debug!(phrase = %phrase, "running relational full-text search");

        let rows = sqlx::query(&self.search_sql)
            .bind(phrase.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(BackendId::Pg, err))?;

        rows.iter().map(|row| hit_from_row(row, true)).collect()
    }

    /// Look up a single record by identifier.
    pub async fn fetch(&self, id: &str) -> Result<Option<Hit>> {
        debug!(id, "fetching relational record");

        let row = sqlx::query(&self.fetch_sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(BackendId::Pg, err))?;

        row.as_ref().map(|row| hit_from_row(row, false)).transpose()
    }
}

fn hit_from_row(row: &PgRow, ranked: bool) -> Result<Hit> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let detail: serde_json::Value = row.try_get("detail").map_err(decode_error)?;
    let score = if ranked {
        Some(row.try_get::<f32, _>("rank").map_err(decode_error)?)
    } else {
        None
    };

    Ok(Hit { id, detail, score })
}

/// Column-shape problems are malformed responses; anything else is a
/// transport failure.
fn decode_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_) => Error::malformed(BackendId::Pg, err.to_string()),
        other => Error::database(BackendId::Pg, other),
    }
}

/// Build the ranked search statement.
///
/// Three interpretations of `$1` are unioned:
///
/// - `phraseto_tsquery`: every word, adjacent and in order;
/// - `plainto_tsquery`: every word, anywhere in the document;
/// - `to_tsquery` over the phrase with punctuation stripped and whitespace
///   runs replaced by `|`, matching any single word.
///
/// Matches are ranked with `ts_rank` against the disjunction of all three.
pub(crate) fn build_search_sql(config: &PostgresConfig) -> Result<String> {
    let table = quote_ident(&config.table)?;
    let id = quote_ident(&config.id_column)?;
    let payload = quote_ident(&config.payload_column)?;
    let vector = quote_ident(&config.vector_column)?;
    let limit = MAX_RELATIONAL_HITS;

    Ok(format!(
        r#"SELECT ranked.id, ranked.detail, ranked.rank
FROM (
    SELECT t.{id}::text AS id,
           t.{payload} AS detail,
           ts_rank(t.{vector}, strict_q || word_q || any_q) AS rank
    FROM {table} AS t,
         phraseto_tsquery('english', $1) AS strict_q,
         plainto_tsquery('english', $1) AS word_q,
         to_tsquery(
             'english',
             regexp_replace(
                 trim(regexp_replace($1, '[^[:alnum:][:space:]]+', ' ', 'g')),
                 '\s+', ' | ', 'g'
             )
         ) AS any_q
    WHERE t.{vector} @@ strict_q
       OR t.{vector} @@ word_q
       OR t.{vector} @@ any_q
) AS ranked
ORDER BY ranked.rank DESC, ranked.id ASC
LIMIT {limit}"#
    ))
}

pub(crate) fn build_fetch_sql(config: &PostgresConfig) -> Result<String> {
    let table = quote_ident(&config.table)?;
    let id = quote_ident(&config.id_column)?;
    let payload = quote_ident(&config.payload_column)?;

    Ok(format!(
        "SELECT t.{id}::text AS id, t.{payload} AS detail FROM {table} AS t WHERE t.{id}::text = $1 LIMIT 1"
    ))
}

/// Validate and double-quote a (optionally schema-qualified) identifier.
pub(crate) fn quote_ident(name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|part| is_plain_ident(part)) {
        return Err(Error::Config(format!(
            "`{name}` is not a valid SQL identifier"
        )));
    }

    Ok(parts
        .iter()
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
