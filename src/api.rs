// API client module: a small blocking HTTP client that talks PostgREST
// conventions against the hosted store. One method per query shape; all
// of them return typed `StoreError`s for the caller to deal with.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use crate::error::StoreError;
use crate::ops::RecordStore;
use crate::schema::{record_id, Kind, Record};

/// Remote store client holding a reqwest blocking client and the base
/// URL of the service. The access key is baked into the client's
/// default headers at construction time.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Error body shape the backend uses for failed requests. Only the
/// human-readable `message` is interesting here.
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl ApiClient {
    /// Build a client from `NEXT_PUBLIC_SUPABASE_URL` and
    /// `NEXT_PUBLIC_SUPABASE_KEY`, loading `.env.local` first when it
    /// exists. Either variable missing is a fatal startup condition.
    pub fn from_env() -> Result<Self> {
        dotenvy::from_filename(".env.local").ok();

        let base_url = std::env::var("NEXT_PUBLIC_SUPABASE_URL")
            .context("NEXT_PUBLIC_SUPABASE_URL is not set; check .env.local")?;
        let api_key = std::env::var("NEXT_PUBLIC_SUPABASE_KEY")
            .context("NEXT_PUBLIC_SUPABASE_KEY is not set; check .env.local")?;

        // The service expects the key both as `apikey` and as a bearer
        // token, on every request.
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&api_key).context("service key is not valid header text")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .context("service key is not valid header text")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, kind: Kind) -> String {
        format!("{}/rest/v1/{}", self.base_url, kind.table())
    }

    /// Status check plus JSON row decoding, shared by every read path.
    fn rows(res: Response, kind: Kind) -> Result<Vec<Record>, StoreError> {
        let res = Self::ensure_ok(res, kind)?;
        Ok(res.json()?)
    }

    fn ensure_ok(res: Response, kind: Kind) -> Result<Response, StoreError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_else(|_| "".into());
        Err(StoreError::Api {
            table: kind.table().to_string(),
            status,
            message: api_message(&body),
        })
    }
}

impl RecordStore for ApiClient {
    fn select_all(&self, kind: Kind) -> Result<Vec<Record>, StoreError> {
        debug!(table = kind.table(), "select all");
        let res = self
            .client
            .get(self.table_url(kind))
            .query(&[("select", "*")])
            .send()?;
        Self::rows(res, kind)
    }

    fn select_ids(&self, kind: Kind) -> Result<Vec<String>, StoreError> {
        let res = self
            .client
            .get(self.table_url(kind))
            .query(&[("select", "id")])
            .send()?;
        Ok(Self::rows(res, kind)?.iter().filter_map(record_id).collect())
    }

    fn find_by_id(&self, kind: Kind, id: &str) -> Result<Option<Record>, StoreError> {
        let filter = id_filter(id);
        let res = self
            .client
            .get(self.table_url(kind))
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()?;
        Ok(Self::rows(res, kind)?.into_iter().next())
    }

    fn search(&self, kind: Kind, field: &str, needle: &str) -> Result<Vec<Record>, StoreError> {
        debug!(table = kind.table(), field, needle, "search");
        let pattern = contains_pattern(needle);
        let res = self
            .client
            .get(self.table_url(kind))
            .query(&[("select", "*"), (field, pattern.as_str())])
            .send()?;
        Self::rows(res, kind)
    }

    fn insert(&self, kind: Kind, record: &Record) -> Result<Record, StoreError> {
        debug!(table = kind.table(), "insert");
        let res = self
            .client
            .post(self.table_url(kind))
            .header("Prefer", "return=representation")
            .json(record)
            .send()?;
        Self::rows(res, kind)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::EmptyReply {
                table: kind.table().to_string(),
            })
    }

    fn update(&self, kind: Kind, id: &str, changes: &Record) -> Result<Option<Record>, StoreError> {
        debug!(table = kind.table(), id, "update");
        let filter = id_filter(id);
        let res = self
            .client
            .patch(self.table_url(kind))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(changes)
            .send()?;
        // An empty row set means no record carries this id.
        Ok(Self::rows(res, kind)?.into_iter().next())
    }

    fn delete(&self, kind: Kind, id: &str) -> Result<(), StoreError> {
        debug!(table = kind.table(), id, "delete");
        let filter = id_filter(id);
        let res = self
            .client
            .delete(self.table_url(kind))
            .query(&[("id", filter.as_str())])
            .send()?;
        Self::ensure_ok(res, kind)?;
        Ok(())
    }
}

/// Exact-match filter expression for the id column.
fn id_filter(id: &str) -> String {
    format!("eq.{id}")
}

/// Case-insensitive "contains" filter value. `*` is the backend's
/// wildcard, so `abc` becomes `ilike.*abc*`.
fn contains_pattern(needle: &str) -> String {
    format!("ilike.*{needle}*")
}

/// Pull the `message` field out of a JSON error body, falling back to
/// the raw text for anything the backend did not shape that way.
fn api_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = parsed.message {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error body".to_string()
    } else {
        trimmed.to_string()
    }
}
