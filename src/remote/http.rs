//! HTTP endpoint for a JSON collection API.
//!
//! `GET <base>` returns an array of records and `POST <base>` creates one.
//! The default target is a JSONPlaceholder-style `/posts` resource, so the
//! wire names are `title`/`body`; `text`/`category` are accepted as well.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RemoteEndpoint, RemoteError, RemoteResult};
use crate::model::{Content, Record};

/// Remote collection reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEndpoint {
    /// Create an endpoint for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

/// Remote id as sent by the server: a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    fn parse(self) -> Option<u64> {
        match self {
            Self::Number(id) => Some(id),
            Self::Text(id) => id.trim().parse().ok(),
        }
    }
}

/// Record as listed by the server.
#[derive(Debug, Deserialize)]
struct WireRecord {
    id: Option<WireId>,
    #[serde(alias = "title")]
    text: Option<String>,
    #[serde(alias = "body")]
    category: Option<String>,
    #[serde(default, alias = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
}

/// Body sent when creating a record.
#[derive(Debug, Serialize)]
struct WirePost<'a> {
    title: &'a str,
    body: &'a str,
}

/// Response to a create request.
#[derive(Debug, Deserialize)]
struct WireCreated {
    id: Option<WireId>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Translate a list response body into records.
///
/// The body must be a JSON array. Entries that do not decode or lack a
/// usable id or content are skipped.
fn decode_list(body: &str) -> RemoteResult<Vec<Record>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| RemoteError::Malformed(format!("expected an array of records: {e}")))?;

    let now = Utc::now();
    let total = entries.len();
    let records: Vec<Record> = entries
        .into_iter()
        .filter_map(|value| {
            let entry: WireRecord = serde_json::from_value(value)
                .inspect_err(|e| debug!(error = %e, "Undecodable remote entry"))
                .ok()?;
            let id = entry.id.and_then(WireId::parse)?;
            let content = Content::new(entry.text?, entry.category?);
            content
                .is_complete()
                .then(|| Record::from_remote(id, content, entry.updated_at.unwrap_or(now)))
        })
        .collect();

    if records.len() < total {
        debug!(skipped = total - records.len(), "Skipped incomplete remote entries");
    }

    Ok(records)
}

/// Extract the assigned id from a create response body.
fn decode_created(body: &str) -> RemoteResult<u64> {
    let created: WireCreated = serde_json::from_str(body)
        .map_err(|e| RemoteError::Malformed(format!("expected a created record: {e}")))?;

    created
        .id
        .and_then(WireId::parse)
        .ok_or_else(|| RemoteError::Malformed("created record has no numeric id".into()))
}

/// Best-effort error text from a non-success response.
fn parse_api_error(status: reqwest::StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<WireErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message.or(payload.error))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("HTTP error").to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    RemoteError::Status {
        status: status.as_u16(),
        message,
    }
}

impl RemoteEndpoint for HttpEndpoint {
    fn location(&self) -> &str {
        &self.base_url
    }

    async fn list(&self) -> RemoteResult<Vec<Record>> {
        let response = self
            .client
            .get(&self.base_url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body));
        }

        decode_list(&body)
    }

    async fn create(&self, content: &Content) -> RemoteResult<u64> {
        let request = WirePost {
            title: &content.text,
            body: &content.category,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body));
        }

        decode_created(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    #[test]
    fn test_decode_list_maps_wire_names() {
        let body = r#"[
            {"userId": 1, "id": 1, "title": "A", "body": "X"},
            {"id": "2", "text": "B", "category": "Y", "updatedAt": "2025-01-20T10:00:00Z"}
        ]"#;

        let records = decode_list(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId::Remote(1));
        assert_eq!(records[0].content, Content::new("A", "X"));
        assert!(records[0].synced);
        assert_eq!(records[1].id, RecordId::Remote(2));
        assert_eq!(records[1].updated_at.to_rfc3339(), "2025-01-20T10:00:00+00:00");
    }

    #[test]
    fn test_decode_list_skips_incomplete_entries() {
        let body = r#"[
            {"id": 1, "title": "A"},
            {"title": "B", "body": "Y"},
            {"id": "abc", "title": "C", "body": "Z"},
            {"id": 4, "title": " ", "body": "Z"},
            {"id": 5, "title": "E", "body": "W"}
        ]"#;

        let records = decode_list(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId::Remote(5));
    }

    #[test]
    fn test_decode_list_skips_wrong_typed_entries() {
        let body = r#"[
            {"id": 1, "title": 7, "body": "X"},
            {"id": 2, "title": "B", "body": "Y", "updatedAt": "yesterday"},
            "stray",
            {"id": 3, "title": "C", "body": "Z"}
        ]"#;

        let records = decode_list(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId::Remote(3));
        assert_eq!(records[0].content, Content::new("C", "Z"));
    }

    #[test]
    fn test_decode_list_rejects_non_array() {
        assert!(matches!(
            decode_list(r#"{"error": "nope"}"#),
            Err(RemoteError::Malformed(_))
        ));
        assert!(matches!(decode_list("<html>"), Err(RemoteError::Malformed(_))));
    }

    #[test]
    fn test_decode_created() {
        assert_eq!(decode_created(r#"{"id": 101, "title": "A"}"#).unwrap(), 101);
        assert_eq!(decode_created(r#"{"id": "55"}"#).unwrap(), 55);
        assert!(decode_created("{}").is_err());
    }

    #[test]
    fn test_parse_api_error_prefers_message() {
        let err = parse_api_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"message": " title required "}"#,
        );
        assert_eq!(err.to_string(), "title required (400)");

        let err = parse_api_error(reqwest::StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.to_string(), "Bad Gateway (502)");
    }

    #[test]
    fn test_post_body_uses_wire_names() {
        let content = Content::new("A", "X");
        let body = serde_json::to_value(WirePost {
            title: &content.text,
            body: &content.category,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"title": "A", "body": "X"}));
    }

    #[test]
    fn test_new_endpoint_keeps_location() {
        let endpoint =
            HttpEndpoint::new("http://localhost:3000/posts", Duration::from_secs(5)).unwrap();
        assert_eq!(endpoint.location(), "http://localhost:3000/posts");
    }
}
