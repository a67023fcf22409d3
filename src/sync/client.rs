//! Sync client trait, wire types and errors

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::Loop;

/// Remote store the local collection reconciles against
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Push the full local collection and receive the merged server state
    async fn sync(&self, loops: &[Loop], last_sync: Option<DateTime<Utc>>) -> Result<SyncResponse, SyncError>;

    /// Fetch every loop the server holds for this user
    async fn fetch_loops(&self) -> Result<Vec<Loop>, SyncError>;

    /// Whether the client holds credentials at all
    fn is_authenticated(&self) -> bool;
}

/// Request body for `POST /sync`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest<'a> {
    pub loops: &'a [Loop],
    pub last_sync_timestamp: Option<DateTime<Utc>>,
}

/// Merged server state returned by `POST /sync`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub loops: Vec<Loop>,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub server_timestamp: DateTime<Utc>,

    #[serde(default)]
    pub conflicts: Vec<SyncConflict>,
}

/// A loop the server changed after the client's last sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConflict {
    pub client_id: String,
    pub reason: String,
}

/// Errors that can occur while talking to the sync server
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SyncError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Unauthorized)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SyncError::InvalidResponse(e.to_string())
        } else {
            SyncError::Network(e.to_string())
        }
    }
}

/// Parse a server timestamp. Offsets are honoured; naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SyncError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| SyncError::InvalidResponse(format!("bad timestamp '{}': {}", raw, e)))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T12:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05T14:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05T12:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-05T12:30:00.250000").unwrap().timestamp_millis(),
            expected.timestamp_millis() + 250
        );
        assert!(matches!(parse_timestamp("yesterday"), Err(SyncError::InvalidResponse(_))));
    }

    #[test]
    fn test_response_deserializes_server_shape() {
        let body = json!({
            "loops": [{
                "id": "w1", "tier": "weekly", "type": "open", "recurrence": null,
                "status": "active", "title": "Ship", "color": "#FF6B35",
                "period": "2024-W10", "linkedTo": null, "rolledFrom": null,
                "subtasks": [{"id": "s1", "text": "scope", "done": true}]
            }],
            "serverTimestamp": "2024-03-05T12:30:00.123456",
            "conflicts": [{"client_id": "w1", "reason": "server_modified"}]
        });
        let response: SyncResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.loops.len(), 1);
        assert!(response.loops[0].subtasks[0].done);
        assert_eq!(response.conflicts[0].reason, "server_modified");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let body = serde_json::to_value(SyncRequest {
            loops: &[],
            last_sync_timestamp: None,
        })
        .unwrap();
        assert_eq!(body, json!({"loops": [], "lastSyncTimestamp": null}));
    }
}
