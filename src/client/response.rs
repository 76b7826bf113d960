//! Response classification and decoding.
//!
//! Maps a fully-read HTTP response onto the client's error taxonomy for the
//! operation that produced it. Nothing in here touches the cache.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::client::error::{ClientError, ClientResult};
use crate::client::operation::OperationKind;
use crate::client::record::{Collection, Record, RecordId};

/// Status and body of a response that arrived before the deadline.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Decode a `list` response.
pub fn decode_collection<T: DeserializeOwned>(raw: RawResponse) -> ClientResult<Collection<T>> {
    ensure_success(OperationKind::List, &raw, None)?;
    serde_json::from_slice(&raw.body)
        .map_err(|e| ClientError::decode(format!("invalid collection body: {}", e)))
}

/// Decode a `create` or `update` response into the server's record.
///
/// For updates the returned id must match the target.
pub fn decode_record<T: DeserializeOwned>(
    kind: OperationKind,
    raw: RawResponse,
    target: Option<&RecordId>,
) -> ClientResult<Record<T>> {
    ensure_success(kind, &raw, target)?;
    let record: Record<T> = serde_json::from_slice(&raw.body)
        .map_err(|e| ClientError::decode(format!("invalid record body: {}", e)))?;

    if let Some(target) = target {
        if &record.id != target {
            return Err(ClientError::decode(format!(
                "server returned record {} for {} of {}",
                record.id, kind, target
            )));
        }
    }
    Ok(record)
}

/// Check a `delete` response. Any non-empty body must still be valid JSON.
pub fn check_delete(
    raw: RawResponse,
    target: &RecordId,
    treat_missing_as_deleted: bool,
) -> ClientResult<()> {
    if raw.status == StatusCode::NOT_FOUND && treat_missing_as_deleted {
        return Ok(());
    }
    ensure_success(OperationKind::Delete, &raw, Some(target))?;
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    serde_json::from_slice::<serde_json::Value>(&raw.body)
        .map(|_| ())
        .map_err(|e| ClientError::decode(format!("invalid delete body: {}", e)))
}

fn ensure_success(
    kind: OperationKind,
    raw: &RawResponse,
    target: Option<&RecordId>,
) -> ClientResult<()> {
    if raw.status.is_success() {
        return Ok(());
    }
    Err(classify_failure(kind, raw, target))
}

fn classify_failure(kind: OperationKind, raw: &RawResponse, target: Option<&RecordId>) -> ClientError {
    let status = raw.status;

    if status == StatusCode::NOT_FOUND {
        if let (Some(id), OperationKind::Update | OperationKind::Delete) = (target, kind) {
            return ClientError::NotFound { id: id.clone() };
        }
    }

    // Only payload-carrying operations can be rejected for their content.
    // A 404 is about the address, never the payload.
    if status != StatusCode::NOT_FOUND
        && status.is_client_error()
        && matches!(kind, OperationKind::Create | OperationKind::Update)
    {
        if let Ok(details @ serde_json::Value::Object(_)) =
            serde_json::from_slice::<serde_json::Value>(&raw.body)
        {
            return ClientError::Validation {
                status: status.as_u16(),
                details,
            };
        }
    }

    ClientError::Http {
        status: status.as_u16(),
        body: raw.body_text(),
    }
}
