//! Request handlers of the mock CRUD service.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::client::operation::OperationKind;
use crate::client::record::{Fields, Record, RecordId};
use crate::mock::{Fault, MockState};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn list_records(
    State(state): State<Arc<MockState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(early) = state.intercept(OperationKind::List, &resource, &headers).await {
        return early;
    }
    let records = state.records.lock().await.clone();
    Json(records).into_response()
}

pub async fn create_record(
    State(state): State<Arc<MockState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(early) = state.intercept(OperationKind::Create, &resource, &headers).await {
        return early;
    }
    let mut fields = match parse_object(&headers, &body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    fields.remove("id");

    let missing: Vec<&str> = state
        .options
        .required_fields
        .iter()
        .filter(|f| fields.get(f.as_str()).map_or(true, |v| v.is_null() || v.as_str().is_some_and(|s| s.trim().is_empty())))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return unprocessable("missing required fields", &missing);
    }

    let record = Record::new(state.next_id(), fields);
    state.records.lock().await.push(record.clone());
    tracing::debug!(id = %record.id, "Mock record created");
    (StatusCode::CREATED, Json(record)).into_response()
}

pub async fn update_record(
    State(state): State<Arc<MockState>>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(early) = state.intercept(OperationKind::Update, &resource, &headers).await {
        return early;
    }
    let mut patch = match parse_object(&headers, &body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    patch.remove("id");

    let mut records = state.records.lock().await;
    match records.iter_mut().find(|r| r.id.as_str() == id) {
        Some(record) => {
            for (k, v) in patch {
                record.fields.insert(k, v);
            }
            Json(record.clone()).into_response()
        }
        None => not_found(&id),
    }
}

pub async fn delete_record(
    State(state): State<Arc<MockState>>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Some(early) = state.intercept(OperationKind::Delete, &resource, &headers).await {
        return early;
    }
    let mut records = state.records.lock().await;
    let before = records.len();
    records.retain(|r| r.id.as_str() != id);

    if records.len() < before || state.options.idempotent_delete {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

impl MockState {
    /// Count the hit and its request id, then apply the resource check and
    /// any queued fault.
    async fn intercept(&self, kind: OperationKind, resource: &str, headers: &HeaderMap) -> Option<Response> {
        self.record_hit(kind);
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.request_ids.lock().await.push((kind, request_id));

        if resource != self.options.resource {
            return Some((StatusCode::NOT_FOUND, Json(json!({"error": "unknown resource"}))).into_response());
        }

        let fault = self.faults.lock().await.pop_front()?;
        match fault {
            Fault::Delay(delay) => {
                tokio::time::sleep(delay).await;
                None
            }
            Fault::Status(status, body) => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Some((status, body).into_response())
            }
            Fault::Garbage => Some((StatusCode::OK, "<html>definitely not json</html>").into_response()),
        }
    }

    fn next_id(&self) -> RecordId {
        RecordId::from(self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
    }
}

fn parse_object(headers: &HeaderMap, body: &[u8]) -> Result<Fields, Response> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().to_ascii_lowercase().starts_with("application/json"));
    if !is_json {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({"error": "expected application/json"})),
        )
            .into_response());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        _ => Err(unprocessable("payload must be a JSON object", &[])),
    }
}

fn unprocessable(error: &str, fields: &[&str]) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"error": error, "fields": fields})),
    )
        .into_response()
}

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": format!("{} not found", id)}))).into_response()
}
