//! Client for a single remote CRUD collection.
//!
//! # Responsibilities
//! - Address `{base_url}/{resource}` and `{base_url}/{resource}/{id}`
//! - Execute list/create/update/delete with deadlines and bounded retries
//! - Keep the advisory cache in step with confirmed server responses
//!
//! # Caller Contract
//! Operations run concurrently and are not serialized against each other,
//! even when they target the same id. Callers that need ordering between
//! updates to one record must sequence them.
//!
//! Cancelling an operation (dropping its future) never mutates the cache:
//! the cache is written only after a response has been fully read and
//! validated.

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::client::cache::RecordCache;
use crate::client::error::{ClientError, ClientResult};
use crate::client::operation::{InFlight, OperationKind, PendingOperation};
use crate::client::record::{Collection, Fields, Record, RecordId};
use crate::client::response::{self, RawResponse};
use crate::config::validation::validate_config;
use crate::config::{ClientConfig, ConfigError};
use crate::observability::metrics;
use crate::resilience::{execute_with_retry, with_deadline};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Typed, retrying, cache-reconciling client for one resource.
///
/// Share it between call sites by reference or `Arc`; there is no global
/// instance.
pub struct ResourceClient<T = Fields> {
    http: reqwest::Client,
    collection_url: Url,
    config: ClientConfig,
    cache: RecordCache<T>,
    in_flight: InFlight,
}

impl<T> ResourceClient<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a client from a configuration. The configuration is validated first.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.timeouts.connect())
            .build()?;

        let collection_url = collection_url(&config.endpoint.base_url, &config.endpoint.resource)?;

        for kind in OperationKind::ALL {
            let retries = config.retries.max_retries(kind);
            if !kind.is_idempotent() && retries > 0 {
                tracing::warn!(
                    operation = %kind,
                    max_retries = retries,
                    "Retries enabled for a non-idempotent operation; a timed-out request may be applied twice"
                );
            }
        }

        tracing::debug!(
            collection_url = %collection_url,
            request_timeout_ms = config.timeouts.request_ms,
            cache_enabled = config.cache.enabled,
            "Resource client initialized"
        );

        Ok(Self {
            http,
            collection_url,
            cache: RecordCache::new(config.cache.enabled),
            config,
            in_flight: InFlight::new(),
        })
    }

    /// Fetch the full collection and replace the cache with it.
    pub async fn list(&self) -> ClientResult<Collection<T>> {
        let mut op = PendingOperation::new(OperationKind::List, None, None);
        let _guard = self.in_flight.track(&op);
        let url = self.collection_url.clone();

        let records = execute_with_retry(&mut op, &self.config.retries, &self.in_flight, |request_id| {
            let url = url.clone();
            async move {
                let raw = self.send(Method::GET, url, None, request_id).await?;
                response::decode_collection::<T>(raw)
            }
        })
        .await?;

        let records = self.cache.replace_all(records);
        metrics::record_cache_size(self.cache.len());
        Ok(Arc::unwrap_or_clone(records))
    }

    /// Create a record. The server's copy (with its assigned id) is returned
    /// and appended to a populated cache.
    pub async fn create(&self, payload: &T) -> ClientResult<Record<T>> {
        let body = to_object(payload)?;
        if body.get("id").is_some() {
            return Err(ClientError::invalid_request("create payload must not carry an id"));
        }

        let mut op = PendingOperation::new(OperationKind::Create, None, Some(body.clone()));
        let _guard = self.in_flight.track(&op);
        let url = self.collection_url.clone();

        let record = execute_with_retry(&mut op, &self.config.retries, &self.in_flight, |request_id| {
            let url = url.clone();
            let body = &body;
            async move {
                let raw = self.send(Method::POST, url, Some(body), request_id).await?;
                response::decode_record::<T>(OperationKind::Create, raw, None)
            }
        })
        .await?;

        self.cache.upsert(record.clone());
        metrics::record_cache_size(self.cache.len());
        tracing::debug!(id = %record.id, "Record created");
        Ok(record)
    }

    /// Partially update a record. The cached copy is replaced in place by the
    /// server's full record, or appended if it was not cached.
    pub async fn update<P>(&self, id: &RecordId, patch: &P) -> ClientResult<Record<T>>
    where
        P: Serialize + ?Sized,
    {
        let body = to_object(patch)?;
        check_patch_id(&body, id)?;

        let mut op = PendingOperation::new(OperationKind::Update, Some(id.clone()), Some(body.clone()));
        let _guard = self.in_flight.track(&op);
        let url = self.record_url(id)?;

        let record = execute_with_retry(&mut op, &self.config.retries, &self.in_flight, |request_id| {
            let url = url.clone();
            let body = &body;
            async move {
                let raw = self.send(Method::PATCH, url, Some(body), request_id).await?;
                response::decode_record::<T>(OperationKind::Update, raw, Some(id))
            }
        })
        .await?;

        self.cache.upsert(record.clone());
        metrics::record_cache_size(self.cache.len());
        Ok(record)
    }

    /// Delete a record and drop it from the cache.
    ///
    /// A 404 is `NotFound` unless `delete.treat_missing_as_deleted` is set,
    /// in which case it counts as success.
    pub async fn remove(&self, id: &RecordId) -> ClientResult<()> {
        let mut op = PendingOperation::new(OperationKind::Delete, Some(id.clone()), None);
        let _guard = self.in_flight.track(&op);
        let url = self.record_url(id)?;
        let treat_missing_as_deleted = self.config.delete.treat_missing_as_deleted;

        execute_with_retry(&mut op, &self.config.retries, &self.in_flight, |request_id| {
            let url = url.clone();
            async move {
                let raw = self.send(Method::DELETE, url, None, request_id).await?;
                response::check_delete(raw, id, treat_missing_as_deleted)
            }
        })
        .await?;

        self.cache.remove(id);
        metrics::record_cache_size(self.cache.len());
        Ok(())
    }

    /// Read-only view of the cache; `None` until the first successful `list`.
    pub fn snapshot(&self) -> Option<Arc<Collection<T>>> {
        self.cache.snapshot()
    }

    /// Cached copy of one record.
    pub fn cached(&self, id: &RecordId) -> Option<Record<T>> {
        self.cache.get(id)
    }

    /// Drop the cached collection.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Operations that have been started and not yet resolved.
    pub fn in_flight(&self) -> Vec<PendingOperation> {
        self.in_flight.snapshot()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    /// URL of one record: `{collection_url}/{id}` with the id percent-encoded.
    pub fn record_url(&self, id: &RecordId) -> ClientResult<Url> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::invalid_request("base URL cannot have path segments"))?
            .push(id.as_str());
        Ok(url)
    }

    /// One attempt: send, read the whole body, all under the request deadline.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        request_id: Uuid,
    ) -> ClientResult<RawResponse> {
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(body) = body {
            request = request.json(body);
        }

        with_deadline(self.config.timeouts.request(), async move {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, ClientError>(RawResponse::new(status, bytes.to_vec()))
        })
        .await
    }
}

impl<T> std::fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("collection_url", &self.collection_url.as_str())
            .field("request_timeout_ms", &self.config.timeouts.request_ms)
            .field("cache_enabled", &self.config.cache.enabled)
            .finish()
    }
}

/// `{base_url}/{resource}`, tolerating a trailing slash on the base.
fn collection_url(base_url: &str, resource: &str) -> ClientResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ClientError::invalid_request(format!("invalid base URL '{}': {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::invalid_request("base URL cannot have path segments"))?
        .pop_if_empty()
        .push(resource);
    Ok(url)
}

/// A patch may repeat the target id (as a string or a number) but never change it.
fn check_patch_id(body: &serde_json::Value, id: &RecordId) -> ClientResult<()> {
    let Some(patch_id) = body.get("id") else {
        return Ok(());
    };
    match serde_json::from_value::<RecordId>(patch_id.clone()) {
        Ok(patch_id) if &patch_id == id => Ok(()),
        _ => Err(ClientError::invalid_request(format!(
            "patch for {} attempts to change the record id",
            id
        ))),
    }
}

fn to_object<P: Serialize + ?Sized>(payload: &P) -> ClientResult<serde_json::Value> {
    let value = serde_json::to_value(payload)
        .map_err(|e| ClientError::invalid_request(format!("payload not serializable: {}", e)))?;
    if !value.is_object() {
        return Err(ClientError::invalid_request("payload must encode to a JSON object"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> ResourceClient {
        ResourceClient::new(ClientConfig::new(base_url, "items")).unwrap()
    }

    #[test]
    fn test_url_building() {
        let c = client("https://x/api");
        assert_eq!(c.collection_url().as_str(), "https://x/api/items");

        let c = client("https://x/api/");
        assert_eq!(c.collection_url().as_str(), "https://x/api/items");

        let id = RecordId::new("a b/c").unwrap();
        assert_eq!(c.record_url(&id).unwrap().as_str(), "https://x/api/items/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = ResourceClient::<Fields>::new(ClientConfig::new("nope", "items")).unwrap_err();
        assert!(matches!(err, ClientError::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn test_patch_id_normalised() {
        let id = RecordId::new("1").unwrap();
        assert!(check_patch_id(&json!({"name": "a"}), &id).is_ok());
        assert!(check_patch_id(&json!({"id": "1"}), &id).is_ok());
        assert!(check_patch_id(&json!({"id": 1}), &id).is_ok());

        for other in [json!({"id": 2}), json!({"id": "2"}), json!({"id": ""}), json!({"id": null})] {
            let err = check_patch_id(&other, &id).unwrap_err();
            assert!(matches!(err, ClientError::InvalidRequest { .. }));
        }
    }

    #[tokio::test]
    async fn test_non_object_payloads_never_sent() {
        let c = client("http://127.0.0.1:9");
        let id = RecordId::new("1").unwrap();

        let err = c.update(&id, &json!(["not", "an", "object"])).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest { .. }));

        let err = c.update(&id, &json!({"id": "2"})).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest { .. }));

        let mut payload = Fields::new();
        payload.insert("id".into(), json!("5"));
        let err = c.create(&payload).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest { .. }));
        assert!(c.in_flight().is_empty());
    }
}
