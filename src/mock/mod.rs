//! In-memory mock of a hosted CRUD service.
//!
//! # Responsibilities
//! - Serve `GET/POST {base}/{resource}` and `PATCH/DELETE {base}/{resource}/{id}`
//! - Assign sequential string ids ("1", "2", ...) on create
//! - Reject non-object or incomplete payloads with a structured 422 body
//! - Inject queued faults (delays, status codes, malformed bodies), one per request
//! - Count hits per operation kind, and record the `x-request-id` of each,
//!   for assertions
//! - Answer 415 to payloads not declared as `application/json`
//!
//! Used by the integration tests and the `mock-server` binary.

mod handlers;

use axum::{
    routing::{get, patch},
    Router,
};
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tower_http::trace::TraceLayer;

use crate::client::operation::OperationKind;
use crate::client::record::{Collection, Fields, Record};

/// A misbehaviour applied to the next request the service receives.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Sleep before handling the request normally.
    Delay(Duration),
    /// Answer immediately with this status and raw body.
    Status(u16, String),
    /// Answer 200 with a body that is not JSON.
    Garbage,
}

/// Behaviour switches of the mock service.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Collection name served.
    pub resource: String,
    /// Path prefix in front of the resource (e.g., "/api"); empty for none.
    pub base_path: String,
    /// Fields that must be present and non-blank on create.
    pub required_fields: Vec<String>,
    /// Answer 204 instead of 404 when deleting a missing id.
    pub idempotent_delete: bool,
}

impl MockOptions {
    /// Base path as "/segment[/segment...]", or empty.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            resource: "users".to_string(),
            base_path: "/api".to_string(),
            required_fields: Vec::new(),
            idempotent_delete: false,
        }
    }
}

/// Shared state of a running mock service.
#[derive(Debug)]
pub struct MockState {
    pub options: MockOptions,
    records: Mutex<Collection<Fields>>,
    faults: Mutex<VecDeque<Fault>>,
    next_id: AtomicU64,
    hits: [AtomicU32; 4],
    request_ids: Mutex<Vec<(OperationKind, Option<String>)>>,
}

impl MockState {
    pub fn new(options: MockOptions) -> Self {
        Self {
            options,
            records: Mutex::new(Vec::new()),
            faults: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            hits: Default::default(),
            request_ids: Mutex::new(Vec::new()),
        }
    }

    /// Queue faults; each is consumed by one incoming request, in order.
    pub async fn push_faults(&self, faults: impl IntoIterator<Item = Fault>) {
        self.faults.lock().await.extend(faults);
    }

    /// Create records directly, bypassing the HTTP layer.
    pub async fn seed(&self, records: impl IntoIterator<Item = Fields>) {
        let mut stored = self.records.lock().await;
        for fields in records {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).into();
            stored.push(Record::new(id, fields));
        }
    }

    pub async fn records(&self) -> Collection<Fields> {
        self.records.lock().await.clone()
    }

    /// Requests received for `kind`, including faulted ones.
    pub fn hits(&self, kind: OperationKind) -> u32 {
        self.hits[hit_slot(kind)].load(Ordering::SeqCst)
    }

    /// `x-request-id` of every request received for `kind`, in arrival order.
    pub async fn request_ids(&self, kind: OperationKind) -> Vec<Option<String>> {
        self.request_ids
            .lock()
            .await
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| id.clone())
            .collect()
    }

    fn record_hit(&self, kind: OperationKind) {
        self.hits[hit_slot(kind)].fetch_add(1, Ordering::SeqCst);
    }
}

fn hit_slot(kind: OperationKind) -> usize {
    match kind {
        OperationKind::List => 0,
        OperationKind::Create => 1,
        OperationKind::Update => 2,
        OperationKind::Delete => 3,
    }
}

/// Build the router for `state`.
pub fn router(state: Arc<MockState>) -> Router {
    let routes = Router::new()
        .route(
            "/{resource}",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/{resource}/{id}",
            patch(handlers::update_record).delete(handlers::delete_record),
        );

    let base_path = state.options.normalized_base_path();
    let routes = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    };

    routes.with_state(state).layer(TraceLayer::new_for_http())
}

/// Serve the mock on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<MockState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handle to a mock service running on an ephemeral local port.
///
/// The service stops when the handle is dropped.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn start(options: MockOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(MockState::new(options));
        let (tx, rx) = oneshot::channel::<()>();

        let server_state = state.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.await;
            };
            if let Err(e) = serve(listener, server_state, shutdown).await {
                tracing::error!(error = %e, "Mock server stopped with error");
            }
        });

        tracing::debug!(address = %addr, "Mock server listening");
        Ok(Self {
            addr,
            state,
            shutdown: Some(tx),
        })
    }

    /// Base URL a client should be configured with.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, self.state.options.normalized_base_path())
    }

    pub fn state(&self) -> &Arc<MockState> {
        &self.state
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
