//! Pending operation tracking.
//!
//! # State Transitions
//! ```text
//! Pending → Succeeded
//! Pending → FailedTransient → Pending          (retries remain)
//! Pending → FailedTransient → FailedPermanent  (retries exhausted)
//! Pending → FailedPermanent                    (non-transient error)
//! ```
//!
//! An operation is registered when the caller invokes it and removed when it
//! resolves. Dropping the future (cancellation) also removes it.

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::record::RecordId;

/// The four CRUD verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    List,
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::List,
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::List => "list",
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Whether repeating the request leaves the server in the same state.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, OperationKind::List | OperationKind::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Pending,
    Succeeded,
    FailedTransient,
    FailedPermanent,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::FailedPermanent)
    }
}

/// One in-flight CRUD call.
#[derive(Debug, Clone, Serialize)]
pub struct PendingOperation {
    pub id: Uuid,
    pub kind: OperationKind,
    pub target_id: Option<RecordId>,
    pub payload: Option<serde_json::Value>,
    pub state: OperationState,
    /// Attempts started so far.
    pub attempts: u32,
}

impl PendingOperation {
    pub fn new(
        kind: OperationKind,
        target_id: Option<RecordId>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target_id,
            payload,
            state: OperationState::Pending,
            attempts: 0,
        }
    }

    /// Record the start of an attempt. Only valid from `Pending`.
    pub fn begin_attempt(&mut self) {
        debug_assert_eq!(self.state, OperationState::Pending);
        self.attempts += 1;
    }

    pub fn succeed(&mut self) {
        self.state = OperationState::Succeeded;
    }

    /// Record a failed attempt.
    ///
    /// Transient failures pass through `FailedTransient`; the operation goes
    /// back to `Pending` when `retries_left` is true, else it becomes
    /// `FailedPermanent`. Returns true when another attempt should be made.
    pub fn fail(&mut self, transient: bool, retries_left: bool) -> bool {
        if !transient {
            self.state = OperationState::FailedPermanent;
            return false;
        }
        self.state = OperationState::FailedTransient;
        if retries_left {
            self.state = OperationState::Pending;
            true
        } else {
            self.state = OperationState::FailedPermanent;
            false
        }
    }
}

/// Registry of operations that have not resolved yet.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<DashMap<Uuid, PendingOperation>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation. The entry lives as long as the returned guard.
    pub fn track(&self, op: &PendingOperation) -> InFlightGuard {
        self.inner.insert(op.id, op.clone());
        InFlightGuard {
            id: op.id,
            registry: self.inner.clone(),
        }
    }

    pub fn update(&self, op: &PendingOperation) {
        if let Some(mut entry) = self.inner.get_mut(&op.id) {
            *entry = op.clone();
        }
    }

    pub fn snapshot(&self) -> Vec<PendingOperation> {
        self.inner.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Removes its operation from the registry when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    id: Uuid,
    registry: Arc<DashMap<Uuid, PendingOperation>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
