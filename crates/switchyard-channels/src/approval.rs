//! Pending-approval controller.
//!
//! In-process [`ApprovalChannel`]: each approval request is parked until a
//! UI calls [`ApprovalController::accept`] or [`ApprovalController::reject`].
//! New requests are broadcast to subscribers so a UI can render them as
//! they arrive. An optional timeout fails requests nobody answers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use switchyard_types::approval::ApprovalRequest;
use switchyard_types::config::QueueConfig;
use switchyard_types::errors::SwitchyardError;
use switchyard_types::traits::ApprovalChannel;

const SUBSCRIBER_CAPACITY: usize = 64;

/// Outcome delivered to a parked request.
#[derive(Debug)]
enum Decision {
    Accepted,
    Rejected(String),
}

struct PendingApproval {
    request: ApprovalRequest,
    respond: oneshot::Sender<Decision>,
}

/// Holds outstanding approval requests until a user decides on them.
pub struct ApprovalController {
    pending: Mutex<HashMap<Uuid, PendingApproval>>,
    added_tx: broadcast::Sender<ApprovalRequest>,
    timeout: Option<Duration>,
}

impl Default for ApprovalController {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalController {
    /// Create a controller that waits indefinitely for decisions.
    pub fn new() -> Self {
        let (added_tx, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            pending: Mutex::new(HashMap::new()),
            added_tx,
            timeout: None,
        }
    }

    /// Fail requests left undecided for longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create a controller using `approval_timeout_secs` from `queue.yaml`.
    pub fn from_config(config: &QueueConfig) -> Self {
        let controller = Self::new();
        match config.approval_timeout_secs {
            Some(secs) => controller.with_timeout(Duration::from_secs(secs)),
            None => controller,
        }
    }

    /// Receive every approval request added after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ApprovalRequest> {
        self.added_tx.subscribe()
    }

    /// Outstanding requests, oldest first.
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        let mut requests: Vec<ApprovalRequest> = self
            .lock()
            .values()
            .map(|p| p.request.clone())
            .collect();
        requests.sort_by_key(|r| r.requested_at);
        requests
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Approve the request with the given id.
    pub fn accept(&self, id: &Uuid) -> Result<(), SwitchyardError> {
        self.settle(id, Decision::Accepted)?;
        info!(approval_id = %id, "approval accepted");
        Ok(())
    }

    /// Decline the request with the given id.
    pub fn reject(&self, id: &Uuid, reason: impl Into<String>) -> Result<(), SwitchyardError> {
        let reason = reason.into();
        self.settle(id, Decision::Rejected(reason.clone()))?;
        info!(approval_id = %id, %reason, "approval rejected");
        Ok(())
    }

    /// Decline every outstanding request. Returns how many were declined.
    pub fn reject_all(&self, reason: impl Into<String>) -> usize {
        let reason = reason.into();
        let drained: Vec<PendingApproval> = self.lock().drain().map(|(_, p)| p).collect();
        let count = drained.len();
        for pending in drained {
            let _ = pending.respond.send(Decision::Rejected(reason.clone()));
        }
        if count > 0 {
            info!(count, %reason, "rejected all pending approvals");
        }
        count
    }

    fn settle(&self, id: &Uuid, decision: Decision) -> Result<(), SwitchyardError> {
        let pending = self
            .lock()
            .remove(id)
            .ok_or_else(|| SwitchyardError::Approval(format!("no pending approval with id {id}")))?;
        // The requester may have given up in the meantime.
        if pending.respond.send(decision).is_err() {
            debug!(approval_id = %id, "approval settled after requester left");
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PendingApproval>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes a parked request when its requester stops waiting.
struct PendingGuard<'a> {
    controller: &'a ApprovalController,
    id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.lock().remove(&self.id).is_some() {
            debug!(approval_id = %self.id, "pending approval abandoned");
        }
    }
}

#[async_trait]
impl ApprovalChannel for ApprovalController {
    async fn request_approval(&self, request: ApprovalRequest) -> Result<(), SwitchyardError> {
        let id = request.id;
        let (respond, decision) = oneshot::channel();

        self.lock().insert(
            id,
            PendingApproval {
                request: request.clone(),
                respond,
            },
        );
        let _guard = PendingGuard {
            controller: self,
            id,
        };
        debug!(
            approval_id = %id,
            origin = %request.origin,
            to = %request.request_data.to_chain_id,
            "approval requested"
        );
        // No subscribers is fine; the request stays listed in `pending()`.
        let _ = self.added_tx.send(request);

        let decision = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, decision).await {
                Ok(decision) => decision,
                Err(_) => {
                    warn!(approval_id = %id, timeout_secs = limit.as_secs(), "approval timed out");
                    return Err(SwitchyardError::Timeout(format!(
                        "approval {id} not answered within {}s",
                        limit.as_secs()
                    )));
                }
            },
            None => decision.await,
        };

        match decision {
            Ok(Decision::Accepted) => Ok(()),
            Ok(Decision::Rejected(reason)) => Err(SwitchyardError::ApprovalDeclined(reason)),
            Err(_) => Err(SwitchyardError::Approval(format!(
                "approval {id} was dropped without a decision"
            ))),
        }
    }
}
