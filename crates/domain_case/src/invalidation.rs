//! Stale view notification
//!
//! After every successful mutation the handlers announce which display
//! views are now stale. Delivery is one-way and infallible.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

use core_kernel::{BranchId, CaseId};

/// A cached view whose contents may have changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StaleView {
    CaseList { branch_id: BranchId },
    CaseDetail { branch_id: BranchId, case_id: CaseId },
    PaymentList { branch_id: BranchId },
    Dashboard { branch_id: BranchId },
    Settings { branch_id: BranchId },
    BranchList,
}

impl StaleView {
    /// Route of the view relative to the API root
    pub fn path(&self) -> String {
        match self {
            StaleView::CaseList { branch_id } => format!("/branches/{}/cases", branch_id),
            StaleView::CaseDetail { branch_id, case_id } => {
                format!("/branches/{}/cases/{}", branch_id, case_id)
            }
            StaleView::PaymentList { branch_id } => format!("/branches/{}/payments", branch_id),
            StaleView::Dashboard { branch_id } => format!("/branches/{}/dashboard", branch_id),
            StaleView::Settings { branch_id } => format!("/branches/{}/services", branch_id),
            StaleView::BranchList => "/branches".to_string(),
        }
    }
}

impl fmt::Display for StaleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Receives stale-view notifications
pub trait ViewInvalidator: Send + Sync + 'static {
    fn invalidate(&self, views: &[StaleView]);
}

/// Logs stale views and does nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInvalidator;

impl ViewInvalidator for TracingInvalidator {
    fn invalidate(&self, views: &[StaleView]) {
        for view in views {
            debug!(path = %view, "View invalidated");
        }
    }
}

/// Fans stale views out to any number of subscribers
#[derive(Debug, Clone)]
pub struct BroadcastInvalidator {
    sender: broadcast::Sender<StaleView>,
}

impl BroadcastInvalidator {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StaleView> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastInvalidator {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ViewInvalidator for BroadcastInvalidator {
    fn invalidate(&self, views: &[StaleView]) {
        for view in views {
            // No subscribers is not an error
            let _ = self.sender.send(*view);
        }
    }
}
