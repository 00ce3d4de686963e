//! A single request-then-release cycle owned by one customer.

use super::ResourceVector;
use serde::{Deserialize, Serialize};

/// Where a transaction is in its life cycle.
///
/// Transitions only move forward: `Waiting -> Pending -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Queued, holding nothing, waiting for the bank to admit it.
    Waiting,
    /// Granted and physically holding its units.
    Pending,
    /// Units returned. Kept for bookkeeping, never reused.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub request: ResourceVector,
    status: TransactionStatus,
}

impl Transaction {
    pub fn new(request: ResourceVector) -> Self {
        Self {
            request,
            status: TransactionStatus::Waiting,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == TransactionStatus::Finished
    }

    /// Move to the next status. Returns the new status, or `None` if the
    /// transaction was already finished.
    pub fn advance(&mut self) -> Option<TransactionStatus> {
        self.status = match self.status {
            TransactionStatus::Waiting => TransactionStatus::Pending,
            TransactionStatus::Pending => TransactionStatus::Finished,
            TransactionStatus::Finished => return None,
        };
        Some(self.status)
    }
}
