//! The outside view of a running customer.

use super::CustomerError;
use crate::model::{CustomerId, ResourceVector};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, instrument};

/// Progress of one customer, published after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerStatus {
    pub transactions: usize,
    pub finished: usize,
    pub closed: bool,
}

impl CustomerStatus {
    /// Closed, and every transaction it will ever have is finished.
    pub fn is_done(&self) -> bool {
        self.closed && self.finished == self.transactions
    }
}

/// Loads transactions into a customer, closes it, and watches its progress.
///
/// Closing drops the command channel; the customer notices once it has
/// nothing left to do and stops waiting for more work.
pub struct CustomerHandle {
    id: CustomerId,
    maximum: ResourceVector,
    sender: Option<mpsc::Sender<ResourceVector>>,
    status: watch::Receiver<CustomerStatus>,
}

impl CustomerHandle {
    pub(crate) fn new(
        id: CustomerId,
        maximum: ResourceVector,
        sender: mpsc::Sender<ResourceVector>,
        status: watch::Receiver<CustomerStatus>,
    ) -> Self {
        Self {
            id,
            maximum,
            sender: Some(sender),
            status,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    /// The customer's maximum claim, as fetched from the bank at construction.
    pub fn maximum(&self) -> &ResourceVector {
        &self.maximum
    }

    /// Append one transaction in the `waiting` state.
    #[instrument(skip(self), fields(customer = %self.id))]
    pub async fn add_request(&self, request: ResourceVector) -> Result<(), CustomerError> {
        if request.len() != self.maximum.len() {
            return Err(CustomerError::DimensionMismatch {
                expected: self.maximum.len(),
                found: request.len(),
            });
        }
        let sender = self.sender.as_ref().ok_or(CustomerError::Closed(self.id))?;
        debug!("Adding request");
        sender
            .send(request)
            .await
            .map_err(|_| CustomerError::Stopped(self.id))
    }

    /// No more transactions will be added.
    pub fn close(&mut self) {
        self.sender = None;
    }

    pub fn status(&self) -> CustomerStatus {
        *self.status.borrow()
    }

    pub fn is_done(&self) -> bool {
        self.status().is_done()
    }

    /// Wait until the customer reports done.
    ///
    /// Fails with [`CustomerError::Stopped`] if the customer task ended first,
    /// which only happens when it hit an error.
    pub async fn wait_done(&mut self) -> Result<CustomerStatus, CustomerError> {
        let status = self
            .status
            .wait_for(CustomerStatus::is_done)
            .await
            .map_err(|_| CustomerError::Stopped(self.id))?;
        Ok(*status)
    }
}
