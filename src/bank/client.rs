//! # Bank Client
//!
//! A cheap, cloneable handle that customers use to talk to the [`BankActor`](super::BankActor).

use super::message::BankRequest;
use super::{BankError, BankSnapshot};
use crate::model::{CustomerId, ResourceVector};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Type-safe async API over the bank's message channel.
///
/// Holds only a sender, so cloning is inexpensive. Each call sends one
/// [`BankRequest`] and awaits its one-shot reply.
#[derive(Clone)]
pub struct BankClient {
    sender: mpsc::Sender<BankRequest>,
}

impl BankClient {
    pub fn new(sender: mpsc::Sender<BankRequest>) -> Self {
        Self { sender }
    }

    /// Ask the bank to grant `request` for one transaction.
    ///
    /// `Ok(false)` means "not now": the units are busy or granting them would
    /// be unsafe. The caller retries later.
    #[instrument(skip(self, request), fields(request = %request))]
    pub async fn request(
        &self,
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
    ) -> Result<bool, BankError> {
        debug!("Sending request");
        self.call(|respond_to| BankRequest::Request {
            customer,
            index,
            request,
            respond_to,
        })
        .await
    }

    /// Return the units previously granted for one transaction.
    #[instrument(skip(self, request), fields(request = %request))]
    pub async fn release(
        &self,
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
    ) -> Result<(), BankError> {
        debug!("Sending release");
        self.call(|respond_to| BankRequest::Release {
            customer,
            index,
            request,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn maximum_claim(&self, customer: CustomerId) -> Result<ResourceVector, BankError> {
        self.call(|respond_to| BankRequest::MaximumClaim {
            customer,
            respond_to,
        })
        .await
    }

    pub async fn available(&self) -> Result<ResourceVector, BankError> {
        self.call(|respond_to| BankRequest::Available { respond_to })
            .await
    }

    pub async fn snapshot(&self) -> Result<BankSnapshot, BankError> {
        self.call(|respond_to| BankRequest::Snapshot { respond_to })
            .await
    }

    async fn call<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<Result<T, BankError>>) -> BankRequest,
    ) -> Result<T, BankError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(message(respond_to))
            .await
            .map_err(|_| BankError::ActorClosed)?;
        response.await.map_err(|_| BankError::ActorDropped)?
    }
}
