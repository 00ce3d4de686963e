//! # Bank Messages
//!
//! The message types exchanged between [`BankClient`](super::BankClient) and
//! [`BankActor`](super::BankActor).

use super::{BankError, BankSnapshot};
use crate::model::{CustomerId, ResourceVector};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the bank.
pub type Response<T> = oneshot::Sender<Result<T, BankError>>;

/// Internal message type sent to the bank actor.
///
/// `Request` and `Release` are the only messages that mutate the ledger. The
/// rest are read-only queries used while wiring customers and for reporting.
#[derive(Debug)]
pub enum BankRequest {
    Request {
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
        respond_to: Response<bool>,
    },
    Release {
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
        respond_to: Response<()>,
    },
    MaximumClaim {
        customer: CustomerId,
        respond_to: Response<ResourceVector>,
    },
    Available {
        respond_to: Response<ResourceVector>,
    },
    Snapshot {
        respond_to: Response<BankSnapshot>,
    },
}
