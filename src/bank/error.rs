//! Error types for the bank actor.

use crate::model::{CustomerId, ResourceVector};
use thiserror::Error;

/// Errors that can occur while talking to the bank or its resource pools.
///
/// A denied request is not an error: [`request`](super::BankClient::request)
/// returns `Ok(false)` for that. Everything here except the channel variants is
/// a protocol violation by the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BankError {
    #[error("Bank actor closed")]
    ActorClosed,

    #[error("Bank actor dropped response channel")]
    ActorDropped,

    #[error("Unknown customer: {0}")]
    UnknownCustomer(CustomerId),

    #[error("Vector has {found} entries, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The request asks for more than the customer's remaining need.
    #[error("{customer} transaction {index} requested {request}, remaining need is {need}")]
    ExceedsNeed {
        customer: CustomerId,
        index: usize,
        request: ResourceVector,
        need: ResourceVector,
    },

    #[error("{customer} transaction {index} already holds a grant")]
    DuplicateGrant { customer: CustomerId, index: usize },

    /// The released vector does not match what was granted for the transaction.
    #[error("{customer} transaction {index} released {found}, granted {expected:?}")]
    ReleaseMismatch {
        customer: CustomerId,
        index: usize,
        expected: Option<ResourceVector>,
        found: ResourceVector,
    },

    #[error("Resource pool {0} closed")]
    PoolClosed(usize),
}

impl BankError {
    /// True for errors caused by a caller breaking the request/release protocol.
    pub fn is_protocol_violation(&self) -> bool {
        !matches!(
            self,
            BankError::ActorClosed | BankError::ActorDropped | BankError::PoolClosed(_)
        )
    }
}
