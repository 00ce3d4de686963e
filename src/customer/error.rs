//! Error types for the Customer actor.

use crate::bank::BankError;
use crate::model::{CustomerId, ResourceVector};
use thiserror::Error;

/// Errors that stop a customer.
///
/// None of these are recoverable mid-simulation: each one means either the
/// bank went away or somebody broke the request/release protocol.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CustomerError {
    /// The bank refused a call or went away. If this happens while
    /// releasing, the units are already back in the pools but the bank still
    /// counts them as allocated.
    #[error(transparent)]
    Bank(#[from] BankError),

    /// A loaded request would push the customer's open transactions past its
    /// declared maximum.
    #[error("{customer} open requests {open} plus {request} exceed maximum {maximum}")]
    ClaimExceeded {
        customer: CustomerId,
        open: ResourceVector,
        request: ResourceVector,
        maximum: ResourceVector,
    },

    #[error("Request has {found} entries, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{0} is closed to new requests")]
    Closed(CustomerId),

    #[error("{0} stopped before finishing")]
    Stopped(CustomerId),

    #[error("{customer} picked finished transaction {index}")]
    InvalidTransition { customer: CustomerId, index: usize },
}
