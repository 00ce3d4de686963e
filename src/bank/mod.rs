//! # Bank
//!
//! The arbiter of the simulation: owns the global allocation state and grants a
//! request only if the system stays in a *safe state* afterwards (the Banker's
//! Algorithm).
//!
//! ## Structure
//!
//! - [`ledger`] - [`Ledger`] state and the safety scan, plain synchronous code
//! - [`actor`] - [`BankActor`], the task that owns the ledger and serializes access
//! - [`client`] - [`BankClient`], the cloneable async handle customers hold
//! - [`message`] - [`BankRequest`] messages between client and actor
//! - [`arbiter`] - [`Arbiter`] trait customers are generic over
//! - [`pool`] - [`ResourcePools`], the physical per-type unit gates
//! - [`error`] - [`BankError`]
//!
//! ## Usage
//!
//! ```rust
//! use banker_sim::bank::{self, Ledger};
//! use banker_sim::model::{CustomerId, ResourceVector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Ledger::new(
//!         ResourceVector::from([10, 5, 7]),
//!         vec![ResourceVector::from([7, 5, 3]), ResourceVector::from([3, 2, 2])],
//!     )?;
//!     let (actor, client) = bank::new(ledger);
//!     tokio::spawn(actor.run());
//!
//!     let granted = client.request(CustomerId(1), 0, ResourceVector::from([2, 0, 0])).await?;
//!     assert!(granted);
//!     client.release(CustomerId(1), 0, ResourceVector::from([2, 0, 0])).await?;
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod arbiter;
pub mod client;
pub mod error;
pub mod ledger;
pub mod message;
pub mod pool;

pub use actor::BankActor;
pub use arbiter::Arbiter;
pub use client::BankClient;
pub use error::*;
pub use ledger::{BankSnapshot, Ledger};
pub use message::{BankRequest, Response};
pub use pool::{ResourcePool, ResourcePools};

/// Creates a new bank actor for `ledger` and its client.
pub fn new(ledger: Ledger) -> (BankActor, BankClient) {
    BankActor::new(ledger, 32)
}
