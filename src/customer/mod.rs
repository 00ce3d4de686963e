//! # Customer Actor
//!
//! Customers are the concurrent processes of the simulation. Each one owns a
//! list of transactions, one request vector each, and works through them in
//! its own task:
//!
//! - a `waiting` transaction asks the bank; once granted it takes its units
//!   from the pools and becomes `pending`
//! - a `pending` transaction gives its units back and becomes `finished`
//!
//! ## Structure
//!
//! - [`actor`] - [`Customer`], the driving loop
//! - [`handle`] - [`CustomerHandle`] and [`CustomerStatus`] for the outside world
//! - [`picker`] - [`Picker`], which unfinished transaction to work on next
//! - [`generator`] - [`random_requests`], request vectors that respect a maximum claim
//! - [`error`] - [`CustomerError`]
//!
//! ## Usage
//!
//! ```rust
//! use banker_sim::bank::{self, Ledger, ResourcePools};
//! use banker_sim::customer::{Customer, CustomerOptions};
//! use banker_sim::config::Pacing;
//! use banker_sim::model::{CustomerId, ResourceVector};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let total = ResourceVector::from([4]);
//!     let ledger = Ledger::new(total.clone(), vec![ResourceVector::from([4])])?;
//!     let (actor, client) = bank::new(ledger);
//!     tokio::spawn(actor.run());
//!
//!     let pools = Arc::new(ResourcePools::new(&total));
//!     let options = CustomerOptions { pacing: Pacing::none(), ..Default::default() };
//!     let (customer, mut handle) = Customer::new(CustomerId(0), client, pools, options).await?;
//!
//!     handle.add_request(ResourceVector::from([2])).await?;
//!     handle.close();
//!
//!     let report = customer.run().await?;
//!     assert_eq!(report.releases, 1);
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod error;
pub mod generator;
pub mod handle;
pub mod picker;

pub use actor::{Customer, CustomerOptions, CustomerReport};
pub use error::*;
pub use generator::random_requests;
pub use handle::{CustomerHandle, CustomerStatus};
pub use picker::Picker;
