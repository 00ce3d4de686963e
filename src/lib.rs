//! # Banker Simulation
//!
//! > **Deadlock avoidance with the Banker's Algorithm, one task per process.**
//!
//! A bank guards a fixed vector of resource units. Customers declare a maximum
//! claim up front, then repeatedly ask for part of it, hold it for a while and
//! give it back. The bank grants a request only if the state it leads to is
//! *safe*: there is still some order in which every customer could be handed
//! its full remaining need and finish.
//!
//! ## 🏗️ Design
//!
//! ### The bank is an actor
//! The [`BankActor`](bank::BankActor) owns the [`Ledger`](bank::Ledger) and
//! processes one message at a time. That sequential loop is the critical
//! section: safety check, tentative allocation and rollback never interleave
//! with another customer's request.
//!
//! ### Logical before physical
//! A grant is booked in the ledger first and only then taken from the
//! [`ResourcePools`](bank::ResourcePools). A release goes the other way. The
//! pools therefore always hold at least what the ledger calls available, and
//! taking a granted request never has to wait.
//!
//! ### Customers never block the bank
//! A denied customer simply tries again on its next turn. Denials leave the
//! ledger exactly as it was.
//!
//! ## 🗺️ Module Tour
//!
//! - [`model`] - [`ResourceVector`](model::ResourceVector),
//!   [`CustomerId`](model::CustomerId) and [`Transaction`](model::Transaction)
//! - [`bank`] - the ledger, the bank actor and its client, the pools
//! - [`customer`] - the customer task and the handle used to feed it
//! - [`config`] - scenario configuration, from a builder or a JSON file
//! - [`lifecycle`] - [`Simulation`](lifecycle::Simulation), which wires it all
//!   together, and tracing setup
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # 3 resource types, 5 customers, random totals and claims
//! cargo run -- 3 5
//!
//! # Fast, reproducible run
//! cargo run -- 3 5 --seed 42 --min-delay-ms 0 --max-delay-ms 0
//! ```
//!
//! ## 🧪 Testing
//!
//! The ledger is plain synchronous code and is tested directly. Customers are
//! generic over [`Arbiter`](bank::Arbiter), so their tests swap the bank for a
//! scripted one.

pub mod bank;
pub mod config;
pub mod customer;
pub mod lifecycle;
pub mod model;
