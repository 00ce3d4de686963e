//! # Simulation Lifecycle
//!
//! Starting, loading and joining a whole simulation.
//!
//! [`Simulation::start`] is the only place that knows how the pieces fit:
//!
//! 1. **Bank** - build a [`Ledger`](crate::bank::Ledger) from the scenario and
//!    spawn its [`BankActor`](crate::bank::BankActor)
//! 2. **Pools** - one semaphore per resource type, shared by all customers
//! 3. **Customers** - one task per maximum-claim row, each holding a clone of
//!    the bank client
//! 4. **Loading** - hand every customer its requests, then close it
//!
//! [`Simulation::wait`] is the join barrier: it awaits every customer task,
//! drops the last bank client so the bank's loop ends, and reports the final
//! state.
//!
//! The [`setup_tracing`] function initializes structured logging for the
//! binary.

pub mod simulation;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use simulation::*;
