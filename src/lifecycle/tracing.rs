//! # Observability & Tracing
//!
//! Structured logging for the whole simulation, built on the `tracing` crate.
//!
//! ## What Gets Traced
//!
//! - **Bank**: every grant, denial and release with the customer, transaction
//!   index, request vector and the resulting `available` vector; protocol
//!   violations at `error`
//! - **Customers**: start, each request and release attempt, completion
//! - **Pools**: a warning whenever an acquire would have had to wait
//!
//! ## Usage
//!
//! ```bash
//! # Grants, denials and releases
//! RUST_LOG=info cargo run -- 3 5
//!
//! # Safe sequences, pool movements and client calls too
//! RUST_LOG=debug cargo run -- 3 5
//! ```
//!
//! With `RUST_LOG=info` a grant looks like:
//!
//! ```text
//! INFO Granted customer=customer_2 index=1 request=[1, 0, 3] available=[4, 2, 1]
//! ```

use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` when
/// `verbose` is true.
pub fn setup_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
