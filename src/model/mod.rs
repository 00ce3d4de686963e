//! Pure data structures shared by the bank and its customers.

pub mod customer;
pub mod transaction;
pub mod vector;

pub use customer::*;
pub use transaction::*;
pub use vector::*;
