//! Shared types and ledger rules for the roastery inventory
//!
//! Everything here is pure: models, the bean and roast catalog, and the
//! algorithms (bag codes, FIFO deduction, line encoding, allocation, stock
//! summaries) that the backend and the WASM helpers both run.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
