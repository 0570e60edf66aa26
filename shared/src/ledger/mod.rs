//! Pure ledger algorithms: bag codes, FIFO lot consumption, batch line
//! encoding, output allocation, and stock summaries.
//!
//! Callers fetch a snapshot, run these functions over it, and hand the
//! resulting mutations to the store in one change set.

pub mod allocation;
pub mod codes;
pub mod fifo;
pub mod lines;
pub mod summary;

pub use allocation::*;
pub use codes::*;
pub use fifo::*;
pub use lines::*;
pub use summary::*;
