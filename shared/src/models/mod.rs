//! Domain models for the roastery inventory ledger

mod bag;
mod batch;
mod catalog;
mod transfer;
mod warehouse;

pub use bag::*;
pub use batch::*;
pub use catalog::*;
pub use transfer::*;
pub use warehouse::*;
