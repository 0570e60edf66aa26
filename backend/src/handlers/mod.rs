//! HTTP handlers for the roastery inventory API

pub mod catalog;
pub mod dispatch;
pub mod health;
pub mod intake;
pub mod reporting;
pub mod roasting;
pub mod transfer;

pub use catalog::*;
pub use dispatch::*;
pub use health::*;
pub use intake::*;
pub use reporting::*;
pub use roasting::*;
pub use transfer::*;
