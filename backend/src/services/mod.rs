//! Business logic services for the roastery inventory

pub mod catalog;
pub mod dispatch;
pub mod intake;
pub mod reporting;
pub mod roasting;
pub mod transfer;

pub use catalog::WarehouseService;
pub use dispatch::DispatchService;
pub use intake::IntakeService;
pub use reporting::ReportingService;
pub use roasting::RoastingService;
pub use transfer::TransferService;
