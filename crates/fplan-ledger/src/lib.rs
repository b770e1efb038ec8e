//! # fplan Ledger
//!
//! 記憶體帳本：主檔、週排程、庫存、生產申報、需求簿、出貨流水號與變更追蹤

pub mod assignments;
pub mod catalog;
pub mod csv_import;
pub mod demand;
pub mod dirty_tracking;
pub mod inventory;
pub mod production;
pub mod shipment;
pub mod validator;

// Re-export 主要類型
pub use assignments::AssignmentLedger;
pub use catalog::InMemoryCatalog;
pub use csv_import::{DemandCsvImporter, ImportReport, RowError};
pub use demand::DemandBook;
pub use dirty_tracking::DirtyTracker;
pub use inventory::InventoryLedger;
pub use production::ProductionLog;
pub use shipment::ShipmentCounter;
pub use validator::{AssignmentValidator, ValidationIssue};
