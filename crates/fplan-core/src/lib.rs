//! # fplan Core
//!
//! 核心資料模型、週標籤與倉儲介面定義

pub mod assignment;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod demand;
pub mod inventory;
pub mod production;
pub mod repository;
pub mod shipment;
pub mod week;

// Re-export 主要類型
pub use assignment::{Assignment, AssignmentTarget};
pub use calendar::{Downtime, DowntimeKind, WorkCalendar};
pub use catalog::{
    Client, Machine, MachineKind, Mold, MoldStatus, Piece, StockStatus, Supplier,
};
pub use config::PlanningConfig;
pub use demand::{Demand, DemandKey, MergeSummary, Priority};
pub use inventory::{StockRecord, StockStage};
pub use production::{
    Declaration, DeclarationKey, InspectionOutcome, OutcomeQuantities, ProductionRecord, Shift,
};
pub use repository::{
    AssignmentRepository, CatalogRepository, DemandRepository, InventoryRepository,
    ProductionRepository,
};
pub use shipment::{Shipment, ShipmentKind, ShipmentLine, TransportInfo};
pub use week::WeekLabel;

/// 計劃核心錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("找不到{entity}: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("無效的週標籤: {0}（格式須為 YYYYWW）")]
    InvalidWeek(String),

    #[error("資料驗證失敗: {0}")]
    Validation(String),

    #[error("缺少必要欄位: {0}")]
    MissingField(&'static str),

    #[error("庫存不足：物料 {piece_id} 階段 {stage} 需要 {requested}，可用 {available}")]
    InsufficientStock {
        piece_id: String,
        stage: StockStage,
        requested: i64,
        available: i64,
    },

    #[error("檢驗數量超過隔離數量：生產記錄 {production_id} 申報 {requested}，剩餘 {remaining}")]
    QuarantineExceeded {
        production_id: uuid::Uuid,
        requested: i64,
        remaining: i64,
    },

    #[error("模具 {mold_id} 不相容於機台 {machine_id}")]
    IncompatibleMold { mold_id: String, machine_id: String },

    #[error("匯入錯誤: {0}")]
    Import(String),

    #[error("儲存失敗: {0}")]
    Store(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

impl PlanError {
    /// 建構器：找不到實體
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PlanError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// 是否屬於寫入前即被攔下的驗證錯誤
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidWeek(_)
                | PlanError::Validation(_)
                | PlanError::MissingField(_)
                | PlanError::InsufficientStock { .. }
                | PlanError::QuarantineExceeded { .. }
                | PlanError::IncompatibleMold { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
