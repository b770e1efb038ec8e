//! # fplan Advisor
//!
//! 外部排程建議服務的邊界：請求組裝、回應解析與呼叫介面

pub mod advisor;
pub mod request;
pub mod response;

// Re-export 主要類型
pub use advisor::{PlanAdvisor, PlanningAssistant, StaticAdvisor};
pub use request::{
    CalendarSummary, DemandLine, MachineCapacity, PlanRequest, RefineRequest, RunParameters,
    ScrapRate, StockLine,
};
pub use response::{ParsedPlan, ResponseParser, SuggestedAssignment};

/// 建議服務錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("JSON 序列化失敗: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("建議服務呼叫失敗: {0}")]
    Remote(String),

    #[error("建議服務回應為空")]
    EmptyResponse,

    #[error("回應中找不到排程內容: {0}")]
    NoPlanFound(String),

    #[error("建議指派無效: {0}")]
    InvalidSuggestion(String),

    #[error(transparent)]
    Plan(#[from] fplan_core::PlanError),
}

pub type AdvisorResult<T> = std::result::Result<T, AdvisorError>;
