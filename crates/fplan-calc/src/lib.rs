//! # fplan Calculation Engine
//!
//! 計劃評估引擎：需求覆蓋、產能負荷、缺口工時建議與預估對帳

pub mod bucketing;
pub mod capacity;
pub mod evaluator;
pub mod netting;
pub mod reconcile;
pub mod sizing;

use fplan_core::{StockStatus, WeekLabel};
use serde::{Deserialize, Serialize};

// Re-export 主要類型
pub use capacity::{CapacityCalculator, MachineLoad};
pub use evaluator::PlanEvaluator;
pub use netting::{CoverageCalculator, CoverageRow};
pub use reconcile::{EstimateReconciliation, ReconcileCalculator};
pub use sizing::{HoursSuggestion, SizingCalculator};

/// 計劃評估結果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanEvaluation {
    /// 評估起始週
    pub from: Option<WeekLabel>,

    /// 評估結束週
    pub to: Option<WeekLabel>,

    /// 各物料需求覆蓋（依物料ID排序）
    pub coverage: Vec<PieceCoverage>,

    /// 各機台週負荷
    pub loads: Vec<MachineLoad>,

    /// 缺口工時建議
    pub suggestions: Vec<HoursSuggestion>,

    /// 警告信息
    pub warnings: Vec<PlanWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl PlanEvaluation {
    /// 創建空的評估結果
    pub fn empty() -> Self {
        Self::default()
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: PlanWarning) {
        self.warnings.push(warning);
    }

    pub fn piece(&self, piece_id: &str) -> Option<&PieceCoverage> {
        self.coverage.iter().find(|c| c.piece_id == piece_id)
    }

    pub fn load(&self, machine_id: &str, week: WeekLabel) -> Option<&MachineLoad> {
        self.loads
            .iter()
            .find(|l| l.machine_id == machine_id && l.week == week)
    }

    /// 全部物料於評估期間的未覆蓋總量
    pub fn total_uncovered(&self) -> i64 {
        self.coverage.iter().map(PieceCoverage::total_uncovered).sum()
    }

    pub fn overloaded(&self) -> impl Iterator<Item = &MachineLoad> {
        self.loads.iter().filter(|l| l.overloaded)
    }
}

/// 單物料覆蓋結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceCoverage {
    pub piece_id: String,

    /// 期初可用成品庫存
    pub initial_stock: i64,

    /// 依最小/最大庫存判斷的狀態（None 表示物料不在主檔）
    pub stock_status: Option<StockStatus>,

    /// 逐週覆蓋
    pub rows: Vec<CoverageRow>,
}

impl PieceCoverage {
    pub fn total_demand(&self) -> i64 {
        self.rows.iter().map(|r| r.demand).sum()
    }

    pub fn total_uncovered(&self) -> i64 {
        self.rows.iter().map(|r| r.uncovered).sum()
    }

    pub fn row(&self, week: WeekLabel) -> Option<&CoverageRow> {
        self.rows.iter().find(|r| r.week == week)
    }
}

/// 評估警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWarning {
    /// 物料、機台或模具ID
    pub subject_id: String,
    pub kind: WarningKind,
    pub message: String,
    pub severity: WarningSeverity,
}

impl PlanWarning {
    pub fn new(
        subject_id: String,
        kind: WarningKind,
        message: String,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            subject_id,
            kind,
            message,
            severity,
        }
    }

    pub fn info(subject_id: String, kind: WarningKind, message: String) -> Self {
        Self::new(subject_id, kind, message, WarningSeverity::Info)
    }

    pub fn warning(subject_id: String, kind: WarningKind, message: String) -> Self {
        Self::new(subject_id, kind, message, WarningSeverity::Warning)
    }

    pub fn error(subject_id: String, kind: WarningKind, message: String) -> Self {
        Self::new(subject_id, kind, message, WarningSeverity::Error)
    }
}

/// 警告類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// 機台週超載
    Overload,
    /// 指派的模具不相容於機台
    IncompatibleMold,
    /// 指派參照不存在的機台/模具/物料
    UnknownReference,
    /// 需求物料不在主檔
    PieceWithoutConfig,
    /// 有計劃產出但無需求
    ProductionWithoutDemand,
    /// 帳上庫存為負
    NegativeStock,
    /// 有缺口但無可用模具
    NoCapableMold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
