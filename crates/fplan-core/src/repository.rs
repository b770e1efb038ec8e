//! 倉儲介面
//!
//! 評估器與服務只透過這些 trait 存取資料；實作可為記憶體或遠端文件資料庫。
//! 每個寫入方法對應一次單一文件的原子寫入，不提供跨文件交易。

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    Assignment, Declaration, DeclarationKey, Demand, DemandKey, InspectionOutcome, Machine,
    MergeSummary, Mold, Piece, ProductionRecord, Result, StockRecord, StockStage, WeekLabel,
};

/// 主檔倉儲（唯讀為主）
pub trait CatalogRepository: Send + Sync {
    fn machine(&self, id: &str) -> Result<Machine>;
    fn mold(&self, id: &str) -> Result<Mold>;
    fn piece(&self, id: &str) -> Result<Piece>;

    fn machines(&self) -> Vec<Machine>;
    fn molds(&self) -> Vec<Mold>;
    fn pieces(&self) -> Vec<Piece>;

    /// 可生產指定物料的模具
    fn molds_for_piece(&self, piece_id: &str) -> Vec<Mold> {
        self.molds()
            .into_iter()
            .filter(|m| m.produces(piece_id))
            .collect()
    }
}

/// 週排程指派帳本
///
/// 帳本本身不做任何驗證；相容性與期間重疊由呼叫端先行檢查。
pub trait AssignmentRepository: Send + Sync {
    /// 某機台某週的指派
    fn list_assignments(&self, machine_id: &str, week: WeekLabel) -> Result<Vec<Assignment>>;

    /// 某機台的全部指派（依起日排序）
    fn list_machine(&self, machine_id: &str) -> Result<Vec<Assignment>>;

    /// `from..=to` 週範圍內所有機台的指派
    fn list_range(&self, from: WeekLabel, to: WeekLabel) -> Result<Vec<Assignment>>;

    /// 有ID則原地取代，無ID則附加並配發新ID
    fn upsert_assignment(&self, record: Assignment) -> Result<Uuid>;

    fn remove_assignment(&self, id: Uuid) -> Result<Assignment>;
}

/// 庫存帳本
pub trait InventoryRepository: Send + Sync {
    /// 物料建立時歸零（唯一的絕對寫入）
    fn init_piece(&self, piece_id: &str) -> Result<StockRecord>;

    /// 同一物料的多個增量於單次寫入中套用
    fn apply_deltas(&self, piece_id: &str, deltas: &[(StockStage, i64)]) -> Result<StockRecord>;

    fn get(&self, piece_id: &str) -> Result<StockRecord>;

    fn list(&self) -> Result<Vec<StockRecord>>;

    fn apply_delta(&self, piece_id: &str, stage: StockStage, delta: i64) -> Result<StockRecord> {
        self.apply_deltas(piece_id, &[(stage, delta)])
    }

    fn available(&self, piece_id: &str, stage: StockStage) -> Result<i64> {
        Ok(self.get(piece_id)?.get(stage))
    }
}

/// 生產申報與品檢
pub trait ProductionRepository: Send + Sync {
    /// 同鍵首次申報建立記錄，之後累加至既有記錄
    fn declare(&self, declaration: Declaration) -> Result<ProductionRecord>;

    fn get(&self, id: Uuid) -> Result<ProductionRecord>;

    fn find(&self, key: &DeclarationKey) -> Result<Option<ProductionRecord>>;

    /// 品檢（唯一有完整防護的變更）
    fn inspect(&self, id: Uuid, accepted: i64, scrap: i64) -> Result<InspectionOutcome>;

    /// 日期介於 `from..=to` 的記錄
    fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ProductionRecord>>;

    /// 尚有隔離數量的記錄
    fn pending_inspection(&self) -> Result<Vec<ProductionRecord>>;
}

/// 需求簿
pub trait DemandRepository: Send + Sync {
    /// 依鍵合併：凍結者略過，草稿以最後寫入為準
    fn merge(&self, incoming: Vec<Demand>) -> Result<MergeSummary>;

    fn get(&self, key: &DemandKey) -> Result<Option<Demand>>;

    /// 週期介於 `from..=to` 的需求
    fn list_range(&self, from: WeekLabel, to: WeekLabel) -> Result<Vec<Demand>>;

    fn set_frozen(&self, key: &DemandKey, frozen: bool) -> Result<Demand>;
}
