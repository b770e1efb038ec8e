//! 庫存模型（每物料多階段計數）

use serde::{Deserialize, Serialize};
use std::fmt;

/// 庫存階段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StockStage {
    /// 射出後待後製程
    InjectedUnpressed,
    /// 外包加工中
    InExternalMachining,
    /// 已加工
    Machined,
    /// 已噴砂
    ShotBlasted,
    /// 可出貨
    Ready,
    /// 已組裝
    Assembled,
    /// 待品檢（隔離）
    PendingQuality,
}

impl StockStage {
    /// 全部階段（固定順序）
    pub const ALL: [StockStage; 7] = [
        StockStage::InjectedUnpressed,
        StockStage::InExternalMachining,
        StockStage::Machined,
        StockStage::ShotBlasted,
        StockStage::Ready,
        StockStage::Assembled,
        StockStage::PendingQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStage::InjectedUnpressed => "injected_unpressed",
            StockStage::InExternalMachining => "in_external_machining",
            StockStage::Machined => "machined",
            StockStage::ShotBlasted => "shot_blasted",
            StockStage::Ready => "ready",
            StockStage::Assembled => "assembled",
            StockStage::PendingQuality => "pending_quality",
        }
    }
}

impl fmt::Display for StockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一物料的庫存文件
///
/// 計數器只接受相對增量；唯一的絕對寫入是建立物料時歸零。
/// 本模型不在零處截斷，呼叫端須先檢查可用量。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// 物料ID
    pub piece_id: String,

    pub injected_unpressed: i64,
    pub in_external_machining: i64,
    pub machined: i64,
    pub shot_blasted: i64,
    pub ready: i64,
    pub assembled: i64,
    pub pending_quality: i64,
}

impl StockRecord {
    /// 創建全零的庫存文件
    pub fn zeroed(piece_id: String) -> Self {
        Self {
            piece_id,
            injected_unpressed: 0,
            in_external_machining: 0,
            machined: 0,
            shot_blasted: 0,
            ready: 0,
            assembled: 0,
            pending_quality: 0,
        }
    }

    /// 讀取某階段數量
    pub fn get(&self, stage: StockStage) -> i64 {
        match stage {
            StockStage::InjectedUnpressed => self.injected_unpressed,
            StockStage::InExternalMachining => self.in_external_machining,
            StockStage::Machined => self.machined,
            StockStage::ShotBlasted => self.shot_blasted,
            StockStage::Ready => self.ready,
            StockStage::Assembled => self.assembled,
            StockStage::PendingQuality => self.pending_quality,
        }
    }

    fn counter_mut(&mut self, stage: StockStage) -> &mut i64 {
        match stage {
            StockStage::InjectedUnpressed => &mut self.injected_unpressed,
            StockStage::InExternalMachining => &mut self.in_external_machining,
            StockStage::Machined => &mut self.machined,
            StockStage::ShotBlasted => &mut self.shot_blasted,
            StockStage::Ready => &mut self.ready,
            StockStage::Assembled => &mut self.assembled,
            StockStage::PendingQuality => &mut self.pending_quality,
        }
    }

    /// 套用增量（不截斷）
    pub fn apply(&mut self, stage: StockStage, delta: i64) {
        *self.counter_mut(stage) += delta;
    }

    /// 成品庫存（可出貨 + 已組裝），供計劃評估使用
    pub fn finished(&self) -> i64 {
        self.ready + self.assembled
    }

    /// 全部階段合計
    pub fn total(&self) -> i64 {
        StockStage::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// 檢查是否有任一階段為負（呼叫端未預先檢查所致）
    pub fn has_negative(&self) -> bool {
        StockStage::ALL.iter().any(|s| self.get(*s) < 0)
    }
}
