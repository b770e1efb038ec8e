//! 主檔模型：機台、模具、物料、客戶、供應商

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inventory::StockStage;

/// 機台類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineKind {
    /// 射出成型
    Injection,
    /// 機械加工
    Machining,
    /// 噴砂
    ShotBlasting,
    /// 組裝
    Assembly,
}

/// 機台
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// 機台ID
    pub id: String,

    /// 機台名稱
    pub name: String,

    /// 機台類型
    pub kind: MachineKind,

    /// 噸位（僅射出機有意義）
    pub tonnage: Option<u32>,

    /// 每週班次
    pub shifts_per_week: u32,

    /// 每班工時
    pub hours_per_shift: Decimal,

    /// 目標 OEE（0..=1）
    pub target_oee: Decimal,

    /// 歷史 OEE
    pub historical_oee: Option<Decimal>,
}

impl Machine {
    /// 創建新的機台（預設目標 OEE 0.85）
    pub fn new(
        id: String,
        kind: MachineKind,
        shifts_per_week: u32,
        hours_per_shift: Decimal,
    ) -> Self {
        Self {
            name: id.clone(),
            id,
            kind,
            tonnage: None,
            shifts_per_week,
            hours_per_shift,
            target_oee: Decimal::new(85, 2),
            historical_oee: None,
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// 建構器模式：設置噸位
    pub fn with_tonnage(mut self, tonnage: u32) -> Self {
        self.tonnage = Some(tonnage);
        self
    }

    /// 建構器模式：設置目標 OEE
    pub fn with_target_oee(mut self, oee: Decimal) -> Self {
        self.target_oee = oee;
        self
    }

    /// 建構器模式：設置歷史 OEE
    pub fn with_historical_oee(mut self, oee: Decimal) -> Self {
        self.historical_oee = Some(oee);
        self
    }

    /// 名目週工時 = 班次 × 每班工時
    pub fn weekly_hours(&self) -> Decimal {
        Decimal::from(self.shifts_per_week) * self.hours_per_shift
    }

    /// 估算用 OEE：有歷史值時優先使用歷史值
    pub fn effective_oee(&self) -> Decimal {
        self.historical_oee.unwrap_or(self.target_oee)
    }

    pub fn is_injection(&self) -> bool {
        self.kind == MachineKind::Injection
    }
}

/// 模具狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoldStatus {
    Ok,
    Maintenance,
}

/// 模具
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mold {
    /// 模具ID
    pub id: String,

    /// 對應物料（一模可出多種物料）
    pub piece_ids: Vec<String>,

    /// 穴數
    pub cavities: u32,

    /// 基準週期時間（秒）
    pub cycle_time_secs: Decimal,

    /// 相容機台
    pub compatible_machines: Vec<String>,

    /// 狀態
    pub status: MoldStatus,
}

impl Mold {
    /// 創建新的模具
    pub fn new(id: String, cavities: u32, cycle_time_secs: Decimal) -> Self {
        Self {
            id,
            piece_ids: Vec::new(),
            cavities,
            cycle_time_secs,
            compatible_machines: Vec::new(),
            status: MoldStatus::Ok,
        }
    }

    /// 建構器模式：設置對應物料
    pub fn with_pieces(mut self, piece_ids: Vec<String>) -> Self {
        self.piece_ids = piece_ids;
        self
    }

    /// 建構器模式：設置相容機台
    pub fn with_compatible_machines(mut self, machine_ids: Vec<String>) -> Self {
        self.compatible_machines = machine_ids;
        self
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: MoldStatus) -> Self {
        self.status = status;
        self
    }

    /// 檢查是否可在指定機台上生產
    pub fn is_compatible_with(&self, machine_id: &str) -> bool {
        self.compatible_machines.iter().any(|m| m == machine_id)
    }

    pub fn produces(&self, piece_id: &str) -> bool {
        self.piece_ids.iter().any(|p| p == piece_id)
    }

    pub fn is_available(&self) -> bool {
        self.status == MoldStatus::Ok
    }

    /// 每小時產出 = 3600 / 週期 × 穴數 × OEE（不取整）
    ///
    /// 週期非正或計算溢位時為零。
    pub fn hourly_rate(&self, oee: Decimal) -> Decimal {
        if self.cycle_time_secs <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        Decimal::from(3600)
            .checked_div(self.cycle_time_secs)
            .and_then(|per_cavity| per_cavity.checked_mul(Decimal::from(self.cavities)))
            .and_then(|rate| rate.checked_mul(oee))
            .unwrap_or(Decimal::ZERO)
    }

    /// 估算指定工時的產出件數（乘積無條件捨去，無法表示時為零）
    pub fn estimate_units(&self, hours: Decimal, oee: Decimal) -> i64 {
        self.hourly_rate(oee)
            .checked_mul(hours)
            .and_then(|units| units.floor().to_i64())
            .unwrap_or(0)
            .max(0)
    }
}

/// 庫存狀態（依最小/最大庫存判斷）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    /// 低於最小庫存
    Critical,
    Ok,
    /// 高於最大庫存
    High,
}

/// 物料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    /// 物料ID
    pub id: String,

    /// 物料名稱
    pub name: String,

    /// 所屬客戶
    pub client_id: String,

    /// 最小庫存
    pub stock_min: i64,

    /// 最大庫存
    pub stock_max: i64,

    /// 需要噴砂
    pub requires_shot_blasting: bool,

    /// 需要機械加工
    pub requires_machining: bool,

    /// 需要組裝
    pub requires_assembly: bool,
}

impl Piece {
    /// 創建新的物料（無子製程）
    pub fn new(id: String, client_id: String) -> Self {
        Self {
            name: id.clone(),
            id,
            client_id,
            stock_min: 0,
            stock_max: i64::MAX,
            requires_shot_blasting: false,
            requires_machining: false,
            requires_assembly: false,
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// 建構器模式：設置庫存上下限
    pub fn with_stock_limits(mut self, min: i64, max: i64) -> Self {
        self.stock_min = min;
        self.stock_max = max;
        self
    }

    /// 建構器模式：設置子製程旗標
    pub fn with_subprocesses(mut self, shot_blasting: bool, machining: bool, assembly: bool) -> Self {
        self.requires_shot_blasting = shot_blasting;
        self.requires_machining = machining;
        self.requires_assembly = assembly;
        self
    }

    /// 是否需要任一子製程
    pub fn needs_subprocess(&self) -> bool {
        self.requires_shot_blasting || self.requires_machining || self.requires_assembly
    }

    /// 射出良品進入的庫存階段
    pub fn entry_stage(&self) -> StockStage {
        if self.needs_subprocess() {
            StockStage::InjectedUnpressed
        } else {
            StockStage::Ready
        }
    }

    /// 依庫存量判斷狀態
    pub fn stock_status(&self, quantity: i64) -> StockStatus {
        if quantity < self.stock_min {
            StockStatus::Critical
        } else if quantity > self.stock_max {
            StockStatus::High
        } else {
            StockStatus::Ok
        }
    }
}

/// 客戶
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
}

/// 供應商（外包加工、運輸）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
}

impl Supplier {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            address: None,
        }
    }

    /// 建構器模式：設置地址
    pub fn with_address(mut self, address: String) -> Self {
        self.address = Some(address);
        self
    }
}
