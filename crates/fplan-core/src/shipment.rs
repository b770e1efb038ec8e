//! 出貨/外包單據模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::inventory::StockStage;
use crate::PlanError;

/// 單據類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentKind {
    /// 客戶出貨（扣可出貨庫存）
    CustomerDelivery,
    /// 送外包加工
    ExternalMachining,
    /// 外包加工回廠
    ExternalMachiningReturn,
}

impl ShipmentKind {
    /// 扣減的庫存階段
    pub fn source_stage(&self) -> StockStage {
        match self {
            ShipmentKind::CustomerDelivery => StockStage::Ready,
            ShipmentKind::ExternalMachining => StockStage::InjectedUnpressed,
            ShipmentKind::ExternalMachiningReturn => StockStage::InExternalMachining,
        }
    }

    /// 轉入的庫存階段（出貨給客戶則離開庫存）
    pub fn target_stage(&self) -> Option<StockStage> {
        match self {
            ShipmentKind::CustomerDelivery => None,
            ShipmentKind::ExternalMachining => Some(StockStage::InExternalMachining),
            ShipmentKind::ExternalMachiningReturn => Some(StockStage::Machined),
        }
    }
}

/// 運輸資訊
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportInfo {
    pub carrier: String,
    pub vehicle_plate: Option<String>,
    pub driver: Option<String>,
}

/// 單據明細
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub piece_id: String,
    pub quantity: i64,
}

/// 出貨單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// 流水號（開立後才有）
    pub number: Option<u64>,

    pub kind: ShipmentKind,

    /// 供應商或客戶
    pub counterparty_id: String,

    pub date: NaiveDate,

    pub transport: TransportInfo,

    pub lines: Vec<ShipmentLine>,
}

impl Shipment {
    /// 創建未編號的單據
    pub fn new(kind: ShipmentKind, counterparty_id: String, date: NaiveDate) -> Self {
        Self {
            number: None,
            kind,
            counterparty_id,
            date,
            transport: TransportInfo::default(),
            lines: Vec::new(),
        }
    }

    /// 建構器模式：設置運輸資訊
    pub fn with_transport(mut self, transport: TransportInfo) -> Self {
        self.transport = transport;
        self
    }

    /// 建構器模式：添加明細
    pub fn with_line(mut self, piece_id: String, quantity: i64) -> Self {
        self.lines.push(ShipmentLine { piece_id, quantity });
        self
    }

    pub fn is_issued(&self) -> bool {
        self.number.is_some()
    }

    /// 依物料彙總明細數量（同物料多行合併）
    pub fn quantities_by_piece(&self) -> BTreeMap<String, i64> {
        let mut totals = BTreeMap::new();
        for line in &self.lines {
            *totals.entry(line.piece_id.clone()).or_insert(0) += line.quantity;
        }
        totals
    }

    /// 開立前檢查必要欄位
    pub fn validate(&self) -> crate::Result<()> {
        if self.counterparty_id.trim().is_empty() {
            return Err(PlanError::MissingField("counterparty_id"));
        }
        if self.lines.is_empty() {
            return Err(PlanError::MissingField("lines"));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity <= 0) {
            return Err(PlanError::Validation(format!(
                "物料 {} 出貨數量必須大於零",
                line.piece_id
            )));
        }
        Ok(())
    }
}
