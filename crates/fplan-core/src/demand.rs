//! 需求模型

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::week::WeekLabel;
use crate::PlanError;

/// 需求優先級（1 最高，3 最低）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl TryFrom<u8> for Priority {
    type Error = PlanError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(PlanError::Validation(format!(
                "優先級必須介於 1 到 3，收到 {other}"
            ))),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

/// 需求複合鍵（週期, 物料）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DemandKey {
    pub period: WeekLabel,
    pub piece_id: String,
}

/// 需求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    /// 需求ID
    pub id: Uuid,

    /// 需求週期
    pub period: WeekLabel,

    /// 物料ID
    pub piece_id: String,

    /// 需求數量
    pub quantity: i64,

    /// 優先級
    pub priority: Priority,

    /// 版本（每次被覆寫遞增）
    pub version: u32,

    /// 凍結後不接受匯入覆寫
    pub frozen: bool,
}

impl Demand {
    /// 創建新的需求（草稿狀態，優先級 2）
    pub fn new(period: WeekLabel, piece_id: String, quantity: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            period,
            piece_id,
            quantity,
            priority: Priority::Medium,
            version: 1,
            frozen: false,
        }
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// 建構器模式：設為凍結
    pub fn as_frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn key(&self) -> DemandKey {
        DemandKey {
            period: self.period,
            piece_id: self.piece_id.clone(),
        }
    }

    /// 是否為可被匯入覆寫的草稿
    pub fn is_draft(&self) -> bool {
        !self.frozen
    }

    /// 以新資料覆寫草稿（保留ID，版本遞增）
    pub fn overwrite_from(&mut self, incoming: &Demand) {
        self.quantity = incoming.quantity;
        self.priority = incoming.priority;
        self.version += 1;
    }
}

/// 需求合併結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// 新增筆數
    pub inserted: usize,
    /// 覆寫草稿筆數
    pub updated: usize,
    /// 因凍結而略過的鍵
    pub skipped_frozen: Vec<DemandKey>,
}

impl MergeSummary {
    pub fn touched(&self) -> usize {
        self.inserted + self.updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_demand() {
        let demand = Demand::new(WeekLabel::parse("202430").unwrap(), "P1001".to_string(), 5000)
            .with_priority(Priority::High);

        assert_eq!(demand.piece_id, "P1001");
        assert_eq!(demand.quantity, 5000);
        assert_eq!(demand.priority, Priority::High);
        assert_eq!(demand.version, 1);
        assert!(demand.is_draft());
        assert_eq!(demand.key().period.to_string(), "202430");
    }

    #[test]
    fn test_priority_bounds() {
        assert_eq!(Priority::try_from(3).unwrap(), Priority::Low);
        assert!(Priority::try_from(0).is_err());
        assert!(Priority::try_from(4).is_err());
        assert_eq!(u8::from(Priority::High), 1);
    }

    #[test]
    fn test_overwrite_keeps_identity() {
        let week = WeekLabel::parse("202430").unwrap();
        let mut existing = Demand::new(week, "P1".to_string(), 100);
        let id = existing.id;
        let incoming = Demand::new(week, "P1".to_string(), 250).with_priority(Priority::Low);

        existing.overwrite_from(&incoming);

        assert_eq!(existing.id, id);
        assert_eq!(existing.quantity, 250);
        assert_eq!(existing.priority, Priority::Low);
        assert_eq!(existing.version, 2);
    }

    #[test]
    fn test_priority_serializes_as_number() {
        let demand = Demand::new(WeekLabel::parse("202430").unwrap(), "P1".to_string(), 1)
            .with_priority(Priority::High);
        let json = serde_json::to_value(&demand).unwrap();
        assert_eq!(json["priority"], 1);
        assert_eq!(json["period"], "202430");
    }
}
