//! 週排程指派模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::week::WeekLabel;

/// 指派目標：模具或物料
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AssignmentTarget {
    Mold(String),
    Piece(String),
}

/// 機台週指派（排程格中的一格）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// 指派ID（None 表示尚未寫入帳本）
    pub id: Option<Uuid>,

    /// 機台ID
    pub machine_id: String,

    /// 週標籤
    pub week: WeekLabel,

    /// 模具或物料
    pub target: AssignmentTarget,

    /// 分配工時
    pub hours: Decimal,

    /// 預估產出件數
    pub produced_units_estimate: i64,

    /// 預估件數由模具速率推算（工時或目標變更時重算）
    #[serde(default)]
    pub estimate_is_auto: bool,

    /// 是否含換模準備
    pub setup: bool,

    /// 生效起日
    pub start: NaiveDate,

    /// 生效迄日（含）
    pub end: NaiveDate,
}

impl Assignment {
    /// 創建新的指派（期間預設為該週週一到週日）
    pub fn new(machine_id: String, week: WeekLabel, target: AssignmentTarget, hours: Decimal) -> Self {
        Self {
            id: None,
            machine_id,
            week,
            target,
            hours,
            produced_units_estimate: 0,
            estimate_is_auto: false,
            setup: false,
            start: week.monday(),
            end: week.sunday(),
        }
    }

    /// 建構器模式：設置ID
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// 建構器模式：設置預估產出
    pub fn with_estimate(mut self, units: i64) -> Self {
        self.produced_units_estimate = units;
        self.estimate_is_auto = false;
        self
    }

    /// 建構器模式：標記換模
    pub fn with_setup(mut self, setup: bool) -> Self {
        self.setup = setup;
        self
    }

    /// 建構器模式：設置生效期間
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn mold_id(&self) -> Option<&str> {
        match &self.target {
            AssignmentTarget::Mold(id) => Some(id),
            AssignmentTarget::Piece(_) => None,
        }
    }

    pub fn piece_id(&self) -> Option<&str> {
        match &self.target {
            AssignmentTarget::Piece(id) => Some(id),
            AssignmentTarget::Mold(_) => None,
        }
    }

    /// 今天是否落在生效期間
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.start <= today && today <= self.end
    }

    /// 生效期間是否落在指派週內
    pub fn within_week(&self) -> bool {
        self.week.contains(self.start) && self.week.contains(self.end)
    }

    /// 同機台且期間重疊
    pub fn overlaps(&self, other: &Assignment) -> bool {
        self.machine_id == other.machine_id && self.start <= other.end && other.start <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(label: &str) -> WeekLabel {
        WeekLabel::parse(label).unwrap()
    }

    #[test]
    fn test_create_assignment() {
        let assignment = Assignment::new(
            "INY-01".to_string(),
            week("202430"),
            AssignmentTarget::Mold("M-100".to_string()),
            Decimal::from(40),
        )
        .with_estimate(9600)
        .with_setup(true);

        assert!(assignment.id.is_none());
        assert_eq!(assignment.mold_id(), Some("M-100"));
        assert_eq!(assignment.piece_id(), None);
        assert_eq!(assignment.start, NaiveDate::from_ymd_opt(2024, 7, 22).unwrap());
        assert_eq!(assignment.end, NaiveDate::from_ymd_opt(2024, 7, 28).unwrap());
        assert!(assignment.setup);
    }

    #[test]
    fn test_is_current() {
        let assignment = Assignment::new(
            "INY-01".to_string(),
            week("202430"),
            AssignmentTarget::Piece("P1001".to_string()),
            Decimal::from(8),
        );

        assert!(assignment.is_current(NaiveDate::from_ymd_opt(2024, 7, 24).unwrap()));
        assert!(!assignment.is_current(NaiveDate::from_ymd_opt(2024, 7, 29).unwrap()));
    }

    #[test]
    fn test_overlaps_requires_same_machine() {
        let base = Assignment::new(
            "INY-01".to_string(),
            week("202430"),
            AssignmentTarget::Piece("P1".to_string()),
            Decimal::from(8),
        );
        let other_machine = Assignment {
            machine_id: "INY-02".to_string(),
            ..base.clone()
        };
        let next_week = Assignment::new(
            "INY-01".to_string(),
            week("202431"),
            AssignmentTarget::Piece("P1".to_string()),
            Decimal::from(8),
        );

        assert!(base.overlaps(&base.clone()));
        assert!(!base.overlaps(&other_machine));
        assert!(!base.overlaps(&next_week));
    }

    #[test]
    fn test_within_week() {
        let assignment = Assignment::new(
            "INY-01".to_string(),
            week("202430"),
            AssignmentTarget::Piece("P1".to_string()),
            Decimal::from(8),
        );
        assert!(assignment.within_week());

        let midweek = assignment.clone().with_date_range(
            NaiveDate::from_ymd_opt(2024, 7, 23).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 25).unwrap(),
        );
        assert!(midweek.within_week());

        let later = assignment.clone().with_date_range(
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 10, 6).unwrap(),
        );
        assert!(!later.within_week());

        // 跨到下一週
        let spill = assignment.with_date_range(
            NaiveDate::from_ymd_opt(2024, 7, 26).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 30).unwrap(),
        );
        assert!(!spill.within_week());
    }

    #[test]
    fn test_with_estimate_is_manual() {
        let mut assignment = Assignment::new(
            "INY-01".to_string(),
            week("202430"),
            AssignmentTarget::Piece("P1".to_string()),
            Decimal::from(8),
        );
        assignment.estimate_is_auto = true;
        assert!(!assignment.with_estimate(500).estimate_is_auto);
    }

    #[test]
    fn test_target_serialization() {
        let target = AssignmentTarget::Mold("M-1".to_string());
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["type"], "mold");
        assert_eq!(json["id"], "M-1");
    }
}
