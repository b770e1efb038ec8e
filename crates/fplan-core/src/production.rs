//! 生產申報與品檢模型

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PlanError;

/// 班別
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

/// 申報鍵（機台, 班別, 日期）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationKey {
    pub machine_id: String,
    pub shift: Shift,
    pub date: NaiveDate,
}

/// 依結果分類的數量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeQuantities {
    /// 良品
    pub good: i64,
    /// 未壓製品
    pub unpressed: i64,
    /// 不良品
    pub scrap: i64,
    /// 開機不良
    pub startup_scrap: i64,
    /// 隔離待檢
    pub quarantined: i64,
}

impl OutcomeQuantities {
    /// 只有良品的數量組合
    pub fn good(quantity: i64) -> Self {
        Self {
            good: quantity,
            ..Self::default()
        }
    }

    /// 逐欄位累加
    /// 逐欄累加；任一欄溢位時不做任何變更
    pub fn accumulate(&mut self, other: &OutcomeQuantities) -> crate::Result<()> {
        let add = |name: &str, a: i64, b: i64| {
            a.checked_add(b)
                .ok_or_else(|| PlanError::Validation(format!("{name} 累計數量溢位")))
        };
        *self = OutcomeQuantities {
            good: add("good", self.good, other.good)?,
            unpressed: add("unpressed", self.unpressed, other.unpressed)?,
            scrap: add("scrap", self.scrap, other.scrap)?,
            startup_scrap: add("startup_scrap", self.startup_scrap, other.startup_scrap)?,
            quarantined: add("quarantined", self.quarantined, other.quarantined)?,
        };
        Ok(())
    }

    /// 各欄合計（溢位時為 None）
    pub fn checked_total(&self) -> Option<i64> {
        [self.unpressed, self.scrap, self.startup_scrap, self.quarantined]
            .into_iter()
            .try_fold(self.good, i64::checked_add)
    }

    /// 各欄合計（溢位時取上限）
    pub fn total(&self) -> i64 {
        self.checked_total().unwrap_or(i64::MAX)
    }

    /// 申報前檢查：不得為負，且至少有一項大於零
    pub fn validate(&self) -> crate::Result<()> {
        let fields = [
            ("good", self.good),
            ("unpressed", self.unpressed),
            ("scrap", self.scrap),
            ("startup_scrap", self.startup_scrap),
            ("quarantined", self.quarantined),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| *v < 0) {
            return Err(PlanError::Validation(format!("{name} 不可為負數：{value}")));
        }
        match self.checked_total() {
            None => return Err(PlanError::Validation("申報數量合計溢位".to_string())),
            Some(0) => return Err(PlanError::Validation("申報數量全部為零".to_string())),
            Some(_) => {}
        }
        Ok(())
    }
}

/// 一次生產申報（現場輸入）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub machine_id: String,
    pub shift: Shift,
    pub date: NaiveDate,
    pub piece_id: String,
    pub mold_id: Option<String>,
    pub quantities: OutcomeQuantities,
}

impl Declaration {
    /// 創建新的申報
    pub fn new(
        machine_id: String,
        shift: Shift,
        date: NaiveDate,
        piece_id: String,
        quantities: OutcomeQuantities,
    ) -> Self {
        Self {
            machine_id,
            shift,
            date,
            piece_id,
            mold_id: None,
            quantities,
        }
    }

    /// 建構器模式：設置模具
    pub fn with_mold(mut self, mold_id: String) -> Self {
        self.mold_id = Some(mold_id);
        self
    }

    pub fn key(&self) -> DeclarationKey {
        DeclarationKey {
            machine_id: self.machine_id.clone(),
            shift: self.shift,
            date: self.date,
        }
    }

    /// 轉為新記錄（申報鍵首次出現）
    pub fn into_record(self) -> ProductionRecord {
        let record = ProductionRecord::new(
            self.machine_id,
            self.shift,
            self.date,
            self.piece_id,
            self.quantities,
        );
        match self.mold_id {
            Some(mold_id) => record.with_mold(mold_id),
            None => record,
        }
    }
}

/// 生產記錄（每個申報鍵最多一筆）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// 記錄ID
    pub id: Uuid,

    pub machine_id: String,
    pub shift: Shift,
    pub date: NaiveDate,

    /// 物料ID
    pub piece_id: String,

    /// 模具ID
    pub mold_id: Option<String>,

    /// 累計數量
    pub quantities: OutcomeQuantities,

    /// 品檢允收累計
    pub accepted: i64,

    /// 品檢判退累計
    pub inspected_scrap: i64,

    /// 隔離數量歸零時為 true
    pub fully_inspected: bool,

    /// 累加次數
    pub declaration_count: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductionRecord {
    /// 以第一筆申報建立記錄
    pub fn new(
        machine_id: String,
        shift: Shift,
        date: NaiveDate,
        piece_id: String,
        quantities: OutcomeQuantities,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            machine_id,
            shift,
            date,
            piece_id,
            mold_id: None,
            quantities,
            accepted: 0,
            inspected_scrap: 0,
            fully_inspected: quantities.quarantined == 0,
            declaration_count: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// 建構器模式：設置模具
    pub fn with_mold(mut self, mold_id: String) -> Self {
        self.mold_id = Some(mold_id);
        self
    }

    pub fn key(&self) -> DeclarationKey {
        DeclarationKey {
            machine_id: self.machine_id.clone(),
            shift: self.shift,
            date: self.date,
        }
    }

    /// 同鍵的後續申報：逐欄位累加
    pub fn merge(&mut self, piece_id: &str, quantities: &OutcomeQuantities) -> crate::Result<()> {
        if self.piece_id != piece_id {
            return Err(PlanError::Validation(format!(
                "同一機台班別日期已申報物料 {}，不可再申報 {}",
                self.piece_id, piece_id
            )));
        }
        self.quantities.accumulate(quantities)?;
        self.fully_inspected = self.quantities.quarantined == 0;
        self.declaration_count += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 剩餘隔離數量
    pub fn remaining_quarantined(&self) -> i64 {
        self.quantities.quarantined
    }

    /// 品檢：將隔離數量重新分類為允收/判退
    ///
    /// `accepted + scrap` 不得超過當下剩餘隔離數量，否則不做任何變更。
    pub fn inspect(&mut self, accepted: i64, scrap: i64) -> crate::Result<InspectionOutcome> {
        if accepted < 0 || scrap < 0 {
            return Err(PlanError::Validation(format!(
                "檢驗數量不可為負：允收 {accepted}，判退 {scrap}"
            )));
        }
        let requested = accepted
            .checked_add(scrap)
            .ok_or_else(|| PlanError::Validation("檢驗數量合計溢位".to_string()))?;
        if requested == 0 {
            return Err(PlanError::Validation("檢驗數量為零".to_string()));
        }
        let remaining = self.remaining_quarantined();
        if requested > remaining {
            return Err(PlanError::QuarantineExceeded {
                production_id: self.id,
                requested,
                remaining,
            });
        }

        let total_accepted = self.accepted.checked_add(accepted);
        let total_scrap = self.inspected_scrap.checked_add(scrap);
        let (Some(total_accepted), Some(total_scrap)) = (total_accepted, total_scrap) else {
            return Err(PlanError::Validation("累計檢驗數量溢位".to_string()));
        };

        self.accepted = total_accepted;
        self.inspected_scrap = total_scrap;
        self.quantities.quarantined -= requested;
        self.fully_inspected = self.quantities.quarantined == 0;
        self.updated_at = Utc::now();

        Ok(InspectionOutcome {
            production_id: self.id,
            piece_id: self.piece_id.clone(),
            accepted,
            scrap,
            remaining_quarantined: self.quantities.quarantined,
            fully_inspected: self.fully_inspected,
        })
    }
}

/// 品檢結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionOutcome {
    pub production_id: Uuid,
    pub piece_id: String,
    pub accepted: i64,
    pub scrap: i64,
    pub remaining_quarantined: i64,
    pub fully_inspected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record_with_quarantine(quarantined: i64) -> ProductionRecord {
        ProductionRecord::new(
            "INY-01".to_string(),
            Shift::Morning,
            NaiveDate::from_ymd_opt(2024, 7, 22).unwrap(),
            "P1001".to_string(),
            OutcomeQuantities {
                good: 100,
                quarantined,
                ..OutcomeQuantities::default()
            },
        )
    }

    #[test]
    fn test_merge_accumulates() {
        let mut record = record_with_quarantine(0);
        record
            .merge("P1001", &OutcomeQuantities::good(50))
            .unwrap();

        assert_eq!(record.quantities.good, 150);
        assert_eq!(record.declaration_count, 2);
    }

    #[test]
    fn test_merge_rejects_other_piece() {
        let mut record = record_with_quarantine(0);
        let err = record.merge("P2002", &OutcomeQuantities::good(5)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(record.quantities.good, 100);
    }

    #[test]
    fn test_merge_overflow_rejected_without_change() {
        let mut record = record_with_quarantine(10);
        let huge = OutcomeQuantities {
            scrap: 1,
            quarantined: i64::MAX,
            ..OutcomeQuantities::default()
        };
        let err = record.merge("P1001", &huge).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(record.quantities.quarantined, 10);
        assert_eq!(record.quantities.scrap, 0);
        assert_eq!(record.declaration_count, 1);
    }

    #[test]
    fn test_total_overflow() {
        let quantities = OutcomeQuantities {
            good: i64::MAX,
            scrap: 1,
            ..OutcomeQuantities::default()
        };
        assert_eq!(quantities.checked_total(), None);
        assert_eq!(quantities.total(), i64::MAX);
        assert!(quantities.validate().is_err());
    }

    #[test]
    fn test_inspect_overflow_rejected() {
        let mut record = record_with_quarantine(10);
        let err = record.inspect(i64::MAX, 1).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(record.remaining_quarantined(), 10);
    }

    #[test]
    fn test_validate_quantities() {
        assert!(OutcomeQuantities::good(1).validate().is_ok());
        assert!(OutcomeQuantities::default().validate().is_err());
        let negative = OutcomeQuantities {
            scrap: -1,
            good: 10,
            ..OutcomeQuantities::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_inspect_partial_then_full() {
        let mut record = record_with_quarantine(40);
        assert!(!record.fully_inspected);

        let first = record.inspect(25, 5).unwrap();
        assert_eq!(first.remaining_quarantined, 10);
        assert!(!first.fully_inspected);

        let second = record.inspect(10, 0).unwrap();
        assert_eq!(second.remaining_quarantined, 0);
        assert!(second.fully_inspected);
        assert_eq!(record.accepted, 35);
        assert_eq!(record.inspected_scrap, 5);
    }

    #[test]
    fn test_inspect_exceeding_quarantine_is_rejected() {
        let mut record = record_with_quarantine(10);
        let err = record.inspect(8, 3).unwrap_err();

        assert!(matches!(
            err,
            PlanError::QuarantineExceeded {
                requested: 11,
                remaining: 10,
                ..
            }
        ));
        // 不得有任何變更
        assert_eq!(record.remaining_quarantined(), 10);
        assert_eq!(record.accepted, 0);
    }

    #[test]
    fn test_new_quarantine_reopens_inspection() {
        let mut record = record_with_quarantine(5);
        record.inspect(5, 0).unwrap();
        assert!(record.fully_inspected);

        let more = OutcomeQuantities {
            quarantined: 3,
            ..OutcomeQuantities::default()
        };
        record.merge("P1001", &more).unwrap();
        assert!(!record.fully_inspected);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// 任意檢驗序列都不會讓允收+判退超過隔離總量
        #[test]
        fn prop_inspection_never_exceeds_quarantine(
            quarantined in 0i64..500,
            attempts in prop::collection::vec((0i64..200, 0i64..200), 1..20)
        ) {
            let mut record = record_with_quarantine(quarantined);
            for (accepted, scrap) in attempts {
                let before = record.remaining_quarantined();
                match record.inspect(accepted, scrap) {
                    Ok(_) => prop_assert!(accepted + scrap <= before),
                    Err(_) => prop_assert_eq!(record.remaining_quarantined(), before),
                }
                prop_assert!(record.remaining_quarantined() >= 0);
                prop_assert_eq!(
                    record.accepted + record.inspected_scrap + record.remaining_quarantined(),
                    quarantined
                );
                prop_assert_eq!(record.fully_inspected, record.remaining_quarantined() == 0);
            }
        }
    }
}
