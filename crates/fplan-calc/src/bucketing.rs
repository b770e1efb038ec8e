//! 週分桶

use fplan_core::{Demand, WeekLabel};
use std::collections::BTreeMap;

/// 物料 → 週 → 數量
pub type WeeklyQuantities = BTreeMap<String, BTreeMap<WeekLabel, i64>>;

/// 週分桶計算器
pub struct BucketingCalculator;

impl BucketingCalculator {
    /// 評估期間的週桶（含首尾）
    pub fn create_week_buckets(from: WeekLabel, to: WeekLabel) -> Vec<WeekLabel> {
        WeekLabel::range(from, to)
    }

    /// 依物料與週彙總需求（期間外的需求略過）
    pub fn group_demands(demands: &[Demand], from: WeekLabel, to: WeekLabel) -> WeeklyQuantities {
        let mut grouped = WeeklyQuantities::new();
        for demand in demands {
            if demand.period < from || demand.period > to {
                continue;
            }
            *grouped
                .entry(demand.piece_id.clone())
                .or_default()
                .entry(demand.period)
                .or_insert(0) += demand.quantity;
        }
        grouped
    }

    /// 將 (物料, 週, 件數) 累加進分桶
    pub fn accumulate(buckets: &mut WeeklyQuantities, piece_id: &str, week: WeekLabel, units: i64) {
        *buckets
            .entry(piece_id.to_string())
            .or_default()
            .entry(week)
            .or_insert(0) += units;
    }

    /// 攤平成完整週序列（缺週補零）
    pub fn fill(weeks: &[WeekLabel], by_week: Option<&BTreeMap<WeekLabel, i64>>) -> Vec<i64> {
        weeks
            .iter()
            .map(|w| by_week.and_then(|m| m.get(w)).copied().unwrap_or(0))
            .collect()
    }
}
