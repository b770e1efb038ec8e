//! 預估產出與實際申報對帳

use fplan_core::{Assignment, ProductionRecord, WeekLabel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 機台週對帳結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReconciliation {
    pub machine_id: String,
    pub week: WeekLabel,
    /// 指派預估件數合計
    pub estimated_units: i64,
    /// 申報良品（含品檢允收）合計
    pub declared_good: i64,
    /// 達成率（預估為零時為 None）
    pub attainment: Option<Decimal>,
}

/// 對帳計算器
pub struct ReconcileCalculator;

impl ReconcileCalculator {
    /// 依 (機台, 週) 彙總預估與實際
    pub fn reconcile(
        assignments: &[Assignment],
        records: &[ProductionRecord],
    ) -> Vec<EstimateReconciliation> {
        let mut totals: BTreeMap<(String, WeekLabel), (i64, i64)> = BTreeMap::new();

        for assignment in assignments {
            totals
                .entry((assignment.machine_id.clone(), assignment.week))
                .or_default()
                .0 += assignment.produced_units_estimate;
        }

        for record in records {
            totals
                .entry((record.machine_id.clone(), WeekLabel::from_date(record.date)))
                .or_default()
                .1 += record.quantities.good + record.accepted;
        }

        totals
            .into_iter()
            .map(|((machine_id, week), (estimated, declared))| EstimateReconciliation {
                machine_id,
                week,
                estimated_units: estimated,
                declared_good: declared,
                attainment: (estimated > 0)
                    .then(|| (Decimal::from(declared) / Decimal::from(estimated)).round_dp(4)),
            })
            .collect()
    }
}
