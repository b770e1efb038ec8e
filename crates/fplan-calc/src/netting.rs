//! 需求覆蓋計算
//!
//! 每週需求依序由庫存池、當週計劃產出覆蓋，剩餘為未覆蓋量。

use fplan_core::WeekLabel;
use serde::{Deserialize, Serialize};

/// 單週覆蓋結果
///
/// 恆等式：`stock_covered + production_covered + uncovered == demand`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub week: WeekLabel,
    /// 需求
    pub demand: i64,
    /// 當週計劃產出
    pub planned: i64,
    /// 由庫存覆蓋
    pub stock_covered: i64,
    /// 由計劃產出覆蓋
    pub production_covered: i64,
    /// 未覆蓋
    pub uncovered: i64,
    /// 週末庫存池
    pub projected_pool: i64,
}

impl CoverageRow {
    pub fn is_covered(&self) -> bool {
        self.uncovered == 0
    }
}

/// 覆蓋計算器
pub struct CoverageCalculator;

impl CoverageCalculator {
    /// 計算逐週覆蓋
    ///
    /// # 參數
    /// * `initial_stock` - 期初成品庫存（負數視為零）
    /// * `carry_over_surplus` - 計劃產出多於當週剩餘需求時，多出部分是否轉入庫存池
    pub fn calculate(
        weeks: &[WeekLabel],
        demand: &[i64],
        planned: &[i64],
        initial_stock: i64,
        carry_over_surplus: bool,
    ) -> Vec<CoverageRow> {
        let mut pool = initial_stock.max(0);
        let mut rows = Vec::with_capacity(weeks.len());

        for (idx, &week) in weeks.iter().enumerate() {
            let demand_w = demand.get(idx).copied().unwrap_or(0).max(0);
            let planned_w = planned.get(idx).copied().unwrap_or(0).max(0);

            let stock_covered = pool.min(demand_w);
            pool -= stock_covered;

            let remaining = demand_w - stock_covered;
            let production_covered = planned_w.min(remaining);
            let uncovered = remaining - production_covered;

            if carry_over_surplus {
                pool += planned_w - production_covered;
            }

            rows.push(CoverageRow {
                week,
                demand: demand_w,
                planned: planned_w,
                stock_covered,
                production_covered,
                uncovered,
                projected_pool: pool,
            });
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn weeks(n: usize) -> Vec<WeekLabel> {
        let from = WeekLabel::parse("202430").unwrap();
        let mut weeks = vec![from];
        while weeks.len() < n {
            let next = weeks[weeks.len() - 1].next();
            weeks.push(next);
        }
        weeks
    }

    #[test]
    fn test_stock_then_production() {
        let rows = CoverageCalculator::calculate(&weeks(3), &[100, 100, 100], &[0, 80, 0], 150, true);

        assert_eq!((rows[0].stock_covered, rows[0].production_covered, rows[0].uncovered), (100, 0, 0));
        assert_eq!((rows[1].stock_covered, rows[1].production_covered, rows[1].uncovered), (50, 50, 0));
        assert_eq!(rows[1].projected_pool, 30);
        assert_eq!((rows[2].stock_covered, rows[2].production_covered, rows[2].uncovered), (30, 0, 70));
    }

    #[rstest]
    #[case(true, 200, 0)]
    #[case(false, 0, 100)]
    fn test_surplus_carry_over(#[case] carry: bool, #[case] pool_after_first: i64, #[case] second_uncovered: i64) {
        let rows = CoverageCalculator::calculate(&weeks(2), &[100, 100], &[300, 0], 0, carry);
        assert_eq!(rows[0].production_covered, 100);
        assert_eq!(rows[0].projected_pool, pool_after_first);
        assert_eq!(rows[1].uncovered, second_uncovered);
    }

    #[test]
    fn test_negative_stock_treated_as_zero() {
        let rows = CoverageCalculator::calculate(&weeks(1), &[10], &[0], -40, true);
        assert_eq!(rows[0].stock_covered, 0);
        assert_eq!(rows[0].uncovered, 10);
    }

    #[test]
    fn test_missing_series_default_zero() {
        let rows = CoverageCalculator::calculate(&weeks(2), &[5], &[], 0, true);
        assert_eq!(rows[1].demand, 0);
        assert!(rows[1].is_covered());
        assert_eq!(rows[0].uncovered, 5);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// 每週覆蓋拆分加總恰等於需求
        #[test]
        fn prop_split_sums_to_demand(
            series in prop::collection::vec((0i64..10_000, 0i64..10_000), 1..20),
            initial in -1_000i64..50_000,
            carry in any::<bool>(),
        ) {
            let (demand, planned): (Vec<i64>, Vec<i64>) = series.into_iter().unzip();
            let rows = CoverageCalculator::calculate(&weeks(demand.len()), &demand, &planned, initial, carry);

            for (row, d) in rows.iter().zip(demand.iter()) {
                prop_assert_eq!(row.stock_covered + row.production_covered + row.uncovered, *d);
                prop_assert!(row.stock_covered >= 0 && row.production_covered >= 0 && row.uncovered >= 0);
                prop_assert!(row.projected_pool >= 0);
            }
        }
    }
}
