//! 機台產能與負荷

use fplan_core::{Assignment, Machine, WeekLabel, WorkCalendar};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 機台週負荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineLoad {
    pub machine_id: String,
    pub week: WeekLabel,
    /// 可用工時
    pub available: Decimal,
    /// 已分配工時
    pub allocated: Decimal,
    /// 已分配 / 可用（可用為零時為 None）
    pub ratio: Option<Decimal>,
    /// 超過可用 × 容忍倍率
    pub overloaded: bool,
}

impl MachineLoad {
    pub fn new(
        machine_id: String,
        week: WeekLabel,
        available: Decimal,
        allocated: Decimal,
        tolerance: Decimal,
    ) -> Self {
        let ratio = if available > Decimal::ZERO {
            Some((allocated / available).round_dp(4))
        } else {
            None
        };
        Self {
            machine_id,
            week,
            available,
            allocated,
            ratio,
            overloaded: allocated > available * tolerance,
        }
    }

    /// 剩餘可用工時（不小於零）
    pub fn free_hours(&self) -> Decimal {
        (self.available - self.allocated).max(Decimal::ZERO)
    }
}

/// 產能計算器
pub struct CapacityCalculator;

impl CapacityCalculator {
    /// 可用工時 = 名目週工時 × 可生產日 / 排班工作日
    pub fn available_hours(machine: &Machine, week: WeekLabel, calendar: &WorkCalendar) -> Decimal {
        let scheduled = calendar.scheduled_days_in_week(week);
        if scheduled == 0 {
            return Decimal::ZERO;
        }
        let productive = calendar.productive_days_in_week(&machine.id, week);
        machine.weekly_hours() * Decimal::from(productive) / Decimal::from(scheduled)
    }

    /// 所有機台 × 週的負荷
    ///
    /// 只計入主檔內的機台；不存在機台的指派由評估器另行警告。
    pub fn loads(
        machines: &[Machine],
        weeks: &[WeekLabel],
        assignments: &[Assignment],
        calendar: &WorkCalendar,
        tolerance: Decimal,
    ) -> Vec<MachineLoad> {
        let mut allocated: HashMap<(&str, WeekLabel), Decimal> = HashMap::new();
        for assignment in assignments {
            *allocated
                .entry((assignment.machine_id.as_str(), assignment.week))
                .or_insert(Decimal::ZERO) += assignment.hours;
        }

        let mut loads = Vec::with_capacity(machines.len() * weeks.len());
        for machine in machines {
            for &week in weeks {
                let hours = allocated
                    .get(&(machine.id.as_str(), week))
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                loads.push(MachineLoad::new(
                    machine.id.clone(),
                    week,
                    Self::available_hours(machine, week, calendar),
                    hours,
                    tolerance,
                ));
            }
        }
        loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fplan_core::{AssignmentTarget, Downtime, DowntimeKind, MachineKind};
    use rstest::rstest;

    fn machine() -> Machine {
        // 15 班 × 8 小時 = 120 小時
        Machine::new("INY-01".to_string(), MachineKind::Injection, 15, Decimal::from(8))
    }

    fn week() -> WeekLabel {
        WeekLabel::parse("202541").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_full_week() {
        let calendar = WorkCalendar::new("TEST".to_string());
        assert_eq!(
            CapacityCalculator::available_hours(&machine(), week(), &calendar),
            Decimal::from(120)
        );
    }

    #[rstest]
    #[case(vec![day(6)], vec![], Decimal::from(96))]
    #[case(vec![], vec![Downtime::for_machine("INY-01".to_string(), day(7), day(8), DowntimeKind::Maintenance)], Decimal::from(72))]
    #[case(vec![], vec![Downtime::for_machine("INY-02".to_string(), day(7), day(8), DowntimeKind::Maintenance)], Decimal::from(120))]
    #[case(vec![day(6)], vec![Downtime::plant_wide(day(9), day(12), DowntimeKind::Holiday)], Decimal::from(48))]
    fn test_available_hours_with_exceptions(
        #[case] holidays: Vec<NaiveDate>,
        #[case] downtimes: Vec<Downtime>,
        #[case] expected: Decimal,
    ) {
        let calendar = WorkCalendar::new("TEST".to_string())
            .with_holidays(holidays)
            .with_downtimes(downtimes);
        assert_eq!(
            CapacityCalculator::available_hours(&machine(), week(), &calendar),
            expected
        );
    }

    #[test]
    fn test_no_working_days() {
        let calendar = WorkCalendar::new("TEST".to_string()).with_working_days([false; 7]);
        assert_eq!(
            CapacityCalculator::available_hours(&machine(), week(), &calendar),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_loads_and_overload() {
        let calendar = WorkCalendar::new("TEST".to_string());
        let assignments = vec![
            Assignment::new("INY-01".to_string(), week(), AssignmentTarget::Mold("M-1".to_string()), Decimal::from(100)),
            Assignment::new("INY-01".to_string(), week(), AssignmentTarget::Mold("M-2".to_string()), Decimal::from(30)),
        ];

        let loads = CapacityCalculator::loads(&[machine()], &[week()], &assignments, &calendar, Decimal::ONE);
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].allocated, Decimal::from(130));
        assert!(loads[0].overloaded);
        assert_eq!(loads[0].free_hours(), Decimal::ZERO);

        // 容忍 110% 時不算超載
        let tolerant = CapacityCalculator::loads(&[machine()], &[week()], &assignments, &calendar, Decimal::new(11, 1));
        assert!(!tolerant[0].overloaded);
    }

    #[test]
    fn test_zero_available_ratio() {
        let load = MachineLoad::new("X".to_string(), week(), Decimal::ZERO, Decimal::from(5), Decimal::ONE);
        assert_eq!(load.ratio, None);
        assert!(load.overloaded);
    }
}
