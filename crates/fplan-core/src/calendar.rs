//! 工廠日曆與機台停機例外

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::week::WeekLabel;

/// 非生產時段類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DowntimeKind {
    /// 假日
    Holiday,
    /// 保養維修
    Maintenance,
    /// 換模/換線
    Changeover,
}

/// 非生產時段（含首尾兩日）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Downtime {
    /// 機台ID（None 表示全廠）
    pub machine_id: Option<String>,

    /// 開始日期
    pub start: NaiveDate,

    /// 結束日期（含）
    pub end: NaiveDate,

    /// 類型
    pub kind: DowntimeKind,

    /// 原因說明
    pub reason: Option<String>,
}

impl Downtime {
    /// 創建機台停機時段
    pub fn for_machine(machine_id: String, start: NaiveDate, end: NaiveDate, kind: DowntimeKind) -> Self {
        Self {
            machine_id: Some(machine_id),
            start,
            end,
            kind,
            reason: None,
        }
    }

    /// 創建全廠停機時段
    pub fn plant_wide(start: NaiveDate, end: NaiveDate, kind: DowntimeKind) -> Self {
        Self {
            machine_id: None,
            start,
            end,
            kind,
            reason: None,
        }
    }

    /// 建構器模式：設置原因
    pub fn with_reason(mut self, reason: String) -> Self {
        self.reason = Some(reason);
        self
    }

    /// 檢查是否影響指定機台的指定日期
    pub fn covers(&self, machine_id: &str, date: NaiveDate) -> bool {
        let machine_matches = match &self.machine_id {
            Some(id) => id == machine_id,
            None => true,
        };
        machine_matches && self.start <= date && date <= self.end
    }

    /// 檢查是否與某週有交集
    pub fn overlaps_week(&self, week: WeekLabel) -> bool {
        self.start <= week.sunday() && week.monday() <= self.end
    }
}

/// 工作日曆
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCalendar {
    /// 工作日（週一到週日，true表示工作日）
    /// 索引 0 = 週一, 1 = 週二, ..., 6 = 週日
    pub working_days: [bool; 7],

    /// 節假日列表
    pub holidays: Vec<NaiveDate>,

    /// 停機例外
    pub downtimes: Vec<Downtime>,

    /// 日曆ID
    pub calendar_id: String,
}

impl WorkCalendar {
    /// 創建新的工作日曆（預設週一到週五為工作日）
    pub fn new(calendar_id: String) -> Self {
        Self {
            working_days: [true, true, true, true, true, false, false],
            calendar_id,
            holidays: Vec::new(),
            downtimes: Vec::new(),
        }
    }

    /// 創建 24/7 日曆（所有日子都是工作日）
    pub fn new_24_7(calendar_id: String) -> Self {
        Self {
            working_days: [true; 7],
            calendar_id,
            holidays: Vec::new(),
            downtimes: Vec::new(),
        }
    }

    /// 建構器模式：設置工作日
    pub fn with_working_days(mut self, working_days: [bool; 7]) -> Self {
        self.working_days = working_days;
        self
    }

    /// 建構器模式：添加節假日
    pub fn with_holidays(mut self, holidays: Vec<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    /// 建構器模式：設置停機例外
    pub fn with_downtimes(mut self, downtimes: Vec<Downtime>) -> Self {
        self.downtimes = downtimes;
        self
    }

    /// 添加節假日
    pub fn add_holiday(&mut self, date: NaiveDate) {
        if !self.holidays.contains(&date) {
            self.holidays.push(date);
            self.holidays.sort();
        }
    }

    /// 添加停機例外
    pub fn add_downtime(&mut self, downtime: Downtime) {
        self.downtimes.push(downtime);
    }

    /// 檢查是否為工作日
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        // 檢查是否為節假日
        if self.holidays.contains(&date) {
            return false;
        }

        // 檢查是否為工作日
        let weekday_index = date.weekday().num_days_from_monday() as usize;
        self.working_days[weekday_index]
    }

    /// 檢查機台在指定日期是否可生產
    pub fn is_productive_day(&self, machine_id: &str, date: NaiveDate) -> bool {
        self.is_working_day(date) && !self.downtimes.iter().any(|d| d.covers(machine_id, date))
    }

    /// 週內排班工作日數（不含節假日、不含停機）
    pub fn scheduled_days_in_week(&self, week: WeekLabel) -> u32 {
        week.days()
            .filter(|d| self.working_days[d.weekday().num_days_from_monday() as usize])
            .count() as u32
    }

    /// 機台在該週的可生產日數
    pub fn productive_days_in_week(&self, machine_id: &str, week: WeekLabel) -> u32 {
        week.days()
            .filter(|d| self.is_productive_day(machine_id, *d))
            .count() as u32
    }

    /// 取得影響機台於該週的停機例外
    pub fn downtimes_for(&self, machine_id: &str, week: WeekLabel) -> Vec<&Downtime> {
        self.downtimes
            .iter()
            .filter(|d| d.overlaps_week(week))
            .filter(|d| d.machine_id.as_deref().map_or(true, |id| id == machine_id))
            .collect()
    }
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::new("DEFAULT".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(label: &str) -> WeekLabel {
        WeekLabel::parse(label).unwrap()
    }

    #[test]
    fn test_create_calendar() {
        let calendar = WorkCalendar::new("TEST".to_string());
        assert_eq!(calendar.calendar_id, "TEST");

        let monday = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
        assert!(calendar.is_working_day(monday));
        let saturday = NaiveDate::from_ymd_opt(2025, 10, 11).unwrap();
        assert!(!calendar.is_working_day(saturday));
    }

    #[test]
    fn test_holidays() {
        let mut calendar = WorkCalendar::new("TEST".to_string());

        let holiday = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        calendar.add_holiday(holiday);
        calendar.add_holiday(holiday);

        assert_eq!(calendar.holidays.len(), 1);
        assert!(!calendar.is_working_day(holiday));
    }

    #[test]
    fn test_machine_downtime_only_affects_that_machine() {
        let mut calendar = WorkCalendar::new("TEST".to_string());
        let tuesday = NaiveDate::from_ymd_opt(2025, 10, 7).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();
        calendar.add_downtime(Downtime::for_machine(
            "INY-01".to_string(),
            tuesday,
            wednesday,
            DowntimeKind::Maintenance,
        ));

        assert!(!calendar.is_productive_day("INY-01", tuesday));
        assert!(!calendar.is_productive_day("INY-01", wednesday));
        assert!(calendar.is_productive_day("INY-02", tuesday));
    }

    #[test]
    fn test_productive_days_in_week() {
        // 2025-W41：10/6（一）到 10/12（日）
        let w41 = week("202541");
        let mut calendar = WorkCalendar::new("TEST".to_string());
        assert_eq!(calendar.scheduled_days_in_week(w41), 5);
        assert_eq!(calendar.productive_days_in_week("INY-01", w41), 5);

        calendar.add_holiday(NaiveDate::from_ymd_opt(2025, 10, 10).unwrap());
        calendar.add_downtime(Downtime::for_machine(
            "INY-01".to_string(),
            NaiveDate::from_ymd_opt(2025, 10, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 6).unwrap(),
            DowntimeKind::Changeover,
        ));

        assert_eq!(calendar.productive_days_in_week("INY-01", w41), 3);
        assert_eq!(calendar.productive_days_in_week("INY-02", w41), 4);
    }

    #[test]
    fn test_downtimes_for_week() {
        let w41 = week("202541");
        let calendar = WorkCalendar::new("TEST".to_string()).with_downtimes(vec![
            Downtime::plant_wide(
                NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 10, 6).unwrap(),
                DowntimeKind::Holiday,
            )
            .with_reason("年度停機".to_string()),
            Downtime::for_machine(
                "INY-02".to_string(),
                NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
                NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
                DowntimeKind::Maintenance,
            ),
            Downtime::for_machine(
                "INY-01".to_string(),
                NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
                NaiveDate::from_ymd_opt(2025, 10, 21).unwrap(),
                DowntimeKind::Maintenance,
            ),
        ]);

        let affecting = calendar.downtimes_for("INY-01", w41);
        assert_eq!(affecting.len(), 1);
        assert_eq!(affecting[0].kind, DowntimeKind::Holiday);
    }

    #[test]
    fn test_24_7_calendar() {
        let calendar = WorkCalendar::new_24_7("24/7".to_string());
        assert_eq!(calendar.scheduled_days_in_week(week("202541")), 7);
        assert!(calendar.is_working_day(NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()));
    }
}
