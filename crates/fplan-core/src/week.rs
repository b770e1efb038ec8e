//! 週標籤模型（YYYYWW）

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::PlanError;

/// ISO-8601 週標籤，文字格式為 `YYYYWW`（例如 `202430`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekLabel {
    year: i32,
    week: u32,
}

impl WeekLabel {
    /// 創建週標籤（驗證該 ISO 年份確實存在此週）
    pub fn new(year: i32, week: u32) -> crate::Result<Self> {
        if !(0..=9999).contains(&year)
            || NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none()
        {
            return Err(PlanError::InvalidWeek(format!("{year:04}{week:02}")));
        }
        Ok(Self { year, week })
    }

    /// 由日期取得所屬 ISO 週
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// 解析 `YYYYWW` 字串
    pub fn parse(label: &str) -> crate::Result<Self> {
        label.parse()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// 週一
    pub fn monday(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).expect("週標籤已驗證")
    }

    /// 週日
    pub fn sunday(&self) -> NaiveDate {
        self.monday() + Duration::days(6)
    }

    /// 該週的七個日期（週一到週日）
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let monday = self.monday();
        (0..7).map(move |offset| monday + Duration::days(offset))
    }

    /// 檢查日期是否落在此週
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }

    /// 下一週
    pub fn next(&self) -> Self {
        Self::from_date(self.monday() + Duration::weeks(1))
    }

    /// 上一週
    pub fn previous(&self) -> Self {
        Self::from_date(self.monday() - Duration::weeks(1))
    }

    /// 建立 `from..=to` 的連續週列表（from > to 時為空）
    pub fn range(from: WeekLabel, to: WeekLabel) -> Vec<WeekLabel> {
        let mut weeks = Vec::new();
        let mut current = from;

        while current <= to {
            weeks.push(current);
            current = current.next();
        }

        weeks
    }
}

impl fmt::Display for WeekLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.week)
    }
}

impl FromStr for WeekLabel {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.len() != 6 || !label.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PlanError::InvalidWeek(label.to_string()));
        }

        let year: i32 = label[..4]
            .parse()
            .map_err(|_| PlanError::InvalidWeek(label.to_string()))?;
        let week: u32 = label[4..]
            .parse()
            .map_err(|_| PlanError::InvalidWeek(label.to_string()))?;

        Self::new(year, week)
    }
}

impl Serialize for WeekLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
