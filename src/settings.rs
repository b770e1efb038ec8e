//! 執行設定載入
//!
//! 來源依序為內建預設值、選用的 `fplan.toml`、`FPLAN__` 前綴的環境變數，
//! 例如 `FPLAN__PLANNING__HORIZON_WEEKS=8`。

use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use fplan_core::{PlanningConfig, WorkCalendar};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 預設設定檔（不含副檔名）
pub const DEFAULT_FILE: &str = "fplan";

/// 日曆設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub calendar_id: String,

    /// 週一到週日
    pub working_days: [bool; 7],

    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        let calendar = WorkCalendar::default();
        Self {
            calendar_id: calendar.calendar_id,
            working_days: calendar.working_days,
            holidays: calendar.holidays,
        }
    }
}

impl CalendarSettings {
    pub fn to_calendar(&self) -> WorkCalendar {
        WorkCalendar::new(self.calendar_id.clone())
            .with_working_days(self.working_days)
            .with_holidays(self.holidays.clone())
    }
}

/// 執行設定
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub planning: PlanningConfig,
    pub calendar: CalendarSettings,

    /// 啟動時匯入的需求 CSV
    pub demand_csv: Option<PathBuf>,
}

/// 從工作目錄的 `fplan.toml` 與環境變數載入
pub fn load() -> Result<Settings> {
    load_from(Path::new(DEFAULT_FILE))
}

/// 從指定設定檔（可不存在）與環境變數載入
pub fn load_from(path: &Path) -> Result<Settings> {
    let name = path.to_string_lossy();

    let config = Config::builder()
        .add_source(File::with_name(&name).required(false))
        .add_source(
            Environment::with_prefix("FPLAN")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("無法讀取設定 {name}"))?;

    let settings: Settings = config
        .try_deserialize()
        .context("設定格式錯誤")?;

    settings
        .planning
        .validate()
        .context("計劃參數不合理")?;

    tracing::debug!(
        "載入設定：OEE {}，結轉 {}，展望 {} 週",
        settings.planning.default_oee,
        settings.planning.carry_over_surplus,
        settings.planning.horizon_weeks
    );

    Ok(settings)
}
