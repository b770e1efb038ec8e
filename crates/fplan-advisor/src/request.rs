//! 建議請求（JSON 字串化後送出）

use chrono::NaiveDate;
use fplan_core::{
    Demand, Downtime, Machine, Mold, PlanningConfig, ProductionRecord, StockRecord, WeekLabel,
    WorkCalendar,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::response::SuggestedAssignment;
use crate::AdvisorResult;

/// 需求列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub week: WeekLabel,
    pub piece_id: String,
    pub quantity: i64,
    pub priority: u8,
}

impl From<&Demand> for DemandLine {
    fn from(demand: &Demand) -> Self {
        Self {
            week: demand.period,
            piece_id: demand.piece_id.clone(),
            quantity: demand.quantity,
            priority: demand.priority.into(),
        }
    }
}

/// 庫存摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLine {
    pub piece_id: String,
    pub finished: i64,
    pub injected_unpressed: i64,
    pub pending_quality: i64,
}

impl From<&StockRecord> for StockLine {
    fn from(record: &StockRecord) -> Self {
        Self {
            piece_id: record.piece_id.clone(),
            finished: record.finished(),
            injected_unpressed: record.injected_unpressed,
            pending_quality: record.pending_quality,
        }
    }
}

/// 機台產能摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineCapacity {
    pub machine_id: String,
    pub weekly_hours: Decimal,
    pub oee: Decimal,
    /// 可上機的模具
    pub compatible_molds: Vec<String>,
}

impl MachineCapacity {
    pub fn from_machine(machine: &Machine, molds: &[Mold]) -> Self {
        Self {
            machine_id: machine.id.clone(),
            weekly_hours: machine.weekly_hours(),
            oee: machine.effective_oee(),
            compatible_molds: molds
                .iter()
                .filter(|m| m.is_available() && m.is_compatible_with(&machine.id))
                .map(|m| m.id.clone())
                .collect(),
        }
    }
}

/// 機台 × 物料的不良率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapRate {
    pub machine_id: String,
    pub piece_id: String,
    pub rate: Decimal,
}

impl ScrapRate {
    /// 由生產記錄彙總：(不良 + 開機不良) / 總申報量
    pub fn from_records(records: &[ProductionRecord]) -> Vec<ScrapRate> {
        let mut totals: BTreeMap<(String, String), (i64, i64)> = BTreeMap::new();
        for record in records {
            let entry = totals
                .entry((record.machine_id.clone(), record.piece_id.clone()))
                .or_default();
            entry.0 += record.quantities.scrap + record.quantities.startup_scrap + record.inspected_scrap;
            entry.1 += record.quantities.total() + record.accepted + record.inspected_scrap;
        }

        totals
            .into_iter()
            .filter(|(_, (_, total))| *total > 0)
            .map(|((machine_id, piece_id), (scrap, total))| ScrapRate {
                machine_id,
                piece_id,
                rate: (Decimal::from(scrap) / Decimal::from(total)).round_dp(4),
            })
            .collect()
    }
}

/// 日曆摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub working_days: [bool; 7],
    pub holidays: Vec<NaiveDate>,
}

impl From<&WorkCalendar> for CalendarSummary {
    fn from(calendar: &WorkCalendar) -> Self {
        Self {
            working_days: calendar.working_days,
            holidays: calendar.holidays.clone(),
        }
    }
}

/// 執行參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub from: WeekLabel,
    pub to: WeekLabel,
    pub default_oee: Decimal,
    pub carry_over_surplus: bool,
}

impl RunParameters {
    pub fn new(from: WeekLabel, to: WeekLabel, config: &PlanningConfig) -> Self {
        Self {
            from,
            to,
            default_oee: config.default_oee,
            carry_over_surplus: config.carry_over_surplus,
        }
    }
}

/// 排程產生請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub demand: Vec<DemandLine>,
    pub stock: Vec<StockLine>,
    pub machines: Vec<MachineCapacity>,
    pub downtime: Vec<Downtime>,
    pub scrap: Vec<ScrapRate>,
    pub calendar: CalendarSummary,
    pub params: RunParameters,
}

impl PlanRequest {
    /// 創建新的請求（只含日曆與參數）
    pub fn new(calendar: &WorkCalendar, params: RunParameters) -> Self {
        Self {
            demand: Vec::new(),
            stock: Vec::new(),
            machines: Vec::new(),
            downtime: calendar.downtimes.clone(),
            scrap: Vec::new(),
            calendar: CalendarSummary::from(calendar),
            params,
        }
    }

    /// 建構器模式：設置需求
    pub fn with_demand(mut self, demands: &[Demand]) -> Self {
        self.demand = demands.iter().map(DemandLine::from).collect();
        self
    }

    /// 建構器模式：設置庫存
    pub fn with_stock(mut self, records: &[StockRecord]) -> Self {
        self.stock = records.iter().map(StockLine::from).collect();
        self
    }

    /// 建構器模式：設置機台
    pub fn with_machines(mut self, machines: &[Machine], molds: &[Mold]) -> Self {
        self.machines = machines
            .iter()
            .map(|m| MachineCapacity::from_machine(m, molds))
            .collect();
        self
    }

    /// 建構器模式：設置不良率
    pub fn with_scrap(mut self, records: &[ProductionRecord]) -> Self {
        self.scrap = ScrapRate::from_records(records);
        self
    }

    pub fn to_json(&self) -> AdvisorResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 排程修正請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineRequest {
    pub previous_plan: Vec<SuggestedAssignment>,
    pub instructions: String,
}

impl RefineRequest {
    pub fn new(previous_plan: Vec<SuggestedAssignment>, instructions: String) -> Self {
        Self {
            previous_plan,
            instructions,
        }
    }

    pub fn to_json(&self) -> AdvisorResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fplan_core::{MachineKind, OutcomeQuantities, Priority, Shift};

    fn week(label: &str) -> WeekLabel {
        WeekLabel::parse(label).unwrap()
    }

    #[test]
    fn test_request_json_shape() {
        let calendar = WorkCalendar::default();
        let params = RunParameters::new(week("202430"), week("202433"), &PlanningConfig::default());
        let request = PlanRequest::new(&calendar, params)
            .with_demand(&[Demand::new(week("202430"), "P1001".to_string(), 5000)
                .with_priority(Priority::High)])
            .with_stock(&[StockRecord::zeroed("P1001".to_string())])
            .with_machines(
                &[Machine::new("INY-01".to_string(), MachineKind::Injection, 15, Decimal::from(8))],
                &[Mold::new("M-1".to_string(), 2, Decimal::from(30))
                    .with_compatible_machines(vec!["INY-01".to_string()])],
            );

        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["demand"][0]["week"], "202430");
        assert_eq!(json["demand"][0]["priority"], 1);
        assert_eq!(json["machines"][0]["compatible_molds"][0], "M-1");
        assert_eq!(json["params"]["from"], "202430");
        assert!(json["calendar"]["working_days"].is_array());
    }

    #[test]
    fn test_scrap_rate() {
        let record = ProductionRecord::new(
            "INY-01".to_string(),
            Shift::Night,
            NaiveDate::from_ymd_opt(2024, 7, 22).unwrap(),
            "P1".to_string(),
            OutcomeQuantities {
                good: 90,
                scrap: 6,
                startup_scrap: 4,
                ..OutcomeQuantities::default()
            },
        );
        let rates = ScrapRate::from_records(&[record]);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate, Decimal::new(1, 1));
    }

    #[test]
    fn test_refine_request() {
        let json = RefineRequest::new(Vec::new(), "少排週五".to_string()).to_json().unwrap();
        assert!(json.contains("\"instructions\":\"少排週五\""));
        assert!(json.contains("\"previous_plan\":[]"));
    }
}
