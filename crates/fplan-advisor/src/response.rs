//! 建議回應解析
//!
//! 回應是自由文字，盡力取出排程：整段 JSON 陣列、含 `assignments`/`plan` 陣列的物件、
//! 包在 ``` 區塊或夾在說明文字中的 JSON 都可接受。無法解析的列略過並記錄警告。

use fplan_core::{Assignment, AssignmentTarget, WeekLabel};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AdvisorError, AdvisorResult};

/// 建議的指派
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAssignment {
    pub machine_id: String,
    pub week: WeekLabel,
    pub mold_id: Option<String>,
    pub piece_id: Option<String>,
    pub hours: Decimal,
    pub units: Option<i64>,
}

impl SuggestedAssignment {
    /// 轉為指派（有模具時以模具為目標）
    pub fn to_assignment(&self) -> Assignment {
        let target = match (&self.mold_id, &self.piece_id) {
            (Some(mold_id), _) => AssignmentTarget::Mold(mold_id.clone()),
            (None, Some(piece_id)) => AssignmentTarget::Piece(piece_id.clone()),
            // 解析時已保證兩者至少有一
            (None, None) => AssignmentTarget::Piece(String::new()),
        };
        Assignment::new(self.machine_id.clone(), self.week, target, self.hours)
            .with_estimate(self.units.unwrap_or(0))
    }
}

/// 解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPlan {
    pub assignments: Vec<SuggestedAssignment>,
    pub warnings: Vec<String>,
}

impl ParsedPlan {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// 回應解析器
pub struct ResponseParser;

impl ResponseParser {
    /// 盡力解析回應文字
    pub fn parse(text: &str) -> AdvisorResult<ParsedPlan> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AdvisorError::EmptyResponse);
        }

        let value = Self::extract_value(trimmed)
            .ok_or_else(|| AdvisorError::NoPlanFound(snippet(trimmed)))?;
        let rows = Self::locate_rows(value)
            .ok_or_else(|| AdvisorError::NoPlanFound(snippet(trimmed)))?;

        let mut plan = ParsedPlan::default();
        for (idx, row) in rows.iter().enumerate() {
            match Self::parse_row(row) {
                Ok(assignment) => plan.assignments.push(assignment),
                Err(message) => {
                    tracing::warn!("建議第 {} 筆略過: {}", idx + 1, message);
                    plan.warnings.push(format!("第 {} 筆: {}", idx + 1, message));
                }
            }
        }

        tracing::debug!(
            "解析建議 {} 筆，略過 {} 筆",
            plan.assignments.len(),
            plan.warnings.len()
        );
        Ok(plan)
    }

    fn extract_value(text: &str) -> Option<Value> {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Some(value);
        }

        if let Some(block) = fenced_block(text) {
            if let Ok(value) = serde_json::from_str::<Value>(block) {
                return Some(value);
            }
        }

        // 夾在說明文字中：從最早的 [ 或 { 取到最後一個對應的結尾
        let mut candidates: Vec<(usize, char)> = ['[', '{']
            .iter()
            .filter_map(|&open| text.find(open).map(|pos| (pos, open)))
            .collect();
        candidates.sort_unstable();

        candidates.into_iter().find_map(|(start, open)| {
            let close = if open == '[' { ']' } else { '}' };
            let end = text.rfind(close)?;
            if end <= start {
                return None;
            }
            serde_json::from_str::<Value>(&text[start..=end]).ok()
        })
    }

    fn locate_rows(value: Value) -> Option<Vec<Value>> {
        match value {
            Value::Array(rows) => Some(rows),
            Value::Object(mut map) => ["assignments", "plan"]
                .iter()
                .find_map(|key| map.remove(*key))
                .and_then(Self::locate_rows),
            _ => None,
        }
    }

    fn parse_row(row: &Value) -> Result<SuggestedAssignment, String> {
        let obj = row.as_object().ok_or("不是 JSON 物件")?;

        let machine_id = text_field(obj, &["machine_id", "machineId", "machine"])
            .ok_or("缺少機台")?;

        let week_raw = text_field(obj, &["week", "periodo", "period"]).ok_or("缺少週別")?;
        let week = WeekLabel::parse(&week_raw).map_err(|e| e.to_string())?;

        let mold_id = text_field(obj, &["mold_id", "moldId", "mold"]);
        let piece_id = text_field(obj, &["piece_id", "pieceId", "piece"]);
        if mold_id.is_none() && piece_id.is_none() {
            return Err("缺少模具或物料".to_string());
        }

        let hours = decimal_field(obj, &["hours", "horas"]).ok_or("缺少工時")?;
        if hours < Decimal::ZERO {
            return Err(format!("工時不可為負: {hours}"));
        }

        let units = ["units", "produced_units_estimate", "estimate"]
            .iter()
            .find_map(|key| obj.get(*key))
            .and_then(Value::as_i64);

        Ok(SuggestedAssignment {
            machine_id,
            week,
            mold_id,
            piece_id,
            hours,
            units,
        })
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // 跳過語言標記（例如 ```json）
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn decimal_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    })
}

fn snippet(text: &str) -> String {
    text.chars().take(80).collect()
}
