//! 需求 CSV 匯入
//!
//! 表頭：`periodoYYYYWW,pieceId,qty,prioridad`，可另帶 `version`、`frozen` 欄位（合併時忽略）。
//! 單列錯誤會被收集並回報，其餘有效列照常合併。

use csv::{ReaderBuilder, StringRecord};
use fplan_core::{
    Demand, DemandKey, DemandRepository, MergeSummary, PlanError, Priority, Result, WeekLabel,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const COL_PERIOD: &str = "periodoYYYYWW";
const COL_PIECE: &str = "pieceId";
const COL_QTY: &str = "qty";
const COL_PRIORITY: &str = "prioridad";

/// 單列錯誤（列號從第一筆資料列起算為 1）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// 匯入結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_frozen: Vec<DemandKey>,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    /// 合併結果加上單列錯誤
    pub fn from_parts(summary: MergeSummary, errors: Vec<RowError>) -> Self {
        Self {
            inserted: summary.inserted,
            updated: summary.updated,
            skipped_frozen: summary.skipped_frozen,
            errors,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

struct Columns {
    period: usize,
    piece: usize,
    qty: usize,
    priority: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PlanError::Import(format!("缺少欄位 {name}")))
        };
        Ok(Self {
            period: find(COL_PERIOD)?,
            piece: find(COL_PIECE)?,
            qty: find(COL_QTY)?,
            priority: find(COL_PRIORITY)?,
        })
    }
}

/// 需求 CSV 匯入器
#[derive(Debug, Clone, Copy, Default)]
pub struct DemandCsvImporter;

impl DemandCsvImporter {
    pub fn new() -> Self {
        Self
    }

    /// 解析為需求列與單列錯誤
    pub fn parse<R: Read>(&self, reader: R) -> Result<(Vec<Demand>, Vec<RowError>)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| PlanError::Import(e.to_string()))?
            .clone();
        let columns = Columns::locate(&headers)?;

        let mut demands = Vec::new();
        let mut errors = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let row = idx + 1;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    errors.push(RowError {
                        row,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            // 跳過完全空白的列
            if record.iter().all(|v| v.is_empty()) {
                continue;
            }

            match parse_row(&record, &columns) {
                Ok(demand) => demands.push(demand),
                Err(message) => {
                    tracing::warn!("需求匯入第 {} 列略過: {}", row, message);
                    errors.push(RowError { row, message });
                }
            }
        }

        Ok((demands, errors))
    }

    /// 解析並合併至需求簿
    pub fn import<R: Read, D: DemandRepository + ?Sized>(
        &self,
        reader: R,
        repository: &D,
    ) -> Result<ImportReport> {
        let (demands, errors) = self.parse(reader)?;
        let parsed = demands.len();
        let summary = repository.merge(demands)?;

        tracing::info!(
            "需求匯入完成：有效 {} 列，錯誤 {} 列",
            parsed,
            errors.len()
        );

        Ok(ImportReport::from_parts(summary, errors))
    }

    /// 從檔案匯入
    pub fn import_path<D: DemandRepository + ?Sized>(
        &self,
        path: &Path,
        repository: &D,
    ) -> Result<ImportReport> {
        let file = File::open(path)
            .map_err(|e| PlanError::Import(format!("無法開啟 {}: {e}", path.display())))?;
        self.import(file, repository)
    }
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> std::result::Result<&'a str, String> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("缺少欄位 {name}")),
    }
}

fn parse_row(record: &StringRecord, columns: &Columns) -> std::result::Result<Demand, String> {
    let period = WeekLabel::parse(field(record, columns.period, COL_PERIOD)?)
        .map_err(|e| e.to_string())?;
    let piece_id = field(record, columns.piece, COL_PIECE)?.to_string();

    let qty_raw = field(record, columns.qty, COL_QTY)?;
    let quantity: i64 = qty_raw
        .parse()
        .map_err(|_| format!("數量不是整數: {qty_raw}"))?;
    if quantity < 0 {
        return Err(format!("數量不可為負: {quantity}"));
    }

    let priority_raw = field(record, columns.priority, COL_PRIORITY)?;
    let priority = priority_raw
        .parse::<u8>()
        .map_err(|_| format!("優先級不是數字: {priority_raw}"))
        .and_then(|p| Priority::try_from(p).map_err(|e| e.to_string()))?;

    Ok(Demand::new(period, piece_id, quantity).with_priority(priority))
}
