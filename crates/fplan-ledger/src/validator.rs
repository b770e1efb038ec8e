//! 指派寫入前檢查
//!
//! 帳本本身不驗證；呼叫端在 `upsert_assignment` 前以本檢查器收集問題。
//! 期間重疊僅為警告，其餘問題會阻擋寫入。

use fplan_core::{
    Assignment, AssignmentRepository, AssignmentTarget, CatalogRepository, PlanError, Result,
};
use chrono::NaiveDate;
use fplan_core::WeekLabel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 檢查發現的問題
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationIssue {
    #[error("找不到機台 {0}")]
    UnknownMachine(String),

    #[error("找不到模具 {0}")]
    UnknownMold(String),

    #[error("找不到物料 {0}")]
    UnknownPiece(String),

    #[error("模具 {0} 維修中")]
    MoldUnavailable(String),

    #[error("模具 {mold_id} 不相容於機台 {machine_id}")]
    IncompatibleMold { mold_id: String, machine_id: String },

    #[error("機台 {machine_id} 沒有可生產物料 {piece_id} 的模具")]
    NoCompatibleMold { piece_id: String, machine_id: String },

    #[error("工時不可為負：{0}")]
    NegativeHours(Decimal),

    #[error("生效期間無效：起日晚於迄日")]
    InvalidDateRange,

    #[error("生效期間 {start}..={end} 不在 {week} 週內")]
    DateRangeOutsideWeek {
        week: WeekLabel,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("與指派 {0} 期間重疊")]
    Overlap(Uuid),
}

impl ValidationIssue {
    /// 是否阻擋寫入
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ValidationIssue::Overlap(_))
    }

    /// 轉為核心錯誤類型
    pub fn into_error(self) -> PlanError {
        match self {
            ValidationIssue::UnknownMachine(id) => PlanError::not_found("機台", id),
            ValidationIssue::UnknownMold(id) => PlanError::not_found("模具", id),
            ValidationIssue::UnknownPiece(id) => PlanError::not_found("物料", id),
            ValidationIssue::IncompatibleMold { mold_id, machine_id } => {
                PlanError::IncompatibleMold { mold_id, machine_id }
            }
            other => PlanError::Validation(other.to_string()),
        }
    }
}

/// 指派檢查器
pub struct AssignmentValidator<'a> {
    catalog: &'a dyn CatalogRepository,
    ledger: &'a dyn AssignmentRepository,
}

impl<'a> AssignmentValidator<'a> {
    pub fn new(catalog: &'a dyn CatalogRepository, ledger: &'a dyn AssignmentRepository) -> Self {
        Self { catalog, ledger }
    }

    /// 收集所有問題（空清單表示可寫入）
    pub fn check(&self, record: &Assignment) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if record.hours < Decimal::ZERO {
            issues.push(ValidationIssue::NegativeHours(record.hours));
        }
        if record.start > record.end {
            issues.push(ValidationIssue::InvalidDateRange);
        } else if !record.within_week() {
            issues.push(ValidationIssue::DateRangeOutsideWeek {
                week: record.week,
                start: record.start,
                end: record.end,
            });
        }

        let machine_known = self.catalog.machine(&record.machine_id).is_ok();
        if !machine_known {
            issues.push(ValidationIssue::UnknownMachine(record.machine_id.clone()));
        }

        match &record.target {
            AssignmentTarget::Mold(mold_id) => match self.catalog.mold(mold_id) {
                Ok(mold) => {
                    if !mold.is_available() {
                        issues.push(ValidationIssue::MoldUnavailable(mold_id.clone()));
                    }
                    if machine_known && !mold.is_compatible_with(&record.machine_id) {
                        issues.push(ValidationIssue::IncompatibleMold {
                            mold_id: mold_id.clone(),
                            machine_id: record.machine_id.clone(),
                        });
                    }
                }
                Err(_) => issues.push(ValidationIssue::UnknownMold(mold_id.clone())),
            },
            AssignmentTarget::Piece(piece_id) => {
                if self.catalog.piece(piece_id).is_err() {
                    issues.push(ValidationIssue::UnknownPiece(piece_id.clone()));
                } else if machine_known
                    && !self
                        .catalog
                        .molds_for_piece(piece_id)
                        .iter()
                        .any(|m| m.is_available() && m.is_compatible_with(&record.machine_id))
                {
                    issues.push(ValidationIssue::NoCompatibleMold {
                        piece_id: piece_id.clone(),
                        machine_id: record.machine_id.clone(),
                    });
                }
            }
        }

        for other in self.ledger.list_machine(&record.machine_id)? {
            if other.id.is_some() && other.id == record.id {
                continue;
            }
            if record.overlaps(&other) {
                if let Some(other_id) = other.id {
                    issues.push(ValidationIssue::Overlap(other_id));
                }
            }
        }

        if !issues.is_empty() {
            tracing::debug!(
                "指派 {} {} 檢查發現 {} 個問題",
                record.machine_id,
                record.week,
                issues.len()
            );
        }

        Ok(issues)
    }

    /// 有阻擋性問題時回傳第一個錯誤，否則回傳警告
    pub fn ensure(&self, record: &Assignment) -> Result<Vec<ValidationIssue>> {
        let issues = self.check(record)?;
        let (blocking, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(|issue| issue.is_blocking());

        match blocking.into_iter().next() {
            Some(issue) => Err(issue.into_error()),
            None => Ok(warnings),
        }
    }
}
