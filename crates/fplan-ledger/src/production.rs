//! 生產申報記錄簿

use chrono::NaiveDate;
use fplan_core::{
    Declaration, DeclarationKey, InspectionOutcome, PlanError, ProductionRecord,
    ProductionRepository, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Uuid, ProductionRecord>,
    by_key: HashMap<DeclarationKey, Uuid>,
}

/// 記憶體生產記錄簿
///
/// 申報的「查找或建立」在同一個寫鎖內完成，同鍵的併發申報不會產生重複記錄。
#[derive(Debug, Default)]
pub struct ProductionLog {
    inner: RwLock<Inner>,
}

impl ProductionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 某機台日期範圍內的記錄
    pub fn list_machine_between(
        &self,
        machine_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<ProductionRecord> {
        let mut records: Vec<ProductionRecord> = self
            .inner
            .read()
            .records
            .values()
            .filter(|r| r.machine_id == machine_id && from <= r.date && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.date, r.shift));
        records
    }
}

impl ProductionRepository for ProductionLog {
    fn declare(&self, declaration: Declaration) -> Result<ProductionRecord> {
        declaration.quantities.validate()?;
        if declaration.machine_id.trim().is_empty() {
            return Err(PlanError::MissingField("machine_id"));
        }
        if declaration.piece_id.trim().is_empty() {
            return Err(PlanError::MissingField("piece_id"));
        }

        let key = declaration.key();
        let mut inner = self.inner.write();

        if let Some(id) = inner.by_key.get(&key).copied() {
            let record = inner
                .records
                .get_mut(&id)
                .ok_or_else(|| PlanError::Store(format!("申報索引指向不存在的記錄 {id}")))?;
            record.merge(&declaration.piece_id, &declaration.quantities)?;
            tracing::debug!(
                "累加申報 {} ({} {:?} {})，第 {} 次",
                id,
                key.machine_id,
                key.shift,
                key.date,
                record.declaration_count
            );
            return Ok(record.clone());
        }

        let record = declaration.into_record();
        tracing::debug!(
            "建立生產記錄 {} ({} {:?} {})",
            record.id,
            key.machine_id,
            key.shift,
            key.date
        );
        inner.by_key.insert(key, record.id);
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: Uuid) -> Result<ProductionRecord> {
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("生產記錄", id.to_string()))
    }

    fn find(&self, key: &DeclarationKey) -> Result<Option<ProductionRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .by_key
            .get(key)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    fn inspect(&self, id: Uuid, accepted: i64, scrap: i64) -> Result<InspectionOutcome> {
        let mut inner = self.inner.write();
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| PlanError::not_found("生產記錄", id.to_string()))?;

        let outcome = record.inspect(accepted, scrap)?;
        tracing::debug!(
            "品檢 {}：允收 {}，判退 {}，剩餘隔離 {}",
            id,
            accepted,
            scrap,
            outcome.remaining_quarantined
        );
        Ok(outcome)
    }

    fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ProductionRecord>> {
        let mut records: Vec<ProductionRecord> = self
            .inner
            .read()
            .records
            .values()
            .filter(|r| from <= r.date && r.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            (a.date, &a.machine_id, a.shift).cmp(&(b.date, &b.machine_id, b.shift))
        });
        Ok(records)
    }

    fn pending_inspection(&self) -> Result<Vec<ProductionRecord>> {
        let mut records: Vec<ProductionRecord> = self
            .inner
            .read()
            .records
            .values()
            .filter(|r| r.remaining_quarantined() > 0)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
