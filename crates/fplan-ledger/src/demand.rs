//! 需求簿

use fplan_core::{Demand, DemandKey, DemandRepository, MergeSummary, PlanError, Result, WeekLabel};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// 依 (週期, 物料) 鍵存放的記憶體需求簿
#[derive(Debug, Default)]
pub struct DemandBook {
    rows: RwLock<BTreeMap<DemandKey, Demand>>,
}

impl DemandBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// 直接寫入（不經合併規則，用於載入既有資料）
    pub fn insert(&self, demand: Demand) {
        self.rows.write().insert(demand.key(), demand);
    }

    /// 某物料的全部需求（依週期排序）
    pub fn for_piece(&self, piece_id: &str) -> Vec<Demand> {
        self.rows
            .read()
            .values()
            .filter(|d| d.piece_id == piece_id)
            .cloned()
            .collect()
    }
}

impl DemandRepository for DemandBook {
    fn merge(&self, incoming: Vec<Demand>) -> Result<MergeSummary> {
        if let Some(bad) = incoming.iter().find(|d| d.quantity < 0) {
            return Err(PlanError::Validation(format!(
                "需求數量不可為負：{} {} = {}",
                bad.period, bad.piece_id, bad.quantity
            )));
        }

        let mut summary = MergeSummary::default();
        let mut rows = self.rows.write();

        for demand in incoming {
            let key = demand.key();
            match rows.get_mut(&key) {
                Some(existing) if existing.frozen => {
                    tracing::debug!("需求 {} {} 已凍結，略過", key.period, key.piece_id);
                    summary.skipped_frozen.push(key);
                }
                Some(existing) => {
                    existing.overwrite_from(&demand);
                    summary.updated += 1;
                }
                None => {
                    // 匯入不會產生凍結列
                    let mut demand = demand;
                    demand.frozen = false;
                    rows.insert(key, demand);
                    summary.inserted += 1;
                }
            }
        }

        tracing::info!(
            "需求合併完成：新增 {}，覆寫 {}，凍結略過 {}",
            summary.inserted,
            summary.updated,
            summary.skipped_frozen.len()
        );
        Ok(summary)
    }

    fn get(&self, key: &DemandKey) -> Result<Option<Demand>> {
        Ok(self.rows.read().get(key).cloned())
    }

    fn list_range(&self, from: WeekLabel, to: WeekLabel) -> Result<Vec<Demand>> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|d| from <= d.period && d.period <= to)
            .cloned()
            .collect())
    }

    fn set_frozen(&self, key: &DemandKey, frozen: bool) -> Result<Demand> {
        let mut rows = self.rows.write();
        let demand = rows.get_mut(key).ok_or_else(|| {
            PlanError::not_found("需求", format!("{} {}", key.period, key.piece_id))
        })?;
        demand.frozen = frozen;
        Ok(demand.clone())
    }
}
