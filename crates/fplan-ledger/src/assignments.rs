//! 週排程指派帳本

use chrono::NaiveDate;
use fplan_core::{Assignment, AssignmentRepository, PlanError, Result, WeekLabel};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

/// 記憶體指派帳本（每台機台一條清單）
#[derive(Debug, Default)]
pub struct AssignmentLedger {
    lanes: RwLock<BTreeMap<String, Vec<Assignment>>>,
}

impl AssignmentLedger {
    /// 創建空帳本
    pub fn new() -> Self {
        Self::default()
    }

    /// 帳本中的指派總數
    pub fn len(&self) -> usize {
        self.lanes.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: Uuid) -> Option<Assignment> {
        self.lanes
            .read()
            .values()
            .flat_map(|lane| lane.iter())
            .find(|a| a.id == Some(id))
            .cloned()
    }

    /// 某週所有機台的指派
    pub fn list_week(&self, week: WeekLabel) -> Vec<Assignment> {
        self.lanes
            .read()
            .values()
            .flat_map(|lane| lane.iter().filter(|a| a.week == week).cloned())
            .collect()
    }

    /// 某機台某週已分配工時
    pub fn allocated_hours(&self, machine_id: &str, week: WeekLabel) -> Decimal {
        self.lanes
            .read()
            .get(machine_id)
            .map(|lane| {
                lane.iter()
                    .filter(|a| a.week == week)
                    .map(|a| a.hours)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }

    /// 今天生效中的指派
    ///
    /// 資料正確時最多一筆；若期間重疊則取起日最早者並記錄警告。
    pub fn current_assignment(&self, machine_id: &str, today: NaiveDate) -> Option<Assignment> {
        let lanes = self.lanes.read();
        let mut current: Vec<&Assignment> = lanes
            .get(machine_id)?
            .iter()
            .filter(|a| a.is_current(today))
            .collect();

        if current.len() > 1 {
            tracing::warn!(
                "機台 {} 於 {} 有 {} 筆生效中的指派（期間重疊）",
                machine_id,
                today,
                current.len()
            );
        }

        current.sort_by_key(|a| a.start);
        current.first().map(|a| (*a).clone())
    }

    /// 找出同機台期間重疊的指派對
    pub fn find_overlaps(&self, machine_id: &str) -> Vec<(Uuid, Uuid)> {
        let lanes = self.lanes.read();
        let Some(lane) = lanes.get(machine_id) else {
            return Vec::new();
        };

        let mut pairs = Vec::new();
        for (i, a) in lane.iter().enumerate() {
            for b in lane.iter().skip(i + 1) {
                if a.overlaps(b) {
                    if let (Some(a_id), Some(b_id)) = (a.id, b.id) {
                        pairs.push((a_id, b_id));
                    }
                }
            }
        }
        pairs
    }
}

impl AssignmentRepository for AssignmentLedger {
    fn list_assignments(&self, machine_id: &str, week: WeekLabel) -> Result<Vec<Assignment>> {
        Ok(self
            .lanes
            .read()
            .get(machine_id)
            .map(|lane| lane.iter().filter(|a| a.week == week).cloned().collect())
            .unwrap_or_default())
    }

    fn list_machine(&self, machine_id: &str) -> Result<Vec<Assignment>> {
        let mut assignments = self
            .lanes
            .read()
            .get(machine_id)
            .cloned()
            .unwrap_or_default();
        assignments.sort_by_key(|a| a.start);
        Ok(assignments)
    }

    fn list_range(&self, from: WeekLabel, to: WeekLabel) -> Result<Vec<Assignment>> {
        Ok(self
            .lanes
            .read()
            .values()
            .flat_map(|lane| {
                lane.iter()
                    .filter(|a| from <= a.week && a.week <= to)
                    .cloned()
            })
            .collect())
    }

    fn upsert_assignment(&self, mut record: Assignment) -> Result<Uuid> {
        let mut lanes = self.lanes.write();

        let id = match record.id {
            Some(id) => {
                // 原地取代；若改了機台則移到新機台的清單
                let mut replaced = false;
                for (machine_id, lane) in lanes.iter_mut() {
                    if let Some(pos) = lane.iter().position(|a| a.id == Some(id)) {
                        if *machine_id == record.machine_id {
                            lane[pos] = record.clone();
                            replaced = true;
                        } else {
                            lane.remove(pos);
                        }
                        break;
                    }
                }
                if !replaced {
                    lanes
                        .entry(record.machine_id.clone())
                        .or_default()
                        .push(record.clone());
                }
                tracing::debug!("更新指派 {} ({} {})", id, record.machine_id, record.week);
                id
            }
            None => {
                let id = Uuid::new_v4();
                record.id = Some(id);
                tracing::debug!("新增指派 {} ({} {})", id, record.machine_id, record.week);
                lanes
                    .entry(record.machine_id.clone())
                    .or_default()
                    .push(record);
                id
            }
        };

        Ok(id)
    }

    fn remove_assignment(&self, id: Uuid) -> Result<Assignment> {
        let mut lanes = self.lanes.write();
        for lane in lanes.values_mut() {
            if let Some(pos) = lane.iter().position(|a| a.id == Some(id)) {
                let removed = lane.remove(pos);
                tracing::debug!("刪除指派 {}", id);
                return Ok(removed);
            }
        }
        Err(PlanError::not_found("指派", id.to_string()))
    }
}
