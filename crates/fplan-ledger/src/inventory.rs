//! 記憶體庫存帳本

use fplan_core::{InventoryRepository, PlanError, Result, StockRecord, StockStage};
use parking_lot::RwLock;
use std::collections::HashMap;

/// 每物料一份庫存文件，增量寫入
#[derive(Debug, Default)]
pub struct InventoryLedger {
    records: RwLock<HashMap<String, StockRecord>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, piece_id: &str) -> bool {
        self.records.read().contains_key(piece_id)
    }

    /// 帳上出現負數的物料
    pub fn negative_records(&self) -> Vec<StockRecord> {
        self.records
            .read()
            .values()
            .filter(|r| r.has_negative())
            .cloned()
            .collect()
    }
}

impl InventoryRepository for InventoryLedger {
    fn init_piece(&self, piece_id: &str) -> Result<StockRecord> {
        if piece_id.trim().is_empty() {
            return Err(PlanError::MissingField("piece_id"));
        }
        let record = StockRecord::zeroed(piece_id.to_string());
        self.records
            .write()
            .insert(piece_id.to_string(), record.clone());
        tracing::debug!("初始化庫存 {}", piece_id);
        Ok(record)
    }

    fn apply_deltas(&self, piece_id: &str, deltas: &[(StockStage, i64)]) -> Result<StockRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(piece_id)
            .ok_or_else(|| PlanError::not_found("庫存", piece_id))?;

        for (stage, delta) in deltas {
            record.apply(*stage, *delta);
        }

        if record.has_negative() {
            tracing::warn!("物料 {} 庫存出現負數: {:?}", piece_id, record);
        } else {
            tracing::debug!("物料 {} 套用 {} 筆庫存增量", piece_id, deltas.len());
        }

        Ok(record.clone())
    }

    fn get(&self, piece_id: &str) -> Result<StockRecord> {
        self.records
            .read()
            .get(piece_id)
            .cloned()
            .ok_or_else(|| PlanError::not_found("庫存", piece_id))
    }

    fn list(&self) -> Result<Vec<StockRecord>> {
        let mut records: Vec<StockRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.piece_id.cmp(&b.piece_id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ledger_with(piece: &str) -> InventoryLedger {
        let ledger = InventoryLedger::new();
        ledger.init_piece(piece).unwrap();
        ledger
    }

    #[test]
    fn test_init_zeroes_counters() {
        let ledger = ledger_with("P1");
        ledger.apply_delta("P1", StockStage::Ready, 30).unwrap();

        // 重新初始化回到零
        let record = ledger.init_piece("P1").unwrap();
        assert_eq!(record.total(), 0);
        assert_eq!(ledger.get("P1").unwrap().total(), 0);
    }

    #[test]
    fn test_apply_deltas_single_write() {
        let ledger = ledger_with("P1");
        ledger.apply_delta("P1", StockStage::PendingQuality, 40).unwrap();

        let record = ledger
            .apply_deltas(
                "P1",
                &[(StockStage::PendingQuality, -30), (StockStage::Ready, 25)],
            )
            .unwrap();

        assert_eq!(record.pending_quality, 10);
        assert_eq!(record.ready, 25);
    }

    #[rstest]
    #[case(StockStage::Ready, -5, -5)]
    #[case(StockStage::Machined, 12, 12)]
    #[case(StockStage::InExternalMachining, 0, 0)]
    fn test_no_clamping(#[case] stage: StockStage, #[case] delta: i64, #[case] expected: i64) {
        let ledger = ledger_with("P1");
        let record = ledger.apply_delta("P1", stage, delta).unwrap();
        assert_eq!(record.get(stage), expected);
    }

    #[test]
    fn test_negative_records_reported() {
        let ledger = ledger_with("P1");
        ledger.init_piece("P2").unwrap();
        ledger.apply_delta("P2", StockStage::Ready, -1).unwrap();

        let negatives = ledger.negative_records();
        assert_eq!(negatives.len(), 1);
        assert_eq!(negatives[0].piece_id, "P2");
    }

    #[test]
    fn test_unknown_piece() {
        let ledger = InventoryLedger::new();
        assert!(matches!(
            ledger.apply_delta("NOPE", StockStage::Ready, 1),
            Err(PlanError::NotFound { .. })
        ));
        assert!(ledger.available("NOPE", StockStage::Ready).is_err());
        assert!(ledger.init_piece("  ").is_err());
    }

    #[test]
    fn test_list_sorted() {
        let ledger = ledger_with("P2");
        ledger.init_piece("P1").unwrap();
        let ids: Vec<String> = ledger.list().unwrap().into_iter().map(|r| r.piece_id).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }
}
