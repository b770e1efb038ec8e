//! 出貨單流水號與已開立單據

use fplan_core::{PlanError, Result, Shipment};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// 單一持久計數器，`next_number` 嚴格遞增
#[derive(Debug)]
pub struct ShipmentCounter {
    next: Mutex<u64>,
    issued: RwLock<BTreeMap<u64, Shipment>>,
}

impl ShipmentCounter {
    /// 從指定起始號碼開始編號（號碼範圍由 `PlanningConfig::validate` 把關）
    pub fn new(start_number: u64) -> Self {
        Self {
            next: Mutex::new(start_number),
            issued: RwLock::new(BTreeMap::new()),
        }
    }

    /// 取號
    pub fn next_number(&self) -> u64 {
        let mut next = self.next.lock();
        let number = *next;
        *next += 1;
        number
    }

    /// 下一個將被配發的號碼（不取號）
    pub fn peek(&self) -> u64 {
        *self.next.lock()
    }

    /// 取號並登錄單據
    ///
    /// 庫存檢查與扣帳由呼叫端在取號前後處理。
    pub fn issue(&self, mut shipment: Shipment) -> Result<Shipment> {
        shipment.validate()?;
        if shipment.is_issued() {
            return Err(PlanError::Validation(format!(
                "出貨單已開立：{:?}",
                shipment.number
            )));
        }

        let number = self.next_number();
        shipment.number = Some(number);
        self.issued.write().insert(number, shipment.clone());
        tracing::info!(
            "開立出貨單 #{} ({:?} → {})",
            number,
            shipment.kind,
            shipment.counterparty_id
        );
        Ok(shipment)
    }

    pub fn get(&self, number: u64) -> Result<Shipment> {
        self.issued
            .read()
            .get(&number)
            .cloned()
            .ok_or_else(|| PlanError::not_found("出貨單", number.to_string()))
    }

    pub fn issued(&self) -> Vec<Shipment> {
        self.issued.read().values().cloned().collect()
    }
}

impl Default for ShipmentCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fplan_core::ShipmentKind;
    use std::sync::Arc;

    fn shipment() -> Shipment {
        Shipment::new(
            ShipmentKind::CustomerDelivery,
            "CLI-01".to_string(),
            NaiveDate::from_ymd_opt(2024, 7, 26).unwrap(),
        )
        .with_line("P1001".to_string(), 10)
    }

    #[test]
    fn test_numbers_start_at_configured_value() {
        let counter = ShipmentCounter::new(500);
        assert_eq!(counter.peek(), 500);
        assert_eq!(counter.issue(shipment()).unwrap().number, Some(500));
        assert_eq!(counter.issue(shipment()).unwrap().number, Some(501));
        assert_eq!(counter.get(500).unwrap().lines.len(), 1);
        assert_eq!(counter.issued().len(), 2);
    }

    #[test]
    fn test_invalid_shipment_consumes_no_number() {
        let counter = ShipmentCounter::default();
        let empty = Shipment::new(
            ShipmentKind::CustomerDelivery,
            "CLI-01".to_string(),
            NaiveDate::from_ymd_opt(2024, 7, 26).unwrap(),
        );
        assert!(counter.issue(empty).is_err());
        assert_eq!(counter.peek(), 1);

        let issued = counter.issue(shipment()).unwrap();
        assert!(counter.issue(issued).is_err());
    }

    #[test]
    fn test_concurrent_numbers_unique() {
        let counter = Arc::new(ShipmentCounter::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || (0..50).map(|_| counter.next_number()).collect::<Vec<_>>())
            })
            .collect();

        let mut numbers: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), 200);
        assert_eq!(numbers.first(), Some(&1));
        assert_eq!(numbers.last(), Some(&200));
    }
}
