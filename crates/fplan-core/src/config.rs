//! 計劃參數配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 計劃評估參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// 機台無 OEE 資料時使用的預設值
    pub default_oee: Decimal,

    /// 計劃產出超過當週需求時，剩餘量是否轉入後續週的庫存池
    pub carry_over_surplus: bool,

    /// 超載容忍倍率（已分配 > 可用 × 倍率 時視為超載）
    pub overload_tolerance: Decimal,

    /// 計劃時界（週）
    pub horizon_weeks: u32,

    /// 出貨單起始編號
    pub shipment_start_number: u64,
}

impl PlanningConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            default_oee: Decimal::new(85, 2),
            carry_over_surplus: true,
            overload_tolerance: Decimal::ONE,
            horizon_weeks: 12,
            shipment_start_number: 1,
        }
    }

    /// 建構器模式：設置預設 OEE
    pub fn with_default_oee(mut self, oee: Decimal) -> Self {
        self.default_oee = oee;
        self
    }

    /// 建構器模式：設置剩餘產出是否結轉
    ///
    /// # 範例
    /// ```
    /// # use fplan_core::PlanningConfig;
    /// let config = PlanningConfig::new().with_carry_over_surplus(false);
    /// assert!(!config.carry_over_surplus);
    /// ```
    pub fn with_carry_over_surplus(mut self, carry: bool) -> Self {
        self.carry_over_surplus = carry;
        self
    }

    /// 建構器模式：設置超載容忍倍率
    pub fn with_overload_tolerance(mut self, tolerance: Decimal) -> Self {
        self.overload_tolerance = tolerance;
        self
    }

    /// 建構器模式：設置計劃時界
    pub fn with_horizon_weeks(mut self, weeks: u32) -> Self {
        self.horizon_weeks = weeks;
        self
    }

    /// 建構器模式：設置出貨單起始編號
    pub fn with_shipment_start_number(mut self, number: u64) -> Self {
        self.shipment_start_number = number;
        self
    }

    /// 檢查參數合理性
    pub fn validate(&self) -> crate::Result<()> {
        if self.default_oee <= Decimal::ZERO || self.default_oee > Decimal::ONE {
            return Err(crate::PlanError::Validation(format!(
                "default_oee 必須介於 (0, 1]，收到 {}",
                self.default_oee
            )));
        }
        if self.overload_tolerance <= Decimal::ZERO {
            return Err(crate::PlanError::Validation(
                "overload_tolerance 必須大於零".to_string(),
            ));
        }
        if self.horizon_weeks == 0 {
            return Err(crate::PlanError::Validation(
                "horizon_weeks 必須大於零".to_string(),
            ));
        }
        if self.shipment_start_number == 0 {
            return Err(crate::PlanError::Validation(
                "shipment_start_number 必須大於零".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self::new()
    }
}
