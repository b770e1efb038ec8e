//! 缺口工時建議

use fplan_core::{Machine, Mold, WeekLabel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 補足未覆蓋量所需的工時建議
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursSuggestion {
    pub piece_id: String,
    pub week: WeekLabel,
    /// 未覆蓋量
    pub uncovered: i64,
    pub machine_id: String,
    pub mold_id: String,
    /// 每小時產出（已乘 OEE）
    pub units_per_hour: Decimal,
    /// 建議工時（整班倍數）
    pub hours: Decimal,
    /// 建議工時下的預估產出
    pub estimated_units: i64,
}

/// 工時建議計算器
pub struct SizingCalculator;

impl SizingCalculator {
    /// 估算用 OEE：機台無有效值時使用預設值
    pub fn oee_for(machine: Option<&Machine>, default_oee: Decimal) -> Decimal {
        match machine.map(Machine::effective_oee) {
            Some(oee) if oee > Decimal::ZERO => oee,
            _ => default_oee,
        }
    }

    /// 找出最快的可用 (模具, 機台) 組合
    ///
    /// 同速時依模具ID、機台ID排序取第一個，結果可重現。
    pub fn fastest<'a>(
        piece_id: &str,
        molds: &'a [Mold],
        machines: &'a [Machine],
        default_oee: Decimal,
    ) -> Option<(&'a Mold, &'a Machine, Decimal)> {
        let mut best: Option<(&Mold, &Machine, Decimal)> = None;

        for mold in molds.iter().filter(|m| m.produces(piece_id) && m.is_available()) {
            for machine in machines.iter().filter(|m| mold.is_compatible_with(&m.id)) {
                let rate = mold.hourly_rate(Self::oee_for(Some(machine), default_oee));
                if rate <= Decimal::ZERO {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_mold, best_machine, best_rate)) => {
                        rate > best_rate
                            || (rate == best_rate
                                && (&mold.id, &machine.id) < (&best_mold.id, &best_machine.id))
                    }
                };
                if better {
                    best = Some((mold, machine, rate));
                }
            }
        }

        best
    }

    /// 單週缺口的工時建議
    ///
    /// 工時 = ceil(未覆蓋 / 每小時產出)，再無條件進位到每班工時的整數倍。
    pub fn suggest(
        piece_id: &str,
        week: WeekLabel,
        uncovered: i64,
        molds: &[Mold],
        machines: &[Machine],
        default_oee: Decimal,
    ) -> Option<HoursSuggestion> {
        if uncovered <= 0 {
            return None;
        }

        let (mold, machine, rate) = Self::fastest(piece_id, molds, machines, default_oee)?;

        let raw_hours = Decimal::from(uncovered).checked_div(rate)?.ceil();
        let hours = if machine.hours_per_shift > Decimal::ZERO {
            raw_hours
                .checked_div(machine.hours_per_shift)?
                .ceil()
                .checked_mul(machine.hours_per_shift)?
        } else {
            raw_hours
        };

        Some(HoursSuggestion {
            piece_id: piece_id.to_string(),
            week,
            uncovered,
            machine_id: machine.id.clone(),
            mold_id: mold.id.clone(),
            units_per_hour: rate.round_dp(4),
            hours,
            estimated_units: mold.estimate_units(hours, Self::oee_for(Some(machine), default_oee)),
        })
    }
}
