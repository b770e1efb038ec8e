//! 計劃評估器

use fplan_core::{
    Assignment, AssignmentRepository, AssignmentTarget, CatalogRepository, DemandRepository,
    InventoryRepository, Machine, Mold, Piece, PlanError, PlanningConfig, StockRecord, WeekLabel,
    WorkCalendar,
};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

use crate::bucketing::{BucketingCalculator, WeeklyQuantities};
use crate::capacity::CapacityCalculator;
use crate::netting::CoverageCalculator;
use crate::sizing::SizingCalculator;
use crate::{PieceCoverage, PlanEvaluation, PlanWarning, WarningKind};

/// 評估所需的主檔快照
struct Snapshot {
    machines: Vec<Machine>,
    molds: Vec<Mold>,
    pieces: HashMap<String, Piece>,
    stock: HashMap<String, StockRecord>,
}

impl Snapshot {
    fn machine(&self, id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }

    fn mold(&self, id: &str) -> Option<&Mold> {
        self.molds.iter().find(|m| m.id == id)
    }
}

/// 計劃評估器
///
/// 純讀取：從倉儲取得需求、庫存、指派與主檔，算出逐週覆蓋、機台負荷與缺口建議。
/// 同樣的輸入一定得到同樣的輸出。
pub struct PlanEvaluator<'a> {
    catalog: &'a dyn CatalogRepository,
    assignments: &'a dyn AssignmentRepository,
    inventory: &'a dyn InventoryRepository,
    demands: &'a dyn DemandRepository,
    calendar: &'a WorkCalendar,
    config: &'a PlanningConfig,
}

impl<'a> PlanEvaluator<'a> {
    /// 創建新的評估器
    pub fn new(
        catalog: &'a dyn CatalogRepository,
        assignments: &'a dyn AssignmentRepository,
        inventory: &'a dyn InventoryRepository,
        demands: &'a dyn DemandRepository,
        calendar: &'a WorkCalendar,
        config: &'a PlanningConfig,
    ) -> Self {
        Self {
            catalog,
            assignments,
            inventory,
            demands,
            calendar,
            config,
        }
    }

    /// 評估 `from..=to` 所有物料
    pub fn evaluate(&self, from: WeekLabel, to: WeekLabel) -> fplan_core::Result<PlanEvaluation> {
        self.run(from, to, None)
    }

    /// 只評估指定物料（增量重算）
    pub fn evaluate_pieces(
        &self,
        from: WeekLabel,
        to: WeekLabel,
        piece_ids: &[String],
    ) -> fplan_core::Result<PlanEvaluation> {
        let filter: BTreeSet<String> = piece_ids.iter().cloned().collect();
        self.run(from, to, Some(&filter))
    }

    fn run(
        &self,
        from: WeekLabel,
        to: WeekLabel,
        filter: Option<&BTreeSet<String>>,
    ) -> fplan_core::Result<PlanEvaluation> {
        if from > to {
            return Err(PlanError::Validation(format!(
                "評估期間無效：{from} 晚於 {to}"
            )));
        }

        let start_time = std::time::Instant::now();

        // Step 1: 週分桶與資料快照
        tracing::debug!("Step 1: 週分桶與資料快照");
        let weeks = BucketingCalculator::create_week_buckets(from, to);
        let demands = self.demands.list_range(from, to)?;
        let assignments = self.assignments.list_range(from, to)?;
        let snapshot = Snapshot {
            machines: self.catalog.machines(),
            molds: self.catalog.molds(),
            pieces: self
                .catalog
                .pieces()
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            stock: self
                .inventory
                .list()?
                .into_iter()
                .map(|r| (r.piece_id.clone(), r))
                .collect(),
        };

        tracing::info!(
            "開始計劃評估 {}..{}：{} 週，需求 {} 筆，指派 {} 筆",
            from,
            to,
            weeks.len(),
            demands.len(),
            assignments.len()
        );

        let mut result = PlanEvaluation::empty();
        result.from = Some(from);
        result.to = Some(to);

        // Step 2: 依物料分組需求
        tracing::debug!("Step 2: 需求分組");
        let demand_by_piece = BucketingCalculator::group_demands(&demands, from, to);

        // Step 3: 指派換算為計劃產出
        tracing::debug!("Step 3: 計劃產出");
        let planned_by_piece = self.planned_production(&assignments, &snapshot, &mut result);

        // Step 4: 決定要評估的物料
        let mut piece_ids: BTreeSet<String> = demand_by_piece
            .keys()
            .chain(planned_by_piece.keys())
            .cloned()
            .collect();
        if let Some(filter) = filter {
            piece_ids.retain(|id| filter.contains(id));
        }
        tracing::debug!("Step 4: 物料數量 {}", piece_ids.len());

        for piece_id in &piece_ids {
            if demand_by_piece.contains_key(piece_id) && !snapshot.pieces.contains_key(piece_id) {
                result.add_warning(PlanWarning::warning(
                    piece_id.clone(),
                    WarningKind::PieceWithoutConfig,
                    format!("物料 {piece_id} 有需求但不在主檔"),
                ));
            }
            if !demand_by_piece.contains_key(piece_id) {
                result.add_warning(PlanWarning::info(
                    piece_id.clone(),
                    WarningKind::ProductionWithoutDemand,
                    format!("物料 {piece_id} 有計劃產出但期間內無需求"),
                ));
            }
            if let Some(record) = snapshot.stock.get(piece_id) {
                if record.has_negative() {
                    result.add_warning(PlanWarning::error(
                        piece_id.clone(),
                        WarningKind::NegativeStock,
                        format!("物料 {piece_id} 帳上庫存為負"),
                    ));
                }
            }
        }

        // Step 5: 逐物料覆蓋（平行）
        tracing::debug!("Step 5: 需求覆蓋");
        let carry_over = self.config.carry_over_surplus;
        let ids: Vec<String> = piece_ids.into_iter().collect();
        let mut coverage: Vec<PieceCoverage> = ids
            .par_iter()
            .map(|piece_id| {
                let initial_stock = snapshot
                    .stock
                    .get(piece_id)
                    .map(StockRecord::finished)
                    .unwrap_or(0);
                let demand = BucketingCalculator::fill(&weeks, demand_by_piece.get(piece_id));
                let planned = BucketingCalculator::fill(&weeks, planned_by_piece.get(piece_id));

                PieceCoverage {
                    piece_id: piece_id.clone(),
                    initial_stock,
                    stock_status: snapshot
                        .pieces
                        .get(piece_id)
                        .map(|p| p.stock_status(initial_stock)),
                    rows: CoverageCalculator::calculate(
                        &weeks,
                        &demand,
                        &planned,
                        initial_stock,
                        carry_over,
                    ),
                }
            })
            .collect();
        coverage.sort_by(|a, b| a.piece_id.cmp(&b.piece_id));

        // Step 6: 機台負荷
        tracing::debug!("Step 6: 機台負荷");
        result.loads = CapacityCalculator::loads(
            &snapshot.machines,
            &weeks,
            &assignments,
            self.calendar,
            self.config.overload_tolerance,
        );
        for load in result.loads.iter().filter(|l| l.overloaded) {
            tracing::warn!(
                "機台 {} 於 {} 超載：已分配 {}，可用 {}",
                load.machine_id,
                load.week,
                load.allocated,
                load.available
            );
            result.warnings.push(PlanWarning::warning(
                load.machine_id.clone(),
                WarningKind::Overload,
                format!(
                    "機台 {} 於 {} 已分配 {} 小時，超過可用 {} 小時",
                    load.machine_id, load.week, load.allocated, load.available
                ),
            ));
        }

        // Step 7: 缺口工時建議
        tracing::debug!("Step 7: 缺口工時建議");
        for piece in &coverage {
            let mut capable = true;
            for row in piece.rows.iter().filter(|r| r.uncovered > 0) {
                match SizingCalculator::suggest(
                    &piece.piece_id,
                    row.week,
                    row.uncovered,
                    &snapshot.molds,
                    &snapshot.machines,
                    self.config.default_oee,
                ) {
                    Some(suggestion) => result.suggestions.push(suggestion),
                    None => capable = false,
                }
            }
            if !capable {
                result.add_warning(PlanWarning::warning(
                    piece.piece_id.clone(),
                    WarningKind::NoCapableMold,
                    format!("物料 {} 有缺口但沒有可用的模具與機台", piece.piece_id),
                ));
            }
        }

        result.coverage = coverage;
        result.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!("計劃評估完成，耗時 {:?}", start_time.elapsed());
        tracing::info!(
            "物料 {} 項，未覆蓋 {}，超載機台週 {}，警告 {}",
            result.coverage.len(),
            result.total_uncovered(),
            result.overloaded().count(),
            result.warnings.len()
        );

        Ok(result)
    }

    /// 指派換算為 (物料, 週) 的計劃產出
    ///
    /// 指派有預估件數時直接採用，否則以模具速率 × 工時 × OEE 估算。
    /// 模具指派計入該模具的每一個物料。
    fn planned_production(
        &self,
        assignments: &[Assignment],
        snapshot: &Snapshot,
        result: &mut PlanEvaluation,
    ) -> WeeklyQuantities {
        let mut planned = WeeklyQuantities::new();

        for assignment in assignments {
            let machine = snapshot.machine(&assignment.machine_id);
            if machine.is_none() {
                result.add_warning(PlanWarning::warning(
                    assignment.machine_id.clone(),
                    WarningKind::UnknownReference,
                    format!("指派參照不存在的機台 {}", assignment.machine_id),
                ));
            }
            let oee = SizingCalculator::oee_for(machine, self.config.default_oee);

            match &assignment.target {
                AssignmentTarget::Mold(mold_id) => {
                    let Some(mold) = snapshot.mold(mold_id) else {
                        result.add_warning(PlanWarning::warning(
                            mold_id.clone(),
                            WarningKind::UnknownReference,
                            format!("指派參照不存在的模具 {mold_id}"),
                        ));
                        continue;
                    };
                    if machine.is_some() && !mold.is_compatible_with(&assignment.machine_id) {
                        result.add_warning(PlanWarning::warning(
                            mold_id.clone(),
                            WarningKind::IncompatibleMold,
                            format!(
                                "模具 {} 不相容於機台 {}（{}）",
                                mold_id, assignment.machine_id, assignment.week
                            ),
                        ));
                    }

                    let units = if assignment.produced_units_estimate > 0 {
                        assignment.produced_units_estimate
                    } else {
                        mold.estimate_units(assignment.hours, oee)
                    };
                    for piece_id in &mold.piece_ids {
                        BucketingCalculator::accumulate(&mut planned, piece_id, assignment.week, units);
                    }
                }
                AssignmentTarget::Piece(piece_id) => {
                    let units = if assignment.produced_units_estimate > 0 {
                        assignment.produced_units_estimate
                    } else {
                        let fastest = machine.and_then(|m| {
                            SizingCalculator::fastest(
                                piece_id,
                                &snapshot.molds,
                                std::slice::from_ref(m),
                                self.config.default_oee,
                            )
                        });
                        match fastest {
                            Some((mold, _, _)) => mold.estimate_units(assignment.hours, oee),
                            None => {
                                result.add_warning(PlanWarning::warning(
                                    piece_id.clone(),
                                    WarningKind::IncompatibleMold,
                                    format!(
                                        "機台 {} 沒有可生產物料 {} 的模具",
                                        assignment.machine_id, piece_id
                                    ),
                                ));
                                0
                            }
                        }
                    };
                    BucketingCalculator::accumulate(&mut planned, piece_id, assignment.week, units);
                }
            }
        }

        planned
    }
}
