//! 工廠門面
//!
//! 把主檔、週排程、庫存、生產申報、需求簿與出貨流水號接在一起，
//! 每個寫入操作同時標記受影響的物料，供增量重算使用。
//!
//! 單一操作若寫入兩個帳本（例如申報後更新庫存），第二次寫入失敗時以
//! [`PlanError::Store`] 回報，已寫入的第一筆不回滾。

use chrono::NaiveDate;
use fplan_advisor::{ParsedPlan, PlanRequest, RunParameters, SuggestedAssignment};
use fplan_calc::{
    EstimateReconciliation, PlanEvaluation, PlanEvaluator, ReconcileCalculator, SizingCalculator,
};
use fplan_core::{
    Assignment, AssignmentRepository, AssignmentTarget, CatalogRepository, Client, Declaration,
    Demand, DemandKey, DemandRepository, Downtime, InspectionOutcome, InventoryRepository,
    Machine, Mold, OutcomeQuantities, Piece, PlanError, PlanningConfig, ProductionRecord,
    ProductionRepository, Result, Shipment, ShipmentKind, StockRecord, StockStage, Supplier,
    WeekLabel, WorkCalendar,
};
use fplan_ledger::{
    AssignmentLedger, AssignmentValidator, DemandBook, DemandCsvImporter, DirtyTracker,
    ImportReport, InMemoryCatalog, InventoryLedger, ProductionLog, ShipmentCounter,
    ValidationIssue,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;

use crate::settings::Settings;

/// 已寫入的指派
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedAssignment {
    pub id: Uuid,

    /// 不阻擋寫入的問題（例如期間重疊）
    pub warnings: Vec<ValidationIssue>,
}

/// 被拒絕的建議
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedSuggestion {
    pub suggestion: SuggestedAssignment,
    pub reason: String,
}

/// 套用建議的結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestionReport {
    pub saved: Vec<SavedAssignment>,
    pub rejected: Vec<RejectedSuggestion>,
}

/// 工廠
pub struct Plant {
    catalog: InMemoryCatalog,
    assignments: AssignmentLedger,
    inventory: InventoryLedger,
    production: ProductionLog,
    demands: DemandBook,
    shipments: ShipmentCounter,
    dirty: DirtyTracker,
    calendar: RwLock<WorkCalendar>,
    config: PlanningConfig,
}

impl Plant {
    /// 以已通過 `PlanningConfig::validate` 的參數建立
    pub fn new(config: PlanningConfig, calendar: WorkCalendar) -> Self {
        Self {
            catalog: InMemoryCatalog::new(),
            assignments: AssignmentLedger::new(),
            inventory: InventoryLedger::new(),
            production: ProductionLog::new(),
            demands: DemandBook::new(),
            shipments: ShipmentCounter::new(config.shipment_start_number),
            dirty: DirtyTracker::new(),
            calendar: RwLock::new(calendar),
            config,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.planning.clone(), settings.calendar.to_calendar())
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn assignments(&self) -> &AssignmentLedger {
        &self.assignments
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    pub fn production(&self) -> &ProductionLog {
        &self.production
    }

    pub fn demands(&self) -> &DemandBook {
        &self.demands
    }

    pub fn shipments(&self) -> &ShipmentCounter {
        &self.shipments
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// 目前日曆的複本
    pub fn calendar(&self) -> WorkCalendar {
        self.calendar.read().clone()
    }

    // ---- 主檔 ----

    pub fn register_machine(&self, machine: Machine) -> Result<()> {
        self.catalog.upsert_machine(machine)
    }

    /// 登錄模具；模具可生產的物料都需重算
    pub fn register_mold(&self, mold: Mold) -> Result<()> {
        let piece_ids = mold.piece_ids.clone();
        self.catalog.upsert_mold(mold)?;
        for piece_id in &piece_ids {
            self.dirty.mark_piece(piece_id);
        }
        Ok(())
    }

    pub fn register_client(&self, client: Client) -> Result<()> {
        self.catalog.upsert_client(client)
    }

    pub fn register_supplier(&self, supplier: Supplier) -> Result<()> {
        self.catalog.upsert_supplier(supplier)
    }

    /// 建立物料並將庫存歸零
    pub fn create_piece(&self, piece: Piece) -> Result<StockRecord> {
        if self.catalog.contains_piece(&piece.id) {
            return Err(PlanError::Validation(format!("物料 {} 已存在", piece.id)));
        }

        let piece_id = piece.id.clone();
        self.catalog.upsert_piece(piece)?;
        let record = self.inventory.init_piece(&piece_id)?;
        self.dirty.mark_piece(&piece_id);

        tracing::info!("建立物料 {}", piece_id);
        Ok(record)
    }

    /// 修改既有物料的主檔（庫存不變）
    pub fn update_piece(&self, piece: Piece) -> Result<()> {
        self.catalog.piece(&piece.id)?;
        let piece_id = piece.id.clone();
        self.catalog.upsert_piece(piece)?;
        self.dirty.mark_piece(&piece_id);
        Ok(())
    }

    pub fn add_holiday(&self, date: NaiveDate) {
        self.calendar.write().add_holiday(date);
        tracing::debug!("新增假日 {}", date);
    }

    pub fn add_downtime(&self, downtime: Downtime) {
        tracing::debug!(
            "新增停機 {:?} {}..{} ({:?})",
            downtime.machine_id,
            downtime.start,
            downtime.end,
            downtime.kind
        );
        self.calendar.write().add_downtime(downtime);
    }

    // ---- 生產與品檢 ----

    /// 生產申報
    ///
    /// 同一 (機台, 班別, 日期) 的申報累加到同一筆記錄；庫存只套用本次申報的數量。
    pub fn declare_production(&self, declaration: Declaration) -> Result<ProductionRecord> {
        let piece = self.catalog.piece(&declaration.piece_id)?;
        self.catalog.machine(&declaration.machine_id)?;

        let quantities = declaration.quantities;
        let machine_id = declaration.machine_id.clone();
        let week = WeekLabel::from_date(declaration.date);

        let record = self.production.declare(declaration)?;

        let deltas = declaration_deltas(&piece, &quantities);
        if !deltas.is_empty() {
            self.inventory
                .apply_deltas(&piece.id, &deltas)
                .map_err(|e| {
                    PlanError::Store(format!("生產記錄 {} 已寫入，庫存更新失敗: {e}", record.id))
                })?;
        }

        self.dirty.mark_piece(&piece.id);
        self.dirty.mark_machine_week(&machine_id, week);

        tracing::info!(
            "申報 {} {:?} {}：物料 {} 良品 {}，隔離 {}（累計第 {} 次）",
            record.machine_id,
            record.shift,
            record.date,
            record.piece_id,
            quantities.good,
            quantities.quarantined,
            record.declaration_count
        );
        Ok(record)
    }

    /// 品檢：允收量從待檢轉入物料的進庫階段，不良量直接扣除
    pub fn inspect(&self, production_id: Uuid, accepted: i64, scrap: i64) -> Result<InspectionOutcome> {
        let record = self.production.get(production_id)?;
        let entry_stage = self.catalog.piece(&record.piece_id)?.entry_stage();

        let outcome = self.production.inspect(production_id, accepted, scrap)?;

        let deltas: Vec<(StockStage, i64)> = [
            (StockStage::PendingQuality, -(accepted + scrap)),
            (entry_stage, accepted),
        ]
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .collect();

        self.inventory
            .apply_deltas(&outcome.piece_id, &deltas)
            .map_err(|e| {
                PlanError::Store(format!("品檢 {} 已寫入，庫存更新失敗: {e}", production_id))
            })?;
        self.dirty.mark_piece(&outcome.piece_id);

        tracing::info!(
            "品檢 {}：允收 {}，不良 {}，剩餘隔離 {}",
            production_id,
            accepted,
            scrap,
            outcome.remaining_quarantined
        );
        Ok(outcome)
    }

    pub fn pending_inspection(&self) -> Result<Vec<ProductionRecord>> {
        self.production.pending_inspection()
    }

    /// 廠內階段轉移（噴砂、加工、組裝等）
    pub fn transfer(
        &self,
        piece_id: &str,
        from: StockStage,
        to: StockStage,
        quantity: i64,
    ) -> Result<StockRecord> {
        if quantity <= 0 {
            return Err(PlanError::Validation(format!("轉移數量必須大於零：{quantity}")));
        }
        if from == to {
            return Err(PlanError::Validation(format!("來源與目標階段相同：{from}")));
        }

        self.ensure_available(piece_id, from, quantity)?;
        let record = self
            .inventory
            .apply_deltas(piece_id, &[(from, -quantity), (to, quantity)])?;
        self.dirty.mark_piece(piece_id);

        tracing::debug!("物料 {} 由 {} 轉 {}：{}", piece_id, from, to, quantity);
        Ok(record)
    }

    // ---- 出貨 ----

    /// 開立出貨單
    ///
    /// 所有明細先對來源階段檢查庫存，全部足夠才取號並扣帳。
    pub fn dispatch_shipment(&self, shipment: Shipment) -> Result<Shipment> {
        shipment.validate()?;
        match shipment.kind {
            ShipmentKind::CustomerDelivery => {
                self.catalog.client(&shipment.counterparty_id)?;
            }
            ShipmentKind::ExternalMachining | ShipmentKind::ExternalMachiningReturn => {
                self.catalog.supplier(&shipment.counterparty_id)?;
            }
        }

        let source = shipment.kind.source_stage();
        let target = shipment.kind.target_stage();
        let totals = shipment.quantities_by_piece();

        for (piece_id, quantity) in &totals {
            self.ensure_available(piece_id, source, *quantity)?;
        }

        let issued = self.shipments.issue(shipment)?;
        let number = issued.number.unwrap_or_default();

        for (piece_id, quantity) in totals {
            let mut deltas = vec![(source, -quantity)];
            if let Some(target) = target {
                deltas.push((target, quantity));
            }
            self.inventory
                .apply_deltas(&piece_id, &deltas)
                .map_err(|e| {
                    PlanError::Store(format!("出貨單 #{number} 已開立，物料 {piece_id} 扣帳失敗: {e}"))
                })?;
            self.dirty.mark_piece(&piece_id);
        }

        Ok(issued)
    }

    fn ensure_available(&self, piece_id: &str, stage: StockStage, requested: i64) -> Result<()> {
        let available = self.inventory.available(piece_id, stage)?;
        if available < requested {
            return Err(PlanError::InsufficientStock {
                piece_id: piece_id.to_string(),
                stage,
                requested,
                available,
            });
        }
        Ok(())
    }

    // ---- 需求 ----

    /// 匯入需求 CSV
    pub fn import_demand<R: Read>(&self, reader: R) -> Result<ImportReport> {
        let (demands, errors) = DemandCsvImporter::new().parse(reader)?;
        let pieces: BTreeSet<String> = demands.iter().map(|d| d.piece_id.clone()).collect();

        let summary = self.demands.merge(demands)?;
        for piece_id in &pieces {
            self.dirty.mark_piece(piece_id);
        }

        let report = ImportReport::from_parts(summary, errors);
        tracing::info!(
            "需求匯入：新增 {}，更新 {}，凍結略過 {}，錯誤 {}",
            report.inserted,
            report.updated,
            report.skipped_frozen.len(),
            report.errors.len()
        );
        Ok(report)
    }

    pub fn import_demand_file(&self, path: &Path) -> Result<ImportReport> {
        let file = File::open(path)
            .map_err(|e| PlanError::Import(format!("無法開啟 {}: {e}", path.display())))?;
        self.import_demand(file)
    }

    /// 直接合併需求列（凍結規則同匯入）
    pub fn merge_demand(&self, demands: Vec<Demand>) -> Result<ImportReport> {
        let pieces: BTreeSet<String> = demands.iter().map(|d| d.piece_id.clone()).collect();
        let summary = self.demands.merge(demands)?;
        for piece_id in &pieces {
            self.dirty.mark_piece(piece_id);
        }
        Ok(ImportReport::from_parts(summary, Vec::new()))
    }

    pub fn set_demand_frozen(&self, key: &DemandKey, frozen: bool) -> Result<Demand> {
        self.demands.set_frozen(key, frozen)
    }

    // ---- 週排程 ----

    /// 檢查後寫入指派
    ///
    /// 未帶預估件數時以模具速率估算後一併寫入。
    pub fn save_assignment(&self, mut assignment: Assignment) -> Result<SavedAssignment> {
        let warnings = AssignmentValidator::new(&self.catalog, &self.assignments).ensure(&assignment)?;
        for issue in &warnings {
            tracing::warn!(
                "指派 {} {} 有問題但仍寫入：{}",
                assignment.machine_id,
                assignment.week,
                issue
            );
        }

        let previous = assignment.id.and_then(|id| self.assignments.get(id));

        // 自動預估在工時、機台或目標變更後重算；手動輸入的件數保留
        let stale_auto = assignment.estimate_is_auto
            && previous.as_ref().is_some_and(|p| {
                p.produced_units_estimate == assignment.produced_units_estimate
                    && (p.hours != assignment.hours
                        || p.machine_id != assignment.machine_id
                        || p.target != assignment.target)
            });
        if assignment.produced_units_estimate == 0 || stale_auto {
            assignment.produced_units_estimate = self.estimate_units(&assignment);
            assignment.estimate_is_auto = true;
        } else if previous
            .as_ref()
            .is_some_and(|p| p.produced_units_estimate != assignment.produced_units_estimate)
        {
            assignment.estimate_is_auto = false;
        }

        let id = self.assignments.upsert_assignment(assignment.clone())?;

        if let Some(previous) = &previous {
            self.mark_assignment(previous);
        }
        self.mark_assignment(&assignment);

        Ok(SavedAssignment { id, warnings })
    }

    pub fn remove_assignment(&self, id: Uuid) -> Result<Assignment> {
        let removed = self.assignments.remove_assignment(id)?;
        self.mark_assignment(&removed);
        Ok(removed)
    }

    /// 逐筆寫入建議；被拒的建議附上原因
    pub fn apply_suggestions(&self, plan: &ParsedPlan) -> SuggestionReport {
        let mut report = SuggestionReport::default();

        for suggestion in &plan.assignments {
            match self.save_assignment(suggestion.to_assignment()) {
                Ok(saved) => report.saved.push(saved),
                Err(e) => {
                    tracing::warn!(
                        "建議 {} {} 未寫入：{}",
                        suggestion.machine_id,
                        suggestion.week,
                        e
                    );
                    report.rejected.push(RejectedSuggestion {
                        suggestion: suggestion.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "套用建議：寫入 {}，拒絕 {}",
            report.saved.len(),
            report.rejected.len()
        );
        report
    }

    fn estimate_units(&self, assignment: &Assignment) -> i64 {
        let machine = self.catalog.machine(&assignment.machine_id).ok();
        let oee = SizingCalculator::oee_for(machine.as_ref(), self.config.default_oee);

        match &assignment.target {
            AssignmentTarget::Mold(mold_id) => self
                .catalog
                .mold(mold_id)
                .map(|mold| mold.estimate_units(assignment.hours, oee))
                .unwrap_or(0),
            AssignmentTarget::Piece(piece_id) => {
                let Some(machine) = machine else {
                    return 0;
                };
                let molds = self.catalog.molds_for_piece(piece_id);
                SizingCalculator::fastest(
                    piece_id,
                    &molds,
                    std::slice::from_ref(&machine),
                    self.config.default_oee,
                )
                .map(|(mold, _, _)| mold.estimate_units(assignment.hours, oee))
                .unwrap_or(0)
            }
        }
    }

    fn mark_assignment(&self, assignment: &Assignment) {
        self.dirty
            .mark_machine_week(&assignment.machine_id, assignment.week);
        match &assignment.target {
            AssignmentTarget::Mold(mold_id) => {
                if let Ok(mold) = self.catalog.mold(mold_id) {
                    for piece_id in &mold.piece_ids {
                        self.dirty.mark_piece(piece_id);
                    }
                }
            }
            AssignmentTarget::Piece(piece_id) => self.dirty.mark_piece(piece_id),
        }
    }

    // ---- 評估與對帳 ----

    /// 完整評估 `from..=to`，成功後清除所有變更標記
    ///
    /// 評估失敗時標記保留，下次 `evaluate_dirty` 仍會重算。
    pub fn evaluate(&self, from: WeekLabel, to: WeekLabel) -> Result<PlanEvaluation> {
        let calendar = self.calendar.read();
        let evaluation = self.evaluator(&calendar).evaluate(from, to)?;
        self.dirty.clear();
        Ok(evaluation)
    }

    /// 只重算上次評估後有變更的物料
    pub fn evaluate_dirty(&self, from: WeekLabel, to: WeekLabel) -> Result<PlanEvaluation> {
        let pieces = self.dirty.take_pieces();
        tracing::debug!("增量重算 {} 個物料", pieces.len());

        let calendar = self.calendar.read();
        match self.evaluator(&calendar).evaluate_pieces(from, to, &pieces) {
            Ok(evaluation) => Ok(evaluation),
            Err(e) => {
                for piece_id in &pieces {
                    self.dirty.mark_piece(piece_id);
                }
                Err(e)
            }
        }
    }

    fn evaluator<'a>(&'a self, calendar: &'a WorkCalendar) -> PlanEvaluator<'a> {
        PlanEvaluator::new(
            &self.catalog,
            &self.assignments,
            &self.inventory,
            &self.demands,
            calendar,
            &self.config,
        )
    }

    /// 預估產出與申報良品對帳
    pub fn reconcile(&self, from: WeekLabel, to: WeekLabel) -> Result<Vec<EstimateReconciliation>> {
        let assignments = self.assignments.list_range(from, to)?;
        let records = self.production.list_between(from.monday(), to.sunday())?;
        Ok(ReconcileCalculator::reconcile(&assignments, &records))
    }

    /// 組裝排程建議請求（不良率取 `to` 週以前的全部申報）
    pub fn advisor_request(&self, from: WeekLabel, to: WeekLabel) -> Result<PlanRequest> {
        let demands = self.demands.list_range(from, to)?;
        let stock = self.inventory.list()?;
        let history = self.production.list_between(NaiveDate::MIN, to.sunday())?;

        let calendar = self.calendar.read();
        Ok(PlanRequest::new(&calendar, RunParameters::new(from, to, &self.config))
            .with_demand(&demands)
            .with_stock(&stock)
            .with_machines(&self.catalog.machines(), &self.catalog.molds())
            .with_scrap(&history))
    }
}

/// 申報數量對應的庫存增量
///
/// 良品進入物料的進庫階段，未壓件進入射出未壓，隔離進入待檢，不良不入庫。
fn declaration_deltas(piece: &Piece, quantities: &OutcomeQuantities) -> Vec<(StockStage, i64)> {
    [
        (piece.entry_stage(), quantities.good),
        (StockStage::InjectedUnpressed, quantities.unpressed),
        (StockStage::PendingQuality, quantities.quarantined),
    ]
    .into_iter()
    .filter(|(_, delta)| *delta != 0)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fplan_core::{MachineKind, Shift};
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn week(label: &str) -> WeekLabel {
        WeekLabel::parse(label).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn plant() -> Plant {
        crate::logging::init_test();
        let plant = Plant::new(PlanningConfig::default(), WorkCalendar::default());
        plant
            .register_machine(Machine::new(
                "INY-01".to_string(),
                MachineKind::Injection,
                10,
                Decimal::from(8),
            ))
            .unwrap();
        plant
            .register_mold(
                Mold::new("M-1".to_string(), 2, Decimal::from(36))
                    .with_pieces(vec!["P1".to_string()])
                    .with_compatible_machines(vec!["INY-01".to_string()]),
            )
            .unwrap();
        plant
            .register_client(Client {
                id: "CLI-01".to_string(),
                name: "Cliente".to_string(),
            })
            .unwrap();
        plant
            .create_piece(Piece::new("P1".to_string(), "CLI-01".to_string()))
            .unwrap();
        plant
            .create_piece(
                Piece::new("P2".to_string(), "CLI-01".to_string())
                    .with_subprocesses(true, false, false),
            )
            .unwrap();
        plant
    }

    fn declaration(piece: &str, quantities: OutcomeQuantities) -> Declaration {
        Declaration::new(
            "INY-01".to_string(),
            Shift::Morning,
            date(22),
            piece.to_string(),
            quantities,
        )
    }

    #[test]
    fn test_create_piece_twice_rejected() {
        let plant = plant();
        let err = plant
            .create_piece(Piece::new("P1".to_string(), "CLI-01".to_string()))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_declaration_routes_stock() {
        let plant = plant();
        plant
            .declare_production(declaration(
                "P1",
                OutcomeQuantities {
                    good: 100,
                    unpressed: 5,
                    scrap: 3,
                    quarantined: 10,
                    ..OutcomeQuantities::default()
                },
            ))
            .unwrap();

        let stock = plant.inventory().get("P1").unwrap();
        assert_eq!(stock.ready, 100);
        assert_eq!(stock.injected_unpressed, 5);
        assert_eq!(stock.pending_quality, 10);

        // 同班別改報另一物料
        let err = plant
            .declare_production(declaration("P2", OutcomeQuantities::good(40)))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(plant.inventory().get("P2").unwrap().injected_unpressed, 0);
    }

    #[test]
    fn test_declarations_accumulate() {
        let plant = plant();
        plant
            .declare_production(declaration("P1", OutcomeQuantities::good(100)))
            .unwrap();
        let record = plant
            .declare_production(declaration("P1", OutcomeQuantities::good(50)))
            .unwrap();

        assert_eq!(record.quantities.good, 150);
        assert_eq!(record.declaration_count, 2);
        assert_eq!(plant.inventory().get("P1").unwrap().ready, 150);
    }

    #[test]
    fn test_inspection_moves_stock() {
        let plant = plant();
        let record = plant
            .declare_production(declaration(
                "P2",
                OutcomeQuantities {
                    quarantined: 20,
                    ..OutcomeQuantities::default()
                },
            ))
            .unwrap();

        let outcome = plant.inspect(record.id, 12, 3).unwrap();
        assert_eq!(outcome.remaining_quarantined, 5);

        let stock = plant.inventory().get("P2").unwrap();
        assert_eq!(stock.pending_quality, 5);
        assert_eq!(stock.injected_unpressed, 12);

        let err = plant.inspect(record.id, 6, 0).unwrap_err();
        assert!(matches!(err, PlanError::QuarantineExceeded { .. }));
        assert_eq!(plant.inventory().get("P2").unwrap().pending_quality, 5);
    }

    #[test]
    fn test_transfer_prechecks() {
        let plant = plant();
        plant
            .declare_production(declaration("P2", OutcomeQuantities::good(30)))
            .unwrap();

        let err = plant
            .transfer("P2", StockStage::InjectedUnpressed, StockStage::ShotBlasted, 31)
            .unwrap_err();
        assert!(matches!(err, PlanError::InsufficientStock { available: 30, .. }));

        let record = plant
            .transfer("P2", StockStage::InjectedUnpressed, StockStage::ShotBlasted, 30)
            .unwrap();
        assert_eq!(record.injected_unpressed, 0);
        assert_eq!(record.shot_blasted, 30);
    }

    #[rstest]
    #[case(StockStage::Ready, StockStage::Assembled, 0)]
    #[case(StockStage::Ready, StockStage::Assembled, -5)]
    #[case(StockStage::Ready, StockStage::Ready, 1)]
    fn test_transfer_rejects_bad_input(
        #[case] from: StockStage,
        #[case] to: StockStage,
        #[case] quantity: i64,
    ) {
        let plant = plant();
        let err = plant.transfer("P1", from, to, quantity).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
    }

    #[test]
    fn test_shipment_checks_every_line_first() {
        let plant = plant();
        plant
            .declare_production(declaration("P1", OutcomeQuantities::good(50)))
            .unwrap();

        let too_much = Shipment::new(ShipmentKind::CustomerDelivery, "CLI-01".to_string(), date(26))
            .with_line("P1".to_string(), 30)
            .with_line("P1".to_string(), 30);
        assert!(matches!(
            plant.dispatch_shipment(too_much),
            Err(PlanError::InsufficientStock { requested: 60, .. })
        ));
        assert_eq!(plant.inventory().get("P1").unwrap().ready, 50);
        assert_eq!(plant.shipments().peek(), 1);

        let ok = Shipment::new(ShipmentKind::CustomerDelivery, "CLI-01".to_string(), date(26))
            .with_line("P1".to_string(), 20);
        let issued = plant.dispatch_shipment(ok).unwrap();
        assert_eq!(issued.number, Some(1));
        assert_eq!(plant.inventory().get("P1").unwrap().ready, 30);
    }

    #[test]
    fn test_shipment_unknown_supplier() {
        let plant = plant();
        let shipment = Shipment::new(ShipmentKind::ExternalMachining, "PROV-9".to_string(), date(26))
            .with_line("P2".to_string(), 1);
        assert!(matches!(
            plant.dispatch_shipment(shipment),
            Err(PlanError::NotFound { .. })
        ));
    }

    #[test]
    fn test_save_assignment_fills_estimate_and_marks_dirty() {
        let plant = plant();
        plant.dirty().clear();

        let saved = plant
            .save_assignment(Assignment::new(
                "INY-01".to_string(),
                week("202430"),
                AssignmentTarget::Mold("M-1".to_string()),
                Decimal::from(10),
            ))
            .unwrap();
        assert!(saved.warnings.is_empty());

        let stored = plant.assignments().get(saved.id).unwrap();
        // 2 穴 × 100 模/時 × 0.85 × 10 小時
        assert_eq!(stored.produced_units_estimate, 1700);
        assert!(plant.dirty().is_dirty("P1"));
        assert_eq!(
            plant.dirty().dirty_machine_weeks(),
            vec![("INY-01".to_string(), week("202430"))]
        );
    }

    #[test]
    fn test_save_assignment_rejects_incompatible() {
        let plant = plant();
        plant
            .register_machine(Machine::new(
                "INY-02".to_string(),
                MachineKind::Injection,
                10,
                Decimal::from(8),
            ))
            .unwrap();

        let err = plant
            .save_assignment(Assignment::new(
                "INY-02".to_string(),
                week("202430"),
                AssignmentTarget::Mold("M-1".to_string()),
                Decimal::from(10),
            ))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(plant.assignments().is_empty());
    }

    #[test]
    fn test_evaluate_dirty_only_changed_pieces() {
        let plant = plant();
        plant
            .merge_demand(vec![
                Demand::new(week("202430"), "P1".to_string(), 100),
                Demand::new(week("202430"), "P2".to_string(), 100),
            ])
            .unwrap();

        let full = plant.evaluate(week("202430"), week("202431")).unwrap();
        assert_eq!(full.coverage.len(), 2);
        assert!(!plant.dirty().has_changes());

        plant
            .declare_production(declaration("P1", OutcomeQuantities::good(60)))
            .unwrap();
        let partial = plant.evaluate_dirty(week("202430"), week("202431")).unwrap();
        assert_eq!(partial.coverage.len(), 1);
        assert_eq!(partial.coverage[0].piece_id, "P1");
        assert_eq!(partial.coverage[0].total_uncovered(), 40);

        let nothing = plant.evaluate_dirty(week("202430"), week("202431")).unwrap();
        assert!(nothing.coverage.is_empty());
    }

    #[test]
    fn test_failed_evaluation_keeps_dirty_marks() {
        let plant = plant();
        plant
            .merge_demand(vec![Demand::new(week("202430"), "P1".to_string(), 100)])
            .unwrap();
        plant.evaluate(week("202430"), week("202431")).unwrap();
        plant
            .declare_production(declaration("P1", OutcomeQuantities::good(60)))
            .unwrap();

        // 期間顛倒
        let err = plant.evaluate(week("202431"), week("202430")).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
        assert!(plant.dirty().is_dirty("P1"));

        let err = plant.evaluate_dirty(week("202431"), week("202430")).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
        assert!(plant.dirty().is_dirty("P1"));

        let partial = plant.evaluate_dirty(week("202430"), week("202431")).unwrap();
        assert_eq!(partial.coverage.len(), 1);
        assert_eq!(partial.coverage[0].piece_id, "P1");
        assert_eq!(partial.coverage[0].total_uncovered(), 40);
    }

    #[test]
    fn test_edited_hours_refresh_auto_estimate() {
        let plant = plant();
        plant
            .merge_demand(vec![Demand::new(week("202430"), "P1".to_string(), 5000)])
            .unwrap();
        let saved = plant
            .save_assignment(Assignment::new(
                "INY-01".to_string(),
                week("202430"),
                AssignmentTarget::Mold("M-1".to_string()),
                Decimal::from(10),
            ))
            .unwrap();

        let mut edited = plant.assignments().get(saved.id).unwrap();
        assert_eq!(edited.produced_units_estimate, 1700);
        assert!(edited.estimate_is_auto);
        edited.hours = Decimal::from(20);
        plant.save_assignment(edited).unwrap();

        let stored = plant.assignments().get(saved.id).unwrap();
        assert_eq!(stored.produced_units_estimate, 3400);
        let evaluation = plant.evaluate(week("202430"), week("202430")).unwrap();
        assert_eq!(evaluation.piece("P1").unwrap().total_uncovered(), 1600);
    }

    #[test]
    fn test_manual_estimate_survives_edit() {
        let plant = plant();
        let saved = plant
            .save_assignment(
                Assignment::new(
                    "INY-01".to_string(),
                    week("202430"),
                    AssignmentTarget::Mold("M-1".to_string()),
                    Decimal::from(10),
                )
                .with_estimate(1500),
            )
            .unwrap();

        let mut edited = plant.assignments().get(saved.id).unwrap();
        edited.hours = Decimal::from(12);
        plant.save_assignment(edited).unwrap();
        assert_eq!(
            plant.assignments().get(saved.id).unwrap().produced_units_estimate,
            1500
        );

        // 自動預估但同時改了件數：以輸入為準
        let auto = plant
            .save_assignment(Assignment::new(
                "INY-01".to_string(),
                week("202431"),
                AssignmentTarget::Mold("M-1".to_string()),
                Decimal::from(10),
            ))
            .unwrap();
        let mut edited = plant.assignments().get(auto.id).unwrap();
        edited.hours = Decimal::from(20);
        edited.produced_units_estimate = 2000;
        plant.save_assignment(edited).unwrap();
        let stored = plant.assignments().get(auto.id).unwrap();
        assert_eq!(stored.produced_units_estimate, 2000);
        assert!(!stored.estimate_is_auto);

        // 之後再改工時也不覆蓋手動件數
        let mut edited = stored;
        edited.hours = Decimal::from(30);
        plant.save_assignment(edited).unwrap();
        assert_eq!(
            plant.assignments().get(auto.id).unwrap().produced_units_estimate,
            2000
        );
    }

    #[test]
    fn test_declaration_deltas_skip_zero() {
        let piece = Piece::new("P1".to_string(), "CLI-01".to_string());
        let deltas = declaration_deltas(
            &piece,
            &OutcomeQuantities {
                scrap: 5,
                startup_scrap: 2,
                ..OutcomeQuantities::default()
            },
        );
        assert!(deltas.is_empty());
    }
}
