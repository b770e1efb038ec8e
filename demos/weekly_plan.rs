//! # 射出廠週排程範例
//!
//! 流程：
//! - 載入設定（`fplan.toml` 與 `FPLAN__*` 環境變數，皆可省略）
//! - 建立機台、模具、物料
//! - 匯入需求 CSV
//! - 申報生產、品檢
//! - 排定週指派、套用建議服務的回應
//! - 評估需求覆蓋與機台負荷

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fplan::fplan_advisor::{PlanningAssistant, StaticAdvisor};
use fplan::fplan_core::{
    Assignment, AssignmentTarget, Client, Declaration, Downtime, DowntimeKind, Machine,
    MachineKind, Mold, OutcomeQuantities, Piece, Shift, WeekLabel,
};
use fplan::{logging, settings, Plant, PlanEvaluation};
use rust_decimal::Decimal;

const DEMAND_CSV: &str = "\
periodoYYYYWW,pieceId,qty,prioridad
202430,P1001,5000,1
202431,P1001,3000,2
202430,P2002,1200,2
202431,P2002,800,3
202432,P3003,600,3
";

const ADVISOR_RESPONSE: &str = r#"Plan sugerido:
```json
{"assignments": [
  {"machine_id": "INY-01", "week": "202431", "mold_id": "M-100", "hours": 16},
  {"machine_id": "INY-02", "week": "202431", "mold_id": "M-200", "hours": 24}
]}
```"#;

fn main() -> Result<()> {
    logging::init();

    println!("===== 射出廠週排程範例 =====\n");

    // ========== 1. 設定 ==========
    println!("[1] 載入設定");
    let settings = settings::load()?;
    let plant = Plant::from_settings(&settings);
    println!(
        "    OEE {}，剩餘結轉 {}，超載容忍 {}\n",
        plant.config().default_oee,
        plant.config().carry_over_surplus,
        plant.config().overload_tolerance
    );

    // ========== 2. 主檔 ==========
    println!("[2] 建立主檔");
    create_catalog(&plant)?;
    plant.add_downtime(
        Downtime::for_machine(
            "INY-02".to_string(),
            date(2024, 7, 24),
            date(2024, 7, 24),
            DowntimeKind::Maintenance,
        )
        .with_reason("cambio de husillo".to_string()),
    );
    println!("    機台 2 台，模具 2 套，物料 3 項；INY-02 週三保養\n");

    // ========== 3. 需求 ==========
    println!("[3] 匯入需求");
    let report = match &settings.demand_csv {
        Some(path) => plant
            .import_demand_file(path)
            .with_context(|| format!("匯入 {}", path.display()))?,
        None => plant.import_demand(DEMAND_CSV.as_bytes())?,
    };
    println!(
        "    新增 {}，更新 {}，錯誤 {}\n",
        report.inserted,
        report.updated,
        report.errors.len()
    );

    // ========== 4. 生產與品檢 ==========
    println!("[4] 生產申報");
    plant.declare_production(Declaration::new(
        "INY-01".to_string(),
        Shift::Morning,
        date(2024, 7, 15),
        "P1001".to_string(),
        OutcomeQuantities::good(1800),
    ))?;
    let record = plant.declare_production(Declaration::new(
        "INY-01".to_string(),
        Shift::Afternoon,
        date(2024, 7, 15),
        "P1001".to_string(),
        OutcomeQuantities {
            good: 400,
            quarantined: 120,
            ..OutcomeQuantities::default()
        },
    ))?;
    let outcome = plant.inspect(record.id, 100, 20)?;
    println!(
        "    品檢 {}：允收 {}，不良 {}，完成 {}\n",
        outcome.production_id, outcome.accepted, outcome.scrap, outcome.fully_inspected
    );

    // ========== 5. 週指派 ==========
    println!("[5] 週指派");
    let from = WeekLabel::parse("202430")?;
    let to = WeekLabel::parse("202432")?;

    for (machine_id, mold_id, hours) in [("INY-01", "M-100", 20), ("INY-02", "M-200", 32)] {
        let saved = plant.save_assignment(Assignment::new(
            machine_id.to_string(),
            from,
            AssignmentTarget::Mold(mold_id.to_string()),
            Decimal::from(hours),
        ))?;
        println!("    {} {} {} 小時 → {}", machine_id, mold_id, hours, saved.id);
    }
    println!();

    // ========== 6. 第一次評估 ==========
    println!("[6] 評估 {}..{}", from, to);
    let evaluation = plant.evaluate(from, to)?;
    print_evaluation(&evaluation);

    // ========== 7. 建議服務 ==========
    println!("[7] 排程建議");
    let assistant = PlanningAssistant::new(StaticAdvisor::new().with_response(ADVISOR_RESPONSE));
    let request = plant.advisor_request(from, to)?;
    let parsed = assistant.generate(&request)?;
    let applied = plant.apply_suggestions(&parsed);
    println!(
        "    建議 {} 筆：寫入 {}，拒絕 {}",
        parsed.assignments.len(),
        applied.saved.len(),
        applied.rejected.len()
    );
    for rejected in &applied.rejected {
        println!("    ✗ {} {}：{}", rejected.suggestion.machine_id, rejected.suggestion.week, rejected.reason);
    }
    println!();

    // ========== 8. 增量重算 ==========
    println!("[8] 增量重算");
    let refreshed = plant.evaluate_dirty(from, to)?;
    print_evaluation(&refreshed);

    // ========== 9. 對帳 ==========
    println!("[9] 預估與申報對帳");
    for row in plant.reconcile(from.previous(), to)? {
        println!(
            "    {} {}：預估 {}，申報 {}，達成率 {:?}",
            row.machine_id, row.week, row.estimated_units, row.declared_good, row.attainment
        );
    }

    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn create_catalog(plant: &Plant) -> Result<()> {
    plant.register_machine(
        Machine::new("INY-01".to_string(), MachineKind::Injection, 10, Decimal::from(8))
            .with_tonnage(250),
    )?;
    plant.register_machine(
        Machine::new("INY-02".to_string(), MachineKind::Injection, 15, Decimal::from(8))
            .with_tonnage(350)
            .with_historical_oee(Decimal::new(78, 2)),
    )?;

    plant.register_mold(
        Mold::new("M-100".to_string(), 4, Decimal::from(45))
            .with_pieces(vec!["P1001".to_string()])
            .with_compatible_machines(vec!["INY-01".to_string(), "INY-02".to_string()]),
    )?;
    plant.register_mold(
        Mold::new("M-200".to_string(), 2, Decimal::from(60))
            .with_pieces(vec!["P2002".to_string(), "P3003".to_string()])
            .with_compatible_machines(vec!["INY-02".to_string()]),
    )?;

    plant.register_client(Client {
        id: "CLI-01".to_string(),
        name: "Autopartes Norte".to_string(),
    })?;

    plant.create_piece(
        Piece::new("P1001".to_string(), "CLI-01".to_string())
            .with_name("Carcasa frontal".to_string())
            .with_stock_limits(1000, 15000),
    )?;
    plant.create_piece(
        Piece::new("P2002".to_string(), "CLI-01".to_string())
            .with_name("Soporte".to_string())
            .with_subprocesses(true, false, false),
    )?;
    plant.create_piece(
        Piece::new("P3003".to_string(), "CLI-01".to_string()).with_name("Tapa".to_string()),
    )?;
    Ok(())
}

fn print_evaluation(evaluation: &PlanEvaluation) {
    for piece in &evaluation.coverage {
        println!(
            "    {}（期初 {}，狀態 {:?}）",
            piece.piece_id, piece.initial_stock, piece.stock_status
        );
        for row in &piece.rows {
            println!(
                "      {}: 需求 {:>6}  庫存 {:>6}  產出 {:>6}  缺口 {:>6}",
                row.week, row.demand, row.stock_covered, row.production_covered, row.uncovered
            );
        }
    }

    for load in evaluation.loads.iter().filter(|l| l.allocated > Decimal::ZERO) {
        println!(
            "    負荷 {} {}：{} / {} 小時{}",
            load.machine_id,
            load.week,
            load.allocated,
            load.available,
            if load.overloaded { "  ⚠ 超載" } else { "" }
        );
    }

    for suggestion in &evaluation.suggestions {
        println!(
            "    建議 {} {}：{} + {} 共 {} 小時（約 {} 件）",
            suggestion.piece_id,
            suggestion.week,
            suggestion.machine_id,
            suggestion.mold_id,
            suggestion.hours,
            suggestion.estimated_units
        );
    }

    for warning in &evaluation.warnings {
        println!("    [{:?}] {}", warning.severity, warning.message);
    }
    println!();
}
