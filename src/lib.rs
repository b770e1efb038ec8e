//! # fplan
//!
//! 射出工廠週產能排程核心：主檔、週排程、庫存、生產申報、品檢、需求與出貨，
//! 以及逐週需求覆蓋評估。
//!
//! ## 使用範例
//!
//! ```
//! use fplan::{Plant, PlanningConfig, WeekLabel, WorkCalendar};
//!
//! let plant = Plant::new(PlanningConfig::default(), WorkCalendar::default());
//! let report = plant
//!     .import_demand("periodoYYYYWW,pieceId,qty,prioridad\n202430,P1001,5000,1\n".as_bytes())
//!     .unwrap();
//! assert_eq!(report.inserted, 1);
//!
//! let week = WeekLabel::parse("202430").unwrap();
//! let evaluation = plant.evaluate(week, week).unwrap();
//! assert_eq!(evaluation.total_uncovered(), 5000);
//! ```

pub mod logging;
pub mod plant;
pub mod settings;

pub use fplan_advisor;
pub use fplan_calc;
pub use fplan_core;
pub use fplan_ledger;

// Re-export 主要類型
pub use fplan_calc::{PlanEvaluation, PlanWarning};
pub use fplan_core::{PlanError, PlanningConfig, WeekLabel, WorkCalendar};
pub use plant::{Plant, RejectedSuggestion, SavedAssignment, SuggestionReport};
pub use settings::Settings;
