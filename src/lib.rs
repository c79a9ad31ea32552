pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliArgs;
pub use crate::config::{EngineConfig, ProjectFile};

pub use crate::adapters::bracket_table::BracketTable;
pub use crate::adapters::http_resolver::HttpBracketResolver;
pub use crate::adapters::settings::{HttpSettingsSource, StaticSettings};
pub use crate::core::ledger::CostLedger;
pub use crate::core::session::{EditorState, ProjectSession, Recompute};
pub use crate::core::snapshot::{revenue_from_courses, FinancialSnapshotAssembler, SnapshotInputs};
pub use crate::core::solver::{ProfitabilitySolver, MAX_ITERATIONS};
pub use crate::core::surcharge::{load_rates, SurchargeCalculator};
pub use crate::domain::model::*;
pub use crate::domain::ports::{CommissionBracketResolver, SettingsSource};
pub use crate::utils::error::{EngineError, Result};
