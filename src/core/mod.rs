pub mod ledger;
pub mod money;
pub mod session;
pub mod snapshot;
pub mod solver;
pub mod surcharge;

pub use crate::domain::model::{
    CommissionBracket, CommissionSource, CostCategory, CostLine, CostLineId, CourseLine,
    FinancialSnapshot, LedgerAggregates, RoleId, SettingKey, SurchargeRates, Surcharges, UserRef,
};
pub use crate::domain::ports::{CommissionBracketResolver, SettingsSource};
pub use crate::utils::error::Result;
