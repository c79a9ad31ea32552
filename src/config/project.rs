use crate::config::toml_config::substitute_env_vars;
use crate::core::ledger::CostLedger;
use crate::core::snapshot::revenue_from_courses;
use crate::domain::model::{CostLine, CourseLine, RoleId};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative, validate_percentage, Validate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一個專案報價的描述檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub project: ProjectInfo,
    #[serde(default)]
    pub courses: Vec<CourseLine>,
    #[serde(default)]
    pub costs: Vec<CostLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub role_id: Option<RoleId>,
    pub manual_commission_percent: Option<Decimal>,
    /// Overrides the revenue derived from `courses`.
    pub revenue: Option<Decimal>,
}

impl ProjectFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(&substitute_env_vars(content)).map_err(|e| {
            EngineError::ConfigValidationError {
                field: "project".to_string(),
                message: format!("TOML parsing error: {}", e),
            }
        })
    }

    pub fn revenue(&self) -> Decimal {
        self.project
            .revenue
            .unwrap_or_else(|| revenue_from_courses(&self.courses))
    }

    pub fn ledger(&self) -> CostLedger {
        CostLedger::from_lines(self.costs.iter().cloned())
    }
}

impl Validate for ProjectFile {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("project.name", &self.project.name)?;

        if let Some(revenue) = self.project.revenue {
            validate_non_negative("project.revenue", revenue)?;
        }
        if let Some(pct) = self.project.manual_commission_percent {
            validate_percentage("project.manual_commission_percent", pct)?;
        }

        for course in &self.courses {
            validate_non_negative(&format!("courses.{}.unit_price", course.course), course.unit_price)?;
        }

        for cost in &self.costs {
            validate_non_negative(&format!("costs.{}.amount", cost.id), cost.amount)?;
        }

        let mut ids: Vec<_> = self.costs.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(EngineError::ValidationError {
                message: format!("duplicate cost line id {}", pair[0]),
            });
        }

        Ok(())
    }
}
