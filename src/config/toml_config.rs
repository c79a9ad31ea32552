use crate::adapters::bracket_table::BracketTable;
use crate::adapters::http_resolver::HttpBracketResolver;
use crate::adapters::settings::{HttpSettingsSource, StaticSettings};
use crate::domain::model::{CommissionBracket, SettingKey};
use crate::domain::ports::{CommissionBracketResolver, SettingsSource};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{
    validate_non_negative, validate_percentage, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    Http,
    Table,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub r#type: ResolverKind,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub brackets: Vec<CommissionBracket>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub values: SettingValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingValues {
    pub vat_rate: Option<Decimal>,
    pub withholding_rate: Option<Decimal>,
    pub ppm_rate: Option<Decimal>,
    pub admin_expense_flat: Option<Decimal>,
    pub cash_reserve_rate: Option<Decimal>,
}

impl SettingValues {
    pub fn get(&self, key: SettingKey) -> Option<Decimal> {
        match key {
            SettingKey::VatRate => self.vat_rate,
            SettingKey::WithholdingRate => self.withholding_rate,
            SettingKey::PpmRate => self.ppm_rate,
            SettingKey::AdminExpenseFlat => self.admin_expense_flat,
            SettingKey::CashReserveRate => self.cash_reserve_rate,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    pub resolve_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl EngineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EngineError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.solver.resolve_timeout_ms.map(Duration::from_millis)
    }

    /// 依 `[resolver]` 建立佣金級距查詢器
    pub fn build_resolver(&self) -> Result<Box<dyn CommissionBracketResolver>> {
        match self.resolver.r#type {
            ResolverKind::Http => {
                let endpoint =
                    validate_required_field("resolver.endpoint", &self.resolver.endpoint)?;
                let mut resolver = HttpBracketResolver::new(endpoint.clone())
                    .with_headers(self.resolver.headers.clone().unwrap_or_default());
                if let Some(secs) = self.resolver.timeout_seconds {
                    resolver = resolver.with_timeout(Duration::from_secs(secs));
                }
                Ok(Box::new(resolver))
            }
            ResolverKind::Table => Ok(Box::new(BracketTable::new(self.resolver.brackets.clone()))),
        }
    }

    /// 有 `settings.endpoint` 時走 HTTP，否則使用 `[settings.values]`
    pub fn build_settings_source(&self) -> Box<dyn SettingsSource> {
        match &self.settings.endpoint {
            Some(endpoint) => {
                let mut source = HttpSettingsSource::new(endpoint.clone())
                    .with_headers(self.settings.headers.clone().unwrap_or_default());
                if let Some(secs) = self.settings.timeout_seconds {
                    source = source.with_timeout(Duration::from_secs(secs));
                }
                Box::new(source)
            }
            None => {
                let values = SettingKey::ALL
                    .iter()
                    .filter_map(|key| self.settings.values.get(*key).map(|v| (*key, v)))
                    .collect();
                Box::new(StaticSettings::new(values))
            }
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        match self.resolver.r#type {
            ResolverKind::Http => {
                let endpoint =
                    validate_required_field("resolver.endpoint", &self.resolver.endpoint)?;
                validate_url("resolver.endpoint", endpoint)?;
            }
            ResolverKind::Table => {
                if self.resolver.brackets.is_empty() {
                    tracing::warn!("Bracket table is empty, every commission will resolve to 0%");
                }
            }
        }

        for (i, bracket) in self.resolver.brackets.iter().enumerate() {
            let field = format!("resolver.brackets[{}]", i);
            validate_percentage(&format!("{}.commission_percent", field), bracket.commission_percent)?;
            if bracket.margin_low > bracket.margin_high {
                return Err(EngineError::InvalidConfigValueError {
                    field,
                    value: format!("{}..{}", bracket.margin_low, bracket.margin_high),
                    reason: "margin_low must not exceed margin_high".to_string(),
                });
            }
        }

        if let Some(endpoint) = &self.settings.endpoint {
            validate_url("settings.endpoint", endpoint)?;
        }

        for key in SettingKey::ALL {
            if let Some(value) = self.settings.values.get(key) {
                let field = format!("settings.values.{}", key);
                match key {
                    SettingKey::AdminExpenseFlat => validate_non_negative(&field, value)?,
                    _ => validate_percentage(&field, value)?,
                }
            }
        }

        Ok(())
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// 替換環境變數 (例如 ${API_TOKEN})，未設定的保留原樣
pub(crate) fn substitute_env_vars(content: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}
