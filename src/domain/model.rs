use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type CostLineId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRef(pub String);

/// 成本項目的稅務分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    /// 適用增值稅 (IVA)
    Taxed,
    /// 適用扣繳 (honorarios)
    Withholding,
    /// 不加稅也不扣繳
    Net,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLine {
    pub id: CostLineId,
    pub concept: String,
    pub amount: Decimal,
    #[serde(default)]
    pub applies_vat: bool,
    #[serde(default)]
    pub applies_withholding: bool,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub approved_by: Option<UserRef>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl CostLine {
    pub fn new(id: CostLineId, concept: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id,
            concept: concept.into(),
            amount,
            applies_vat: false,
            applies_withholding: false,
            approved: false,
            approved_by: None,
            approved_at: None,
        }
    }

    pub fn with_vat(mut self) -> Self {
        self.applies_vat = true;
        self.applies_withholding = false;
        self
    }

    pub fn with_withholding(mut self) -> Self {
        self.applies_withholding = true;
        self.applies_vat = false;
        self
    }

    pub fn category(&self) -> CostCategory {
        if self.applies_withholding {
            CostCategory::Withholding
        } else if self.applies_vat {
            CostCategory::Taxed
        } else {
            CostCategory::Net
        }
    }
}

/// 課程明細，用來推導專案收入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseLine {
    pub course: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBracket {
    pub margin_low: Decimal,
    pub margin_high: Decimal,
    pub role_id: RoleId,
    pub commission_percent: Decimal,
}

impl CommissionBracket {
    pub fn contains(&self, margin_percent: Decimal, role_id: &RoleId) -> bool {
        &self.role_id == role_id
            && margin_percent >= self.margin_low
            && margin_percent <= self.margin_high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    VatRate,
    WithholdingRate,
    PpmRate,
    AdminExpenseFlat,
    CashReserveRate,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::VatRate,
        SettingKey::WithholdingRate,
        SettingKey::PpmRate,
        SettingKey::AdminExpenseFlat,
        SettingKey::CashReserveRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::VatRate => "vat_rate",
            SettingKey::WithholdingRate => "withholding_rate",
            SettingKey::PpmRate => "ppm_rate",
            SettingKey::AdminExpenseFlat => "admin_expense_flat",
            SettingKey::CashReserveRate => "cash_reserve_rate",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次編輯工作階段所使用的全域費率快照。
/// `defaulted` 記錄哪些設定因來源不可用而退回 0。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeRates {
    pub vat_rate: Decimal,
    pub withholding_rate: Decimal,
    pub ppm_rate: Decimal,
    pub admin_expense_flat: Decimal,
    pub cash_reserve_rate: Decimal,
    #[serde(default)]
    pub defaulted: Vec<SettingKey>,
}

impl SurchargeRates {
    pub fn get(&self, key: SettingKey) -> Decimal {
        match key {
            SettingKey::VatRate => self.vat_rate,
            SettingKey::WithholdingRate => self.withholding_rate,
            SettingKey::PpmRate => self.ppm_rate,
            SettingKey::AdminExpenseFlat => self.admin_expense_flat,
            SettingKey::CashReserveRate => self.cash_reserve_rate,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: Decimal) {
        match key {
            SettingKey::VatRate => self.vat_rate = value,
            SettingKey::WithholdingRate => self.withholding_rate = value,
            SettingKey::PpmRate => self.ppm_rate = value,
            SettingKey::AdminExpenseFlat => self.admin_expense_flat = value,
            SettingKey::CashReserveRate => self.cash_reserve_rate = value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.defaulted.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAggregates {
    pub taxed_base: Decimal,
    pub withholding_base: Decimal,
    pub net_base: Decimal,
}

impl LedgerAggregates {
    pub fn total(&self) -> Decimal {
        self.taxed_base
            .saturating_add(self.withholding_base)
            .saturating_add(self.net_base)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surcharges {
    pub vat_amount: Decimal,
    pub withholding_amount: Decimal,
    pub ppm_amount: Decimal,
    pub admin_expense_amount: Decimal,
    pub cash_reserve_amount: Decimal,
}

impl Surcharges {
    pub fn total(&self) -> Decimal {
        [
            self.withholding_amount,
            self.ppm_amount,
            self.admin_expense_amount,
            self.cash_reserve_amount,
        ]
        .iter()
        .fold(self.vat_amount, |acc, v| acc.saturating_add(*v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionSource {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub revenue: Decimal,
    pub cost_subtotal_taxed: Decimal,
    pub cost_subtotal_withholding: Decimal,
    pub cost_subtotal_net: Decimal,
    pub vat_amount: Decimal,
    pub withholding_amount: Decimal,
    pub ppm_amount: Decimal,
    pub admin_expense_amount: Decimal,
    pub cash_reserve_amount: Decimal,
    pub costs_excluding_commission: Decimal,
    pub commission_percent: Decimal,
    pub commission_amount: Decimal,
    pub commission_source: CommissionSource,
    pub total_cost: Decimal,
    pub net_profit: Decimal,
    pub net_margin_percent: Decimal,
    pub converged: bool,
    pub iterations: u32,
    pub defaulted_settings: Vec<SettingKey>,
    pub resolver_degraded: bool,
}
