use crate::core::money;
use crate::domain::model::{LedgerAggregates, SettingKey, SurchargeRates, Surcharges};
use crate::domain::ports::SettingsSource;
use rust_decimal::Decimal;

/// 依收入與成本基數計算各項附加費用
#[derive(Debug, Clone, Copy, Default)]
pub struct SurchargeCalculator;

impl SurchargeCalculator {
    pub fn compute(
        revenue: Decimal,
        aggregates: &LedgerAggregates,
        rates: &SurchargeRates,
    ) -> Surcharges {
        let revenue_positive = revenue > Decimal::ZERO;

        Surcharges {
            vat_amount: money::percent_of(aggregates.taxed_base, rates.vat_rate),
            withholding_amount: money::percent_of(
                aggregates.withholding_base,
                rates.withholding_rate,
            ),
            ppm_amount: if revenue_positive {
                money::percent_of(revenue, rates.ppm_rate)
            } else {
                Decimal::ZERO
            },
            admin_expense_amount: money::non_negative(rates.admin_expense_flat),
            cash_reserve_amount: if revenue_positive {
                money::percent_of(revenue, rates.cash_reserve_rate)
            } else {
                Decimal::ZERO
            },
        }
    }
}

/// 從設定來源載入費率快照。
///
/// 每個 key 獨立查詢；查無或查詢失敗時該值為 0，並記錄在 `defaulted`。
pub async fn load_rates<S: SettingsSource + ?Sized>(source: &S) -> SurchargeRates {
    let mut rates = SurchargeRates::default();

    for key in SettingKey::ALL {
        match source.get(key).await {
            Ok(Some(value)) if !value.is_sign_negative() => rates.set(key, value),
            Ok(Some(value)) => {
                tracing::warn!("⚠️ Setting {} has negative value {}, using 0", key, value);
                rates.defaulted.push(key);
            }
            Ok(None) => {
                tracing::warn!("⚠️ Setting {} not configured, using 0", key);
                rates.defaulted.push(key);
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not load setting {}: {}, using 0", key, e);
                rates.defaulted.push(key);
            }
        }
    }

    tracing::debug!(
        "Loaded rates: vat={} withholding={} ppm={} admin={} reserve={}",
        rates.vat_rate,
        rates.withholding_rate,
        rates.ppm_rate,
        rates.admin_expense_flat,
        rates.cash_reserve_rate
    );

    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{EngineError, Result};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn rates() -> SurchargeRates {
        SurchargeRates {
            vat_rate: dec!(19),
            withholding_rate: dec!(13.75),
            ppm_rate: dec!(1),
            admin_expense_flat: dec!(25000),
            cash_reserve_rate: dec!(2),
            defaulted: vec![],
        }
    }

    #[test]
    fn test_compute_all_surcharges() {
        let aggregates = LedgerAggregates {
            taxed_base: dec!(200000),
            withholding_base: dec!(100000),
            net_base: dec!(50000),
        };

        let s = SurchargeCalculator::compute(dec!(1000000), &aggregates, &rates());

        assert_eq!(s.vat_amount, dec!(38000));
        assert_eq!(s.withholding_amount, dec!(13750));
        assert_eq!(s.ppm_amount, dec!(10000));
        assert_eq!(s.admin_expense_amount, dec!(25000));
        assert_eq!(s.cash_reserve_amount, dec!(20000));
        assert_eq!(s.total(), dec!(106750));
    }

    #[test]
    fn test_revenue_based_surcharges_zero_without_revenue() {
        let aggregates = LedgerAggregates {
            taxed_base: dec!(1000),
            ..Default::default()
        };

        let s = SurchargeCalculator::compute(dec!(0), &aggregates, &rates());

        assert_eq!(s.ppm_amount, dec!(0));
        assert_eq!(s.cash_reserve_amount, dec!(0));
        assert_eq!(s.vat_amount, dec!(190));
        // flat amount does not depend on revenue
        assert_eq!(s.admin_expense_amount, dec!(25000));
    }

    struct MapSettings {
        values: HashMap<SettingKey, Decimal>,
        failing: Option<SettingKey>,
    }

    #[async_trait]
    impl SettingsSource for MapSettings {
        async fn get(&self, key: SettingKey) -> Result<Option<Decimal>> {
            if self.failing == Some(key) {
                return Err(EngineError::SettingsError {
                    message: "connection refused".to_string(),
                });
            }
            Ok(self.values.get(&key).copied())
        }
    }

    #[tokio::test]
    async fn test_load_rates_defaults_missing_and_failing_keys() {
        let mut values = HashMap::new();
        values.insert(SettingKey::VatRate, dec!(19));
        values.insert(SettingKey::PpmRate, dec!(0.25));
        values.insert(SettingKey::CashReserveRate, dec!(-3));

        let source = MapSettings {
            values,
            failing: Some(SettingKey::WithholdingRate),
        };

        let rates = load_rates(&source).await;

        assert_eq!(rates.vat_rate, dec!(19));
        assert_eq!(rates.ppm_rate, dec!(0.25));
        assert_eq!(rates.withholding_rate, dec!(0));
        assert_eq!(rates.cash_reserve_rate, dec!(0));
        assert_eq!(
            rates.defaulted,
            vec![
                SettingKey::WithholdingRate,
                SettingKey::AdminExpenseFlat,
                SettingKey::CashReserveRate
            ]
        );
        assert!(rates.is_degraded());
    }
}
