// Adapters layer: concrete implementations of the domain ports and file imports.

pub mod bracket_table;
pub mod cost_import;
pub mod http_resolver;
pub mod settings;

use crate::utils::validation::decimal_from_f64;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Reads a decimal from a JSON number or numeric string; anything else is `None`.
///
/// Numbers are parsed from their JSON text so `72.35` stays exactly 72.35;
/// only values outside the decimal range go through `f64`.
pub(crate) fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
                .or_else(|| n.as_f64().map(decimal_from_f64))
        }
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_json_decimal_keeps_exact_value() {
        assert_eq!(json_decimal(&json!(72.35)), Some(dec!(72.35)));
        assert_eq!(json_decimal(&json!(0.1)), Some(dec!(0.1)));
        assert_eq!(json_decimal(&json!(5)), Some(dec!(5)));
        assert_eq!(json_decimal(&json!(1e-7)), Some(dec!(0.0000001)));
        assert_eq!(json_decimal(&json!(" 12.5 ")), Some(dec!(12.5)));
    }

    #[test]
    fn test_json_decimal_rejects_non_numbers() {
        assert_eq!(json_decimal(&json!(null)), None);
        assert_eq!(json_decimal(&json!(true)), None);
        assert_eq!(json_decimal(&json!("n/a")), None);
    }
}
