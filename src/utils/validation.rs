use crate::utils::error::{EngineError, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EngineError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EngineError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 百分比必須介於 0 到 100
pub fn validate_percentage(field_name: &str, value: Decimal) -> Result<()> {
    validate_range(field_name, value, Decimal::ZERO, Decimal::ONE_HUNDRED)
}

pub fn validate_non_negative(field_name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be negative".to_string(),
        });
    }
    Ok(())
}

/// 將外部傳入的浮點數轉成 Decimal。NaN、無限大與負數一律視為 0。
pub fn decimal_from_f64(value: f64) -> Decimal {
    if !value.is_finite() || value < 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// 解析使用者輸入的金額字串，拒絕非數字與負值
pub fn parse_amount(field_name: &str, raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    let amount = Decimal::from_str(trimmed).map_err(|e| EngineError::ValidationError {
        message: format!("{}: '{}' is not a valid amount ({})", field_name, trimmed, e),
    })?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::ValidationError {
            message: format!("{}: amount {} cannot be negative", field_name, amount),
        });
    }

    Ok(amount)
}
