//! Checked decimal helpers shared by the surcharge calculator and the solver.
//! Overflow and division failures collapse to zero so no snapshot field is
//! ever left undefined.

use rust_decimal::Decimal;

/// `base × rate / 100`
pub fn percent_of(base: Decimal, rate: Decimal) -> Decimal {
    base.checked_mul(rate)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// `(revenue − costs) / revenue × 100`, or 0 when revenue is not positive.
pub fn margin_percent(revenue: Decimal, total_costs: Decimal) -> Decimal {
    if revenue <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    revenue
        .checked_sub(total_costs)
        .and_then(|profit| profit.checked_div(revenue))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

pub fn add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::ZERO)
}

pub fn sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or(Decimal::ZERO)
}

/// Negative values are not meaningful amounts here.
pub fn non_negative(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        Decimal::ZERO
    } else {
        value
    }
}
