use rust_decimal::{Decimal, RoundingStrategy};

fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

fn signed_dollars(val: Decimal, dp: u32) -> String {
    let rounded = val.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = format!("{:.*}", dp as usize, rounded.abs());
    let body = match abs.split_once('.') {
        Some((int_part, dec_part)) => format!("{}.{dec_part}", group_thousands(int_part)),
        None => group_thousands(&abs),
    };
    if negative {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

/// Whole dollars with thousands separators: $1,235
pub fn dollars(val: Decimal) -> String {
    signed_dollars(val, 0)
}

/// Dollars and cents with thousands separators: $1,234.56
pub fn money(val: Decimal) -> String {
    signed_dollars(val, 2)
}

/// A ratio as a percentage with one decimal: 0.4 -> 40.0%
pub fn pct(ratio: Decimal) -> String {
    let scaled = (ratio * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    format!("{:.1}%", scaled)
}

/// Signed percentage points with one decimal: +2.5 pp
pub fn pp(points: Decimal) -> String {
    let rounded = points.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{:.1} pp", rounded.abs())
    } else {
        format!("+{:.1} pp", rounded.abs())
    }
}

/// Unsigned percentage points with one decimal, for prose: 2.5
pub fn pp_abs(points: Decimal) -> String {
    let rounded = points
        .abs()
        .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    format!("{:.1}", rounded)
}

/// Integer with thousands separators: 12,345
pub fn number(val: usize) -> String {
    group_thousands(&val.to_string())
}
