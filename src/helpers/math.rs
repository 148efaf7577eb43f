/// `numerator / denominator`, or 0.0 when the denominator is zero
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Rounds half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Turnover proxy `sold / (sold + available)`, rounded to 3 places
///
/// The sum is taken in `f64` so extreme counts cannot overflow.
pub fn sell_through(sold: i64, available: i64) -> f64 {
    let (sold, available) = (sold as f64, available as f64);
    round_to(ratio(sold, sold + available), 3)
}
