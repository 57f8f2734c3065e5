/// Format a number with exactly `decimals` decimal places.
///
/// # Examples
///
/// ```
/// use usage_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 2), "1234.50");
/// assert_eq!(format_number(4.0, 2), "4.00");
/// assert_eq!(format_number(0.125, 1), "0.1");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    format!("{:.prec$}", value, prec = decimals)
}

/// Format a percentage with two decimal places and a trailing `%`.
///
/// # Examples
///
/// ```
/// use usage_core::formatting::format_percent;
///
/// assert_eq!(format_percent(12.3456), "12.35%");
/// assert_eq!(format_percent(100.0), "100.00%");
/// ```
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value, 2))
}

/// Calculate `(part / whole) * 100`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use usage_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(1.0, 0.0), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    (part / whole) * 100.0
}

/// Percentage of a daily GPU-hour budget consumed over `elapsed_days`.
///
/// `daily_budget` is either a cluster's daily capacity or a user quota.
///
/// # Examples
///
/// ```
/// use usage_core::formatting::utilisation;
///
/// // 4224 GPU-hours over two days of a 4224 GPUh/day cluster is half.
/// assert!((utilisation(4224.0, 2, 4224.0) - 50.0).abs() < 1e-9);
/// ```
pub fn utilisation(gpu_hours: f64, elapsed_days: i64, daily_budget: f64) -> f64 {
    if elapsed_days <= 0 {
        return 0.0;
    }
    percentage(gpu_hours / elapsed_days as f64, daily_budget)
}
