use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::StatisticsEntry;

pub const INVALID_DATA: &str = "Invalid data";

/// Index of the aggregate entry inside a statistics snapshot.
const AGGREGATE_ENTRY: usize = 2;

/// Amount plus reward after one period, as shown to the user and sent to the backend.
pub fn projected_reward(amount: Option<Decimal>, percent: u32) -> String {
    match amount {
        Some(amount) => {
            let factor = Decimal::ONE + Decimal::from(percent) / Decimal::ONE_HUNDRED;
            format_money(amount * factor)
        }
        None => "0.00".to_string(),
    }
}

pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

pub fn aggregate_totals(entries: &[StatisticsEntry]) -> Option<&serde_json::Value> {
    entries.get(AGGREGATE_ENTRY).map(|entry| &entry.total)
}

/// Display value for one window of the aggregate totals (in hundreds).
pub fn statistic_for_window(totals: Option<&serde_json::Value>, window_index: usize) -> String {
    totals
        .and_then(|totals| totals.as_array())
        .and_then(|values| values.get(window_index))
        .and_then(|value| value.as_f64())
        .map(|value| format!("{:.2}", value / 100.0))
        .unwrap_or_else(|| INVALID_DATA.to_string())
}

/// Renders `day.month.year::hour:minute:second` without zero padding.
///
/// The backend stores this string as-is, so the format must not change.
pub fn format_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>, timezone: &FixedOffset) -> String {
    let local = instant.with_timezone(timezone);
    format!(
        "{}.{}.{}::{}:{}:{}",
        local.day(),
        local.month(),
        local.year(),
        local.hour(),
        local.minute(),
        local.second()
    )
}
