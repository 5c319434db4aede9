//! Log-distance path loss model: RSSI → estimated distance → weight.

use crate::positioning::config::PositioningConfig;

/// Plausible RSSI range; readings outside are clamped before conversion.
const RSSI_MIN: i32 = -100;
const RSSI_MAX: i32 = -10;

/// Distances below this are raised to 1 m so weights stay bounded.
const MIN_DISTANCE_M: f64 = 1.0;

/// Estimated distance in metres for a raw RSSI reading.
///
/// Formula: `distance = 10^((rssi_at_1m - rssi) / (10 * path_loss_exponent))`
pub fn estimated_distance(rssi: i32, config: &PositioningConfig) -> f64 {
    let clamped = f64::from(rssi.clamp(RSSI_MIN, RSSI_MAX));
    let exponent = (config.rssi_at_1m - clamped) / (10.0 * config.path_loss_exponent);
    10f64.powf(exponent).max(MIN_DISTANCE_M)
}

/// Distance and its inverse-square confidence weight.
pub fn distance_and_weight(rssi: i32, config: &PositioningConfig) -> (f64, f64) {
    let distance = estimated_distance(rssi, config);
    (distance, 1.0 / (distance * distance))
}
