//! Exponential smoothing of successive position estimates.
//!
//! Single-sample multilateration jitters; blending each new estimate
//! against the device's last stored position bounds that jitter while
//! staying responsive to genuine movement.

/// Blends a new coordinate pair against the previously stored one:
/// `alpha * new + (1 - alpha) * previous`, per coordinate.
///
/// With no prior position the raw estimate is stored verbatim.
pub fn blend(new: (f64, f64), previous: Option<(f64, f64)>, alpha: f64) -> (f64, f64) {
    match previous {
        Some((prev_lat, prev_lon)) => (
            alpha * new.0 + (1.0 - alpha) * prev_lat,
            alpha * new.1 + (1.0 - alpha) * prev_lon,
        ),
        None => new,
    }
}
