//! Weighted-centroid position estimation against the reference table.

use crate::{
    db::{models::ApReading, Database},
    diag::DiagnosticLog,
    positioning::{config::PositioningConfig, signal},
};

/// Transient result of one estimation; feeds the smoother and is
/// discarded after the scan is persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEstimate {
    pub lat: f64,
    pub lon: f64,
    /// Number of readings that matched a reference access point.
    pub sources: u32,
}

/// Comparison key for reference lookups, applied to incoming readings.
/// The stored side is folded in SQL (see `Database::get_known_ap`).
pub fn normalize_bssid(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Resolves the scan's readings against the reference table and returns
/// their confidence-weighted centroid.
///
/// Unmatched readings are skipped; `None` means nothing matched, which
/// is a legitimate outcome, not an error. A failed reference lookup
/// (store unreachable) also yields `None` and aborts this estimation
/// only. Emits one diagnostic line per reading plus a summary.
pub async fn estimate_position(
    db: &Database,
    diag: &DiagnosticLog,
    config: &PositioningConfig,
    readings: &[ApReading],
) -> Option<PositionEstimate> {
    for (index, reading) in readings.iter().enumerate() {
        diag.push(format!(
            "AP{}: {} ({} dBm)",
            index + 1,
            reading.mac,
            reading.rssi
        ));
    }

    match db.count_known_aps().await {
        Ok(count) => diag.push(format!("reference table holds {count} access points")),
        Err(err) => {
            diag.push(format!("reference table unreachable: {err}"));
            return None;
        }
    }

    let mut weighted_lat = 0.0;
    let mut weighted_lon = 0.0;
    let mut total_weight = 0.0;
    let mut matched = 0u32;
    let mut sole_match: Option<(f64, f64)> = None;

    for reading in readings {
        let key = normalize_bssid(&reading.mac);
        let known = match db.get_known_ap(&key).await {
            Ok(known) => known,
            Err(err) => {
                diag.push(format!("reference lookup failed for {key}: {err}"));
                return None;
            }
        };

        match known {
            Some(ap) => {
                matched += 1;
                sole_match = Some((ap.lat, ap.lon));
                let (distance, weight) = signal::distance_and_weight(reading.rssi, config);
                weighted_lat += ap.lat * weight;
                weighted_lon += ap.lon * weight;
                total_weight += weight;
                diag.push(format!(
                    "{key}: matched ({:.4}, {:.4}), ~{distance:.2} m, weight {weight:.4}",
                    ap.lat, ap.lon
                ));
            }
            None => diag.push(format!("{key}: not in reference table")),
        }
    }

    diag.push(format!(
        "{matched} of {} readings matched",
        readings.len()
    ));

    // A single match degenerates to that anchor's stored coordinates;
    // returning them directly keeps the result bit-exact instead of
    // rounding through (coord * w) / w.
    if matched == 1 {
        let (lat, lon) = sole_match?;
        return Some(PositionEstimate {
            lat,
            lon,
            sources: matched,
        });
    }

    if total_weight > 0.0 {
        Some(PositionEstimate {
            lat: weighted_lat / total_weight,
            lon: weighted_lon / total_weight,
            sources: matched,
        })
    } else {
        None
    }
}
