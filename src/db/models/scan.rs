use serde::{Deserialize, Serialize};

/// One (MAC, RSSI) pair sensed by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApReading {
    pub mac: String,
    pub rssi: i32,
}

/// A scan waiting to be appended to history.
///
/// `position` is the smoothed coordinate pair, or `None` when no
/// reference access point matched; `sources` counts the matched
/// references regardless of smoothing.
#[derive(Debug, Clone)]
pub struct NewScan {
    pub device_id: String,
    pub timestamp: String,
    pub readings: Vec<ApReading>,
    pub position: Option<(f64, f64)>,
    pub sources: u32,
}

/// A persisted history row. Append-only; `id` is assigned by SQLite in
/// insertion order and is the sole ordering authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    pub device_id: String,
    pub timestamp: String,
    pub readings: Vec<ApReading>,
    pub est_lat: Option<f64>,
    pub est_lon: Option<f64>,
    pub sources: u32,
}
