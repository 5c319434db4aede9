use serde::{Deserialize, Serialize};

/// A surveyed access point used as a positioning anchor.
///
/// Rows are created by the offline import tooling and never mutated by
/// the service. The stored `bssid` may carry arbitrary casing; lookups
/// compare case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownAccessPoint {
    pub bssid: String,
    pub lat: f64,
    pub lon: f64,
}
