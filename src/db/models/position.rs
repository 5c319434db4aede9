use serde::{Deserialize, Serialize};

/// The most recent resolved position, as exposed to the map front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestPosition {
    pub id: i64,
    pub timestamp: String,
    pub device_id: String,
    pub est_lat: f64,
    pub est_lon: f64,
    pub sources: u32,
}
