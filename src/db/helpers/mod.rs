use std::convert::TryFrom;

use anyhow::{anyhow, Result};

use crate::db::models::ApReading;

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} holds out-of-range value {value}"))
}

/// Rebuilds the reading list from the three nullable column pairs,
/// dropping empty trailing slots.
pub fn collect_readings(slots: [(Option<String>, Option<i32>); 3]) -> Vec<ApReading> {
    slots
        .into_iter()
        .filter_map(|(mac, rssi)| match (mac, rssi) {
            (Some(mac), Some(rssi)) => Some(ApReading { mac, rssi }),
            _ => None,
        })
        .collect()
}
