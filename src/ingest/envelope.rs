//! The Things Network webhook envelope, as posted to `/ttn/uplink`.
//!
//! Only the fields the pipeline consumes are modeled; everything else
//! in the webhook JSON is ignored.

use serde::Deserialize;

use crate::db::models::ApReading;

#[derive(Debug, Clone, Deserialize)]
pub struct TtnUplink {
    pub end_device_ids: EndDeviceIds,
    #[serde(default)]
    pub received_at: Option<String>,
    pub uplink_message: UplinkMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndDeviceIds {
    pub device_id: String,
    #[serde(default)]
    pub dev_eui: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UplinkMessage {
    #[serde(default)]
    pub decoded_payload: Option<DecodedPayload>,
    #[serde(default)]
    pub f_port: Option<u32>,
}

/// Decoded tracker payload: two mandatory access-point readings plus an
/// optional third.
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedPayload {
    #[serde(rename = "AP1_MAC")]
    pub ap1_mac: String,
    #[serde(rename = "AP1_RSSI")]
    pub ap1_rssi: i32,
    #[serde(rename = "AP2_MAC")]
    pub ap2_mac: String,
    #[serde(rename = "AP2_RSSI")]
    pub ap2_rssi: i32,
    #[serde(rename = "AP3_MAC", default)]
    pub ap3_mac: Option<String>,
    #[serde(rename = "AP3_RSSI", default)]
    pub ap3_rssi: Option<i32>,
}

impl TtnUplink {
    /// The readings in slot order, or `None` when the payload is absent
    /// or the optional third slot is only half present.
    pub fn readings(&self) -> Option<Vec<ApReading>> {
        let payload = self.uplink_message.decoded_payload.as_ref()?;

        let mut readings = vec![
            ApReading {
                mac: payload.ap1_mac.clone(),
                rssi: payload.ap1_rssi,
            },
            ApReading {
                mac: payload.ap2_mac.clone(),
                rssi: payload.ap2_rssi,
            },
        ];

        match (&payload.ap3_mac, payload.ap3_rssi) {
            (Some(mac), Some(rssi)) => readings.push(ApReading {
                mac: mac.clone(),
                rssi,
            }),
            (None, None) => {}
            _ => return None,
        }

        Some(readings)
    }
}
