//! End-to-end handling of one uplink: validate, estimate, smooth,
//! persist. No stage failure is fatal to the service; a failed stage
//! degrades or drops the single observation and leaves a diagnostic
//! line behind.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;

use crate::{
    db::{models::NewScan, Database},
    diag::DiagnosticLog,
    ingest::envelope::TtnUplink,
    positioning::{estimate_position, smoothing, PositioningConfig},
};

/// Caller-visible result of one ingestion. `EmptyPayload` is the benign
/// "nothing to process" outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    EmptyPayload,
}

type DeviceLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

#[derive(Clone)]
pub struct IngestPipeline {
    db: Database,
    diag: DiagnosticLog,
    config: PositioningConfig,
    // Serializes the fetch-blend-append sequence per device so two
    // concurrent uplinks from the same tracker chain their smoothing
    // instead of both reading the same prior position.
    device_locks: Arc<DeviceLocks>,
}

impl IngestPipeline {
    pub fn new(db: Database, diag: DiagnosticLog, config: PositioningConfig) -> Self {
        Self {
            db,
            diag,
            config,
            device_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn handle_uplink(&self, uplink: &TtnUplink) -> IngestOutcome {
        let device_id = uplink.end_device_ids.device_id.trim();
        if device_id.is_empty() {
            self.diag.push("rejected uplink: missing device id");
            return IngestOutcome::EmptyPayload;
        }

        let Some(readings) = uplink.readings() else {
            self.diag
                .push(format!("rejected uplink from {device_id}: empty or incomplete payload"));
            return IngestOutcome::EmptyPayload;
        };

        self.diag.push(format!("uplink received from {device_id}"));

        let lock = self.device_lock(device_id);
        let _guard = lock.lock().await;

        let estimate = estimate_position(&self.db, &self.diag, &self.config, &readings).await;
        match &estimate {
            Some(est) => self.diag.push(format!(
                "position: {:.5}, {:.5} ({} sources)",
                est.lat, est.lon, est.sources
            )),
            None => self
                .diag
                .push("position: unresolved (no reference match)"),
        }

        let position = match &estimate {
            Some(est) => {
                let previous = match self.db.last_position_for_device(device_id).await {
                    Ok(previous) => previous,
                    Err(err) => {
                        self.diag.push(format!(
                            "history read failed: {err}; storing unsmoothed estimate"
                        ));
                        None
                    }
                };
                Some(smoothing::blend(
                    (est.lat, est.lon),
                    previous,
                    self.config.smoothing_alpha,
                ))
            }
            None => None,
        };

        let scan = NewScan {
            device_id: device_id.to_string(),
            timestamp: self.receipt_timestamp(uplink),
            readings,
            position,
            sources: estimate.map(|est| est.sources).unwrap_or(0),
        };

        // At-most-once: a failed append drops the observation from
        // history and only the diagnostic log knows.
        if let Err(err) = self.db.insert_scan(&scan).await {
            self.diag
                .push(format!("scan insert failed: {err}; observation dropped"));
        }

        IngestOutcome::Accepted
    }

    fn receipt_timestamp(&self, uplink: &TtnUplink) -> String {
        uplink
            .received_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339())
    }

    // One map entry per device id, kept for process lifetime. The
    // fleet is a handful of trackers, so no eviction.
    fn device_lock(&self, device_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut guard = match self.device_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .entry(device_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rusqlite::params;
    use tempfile::TempDir;

    use crate::ingest::envelope::{DecodedPayload, EndDeviceIds, UplinkMessage};

    const AP1: (&str, f64, f64) = ("AA:BB:CC:00:00:01", 48.8450, 2.3570);
    const AP2: (&str, f64, f64) = ("AA:BB:CC:00:00:02", 48.8460, 2.3580);

    async fn test_pipeline() -> Result<(TempDir, Database, DiagnosticLog, IngestPipeline)> {
        let dir = tempfile::tempdir()?;
        let db = Database::new(dir.path().join("scans.sqlite3"))?;

        db.execute(|conn| {
            for (bssid, lat, lon) in [AP1, AP2] {
                conn.execute(
                    "INSERT INTO known_aps (bssid, lat, lon) VALUES (?1, ?2, ?3)",
                    params![bssid, lat, lon],
                )?;
            }
            Ok(())
        })
        .await?;

        let diag = DiagnosticLog::new();
        let pipeline = IngestPipeline::new(db.clone(), diag.clone(), PositioningConfig::default());
        Ok((dir, db, diag, pipeline))
    }

    fn uplink(device_id: &str, payload: Option<DecodedPayload>) -> TtnUplink {
        TtnUplink {
            end_device_ids: EndDeviceIds {
                device_id: device_id.to_string(),
                dev_eui: None,
            },
            received_at: Some("2024-05-12T09:30:00Z".to_string()),
            uplink_message: UplinkMessage {
                decoded_payload: payload,
                f_port: Some(1),
            },
        }
    }

    fn payload(ap1: (&str, i32), ap2: (&str, i32)) -> DecodedPayload {
        DecodedPayload {
            ap1_mac: ap1.0.to_string(),
            ap1_rssi: ap1.1,
            ap2_mac: ap2.0.to_string(),
            ap2_rssi: ap2.1,
            ap3_mac: None,
            ap3_rssi: None,
        }
    }

    #[tokio::test]
    async fn missing_payload_is_rejected_without_persisting() -> Result<()> {
        let (_dir, db, _diag, pipeline) = test_pipeline().await?;

        let outcome = pipeline.handle_uplink(&uplink("tracker-01", None)).await;

        assert_eq!(outcome, IngestOutcome::EmptyPayload);
        assert!(db.recent_scans(10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unmatched_scan_stores_null_position_and_zero_sources() -> Result<()> {
        let (_dir, db, _diag, pipeline) = test_pipeline().await?;

        let outcome = pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(payload(("11:11:11:11:11:11", -60), ("22:22:22:22:22:22", -60))),
            ))
            .await;

        assert_eq!(outcome, IngestOutcome::Accepted);
        let scans = db.recent_scans(10).await?;
        assert_eq!(scans.len(), 1);
        assert!(scans[0].est_lat.is_none());
        assert!(scans[0].est_lon.is_none());
        assert_eq!(scans[0].sources, 0);

        // Only null-position rows: no latest position yet.
        assert!(db.latest_position().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn first_scan_stores_raw_centroid_second_is_smoothed() -> Result<()> {
        let (_dir, db, _diag, pipeline) = test_pipeline().await?;
        let midpoint = ((AP1.1 + AP2.1) / 2.0, (AP1.2 + AP2.2) / 2.0);

        // Equal RSSI on both anchors: raw estimate is their midpoint,
        // stored verbatim since the device has no history.
        pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(payload((AP1.0, -60), (AP2.0, -60))),
            ))
            .await;

        let first = db.latest_position().await?.expect("position stored");
        assert!((first.est_lat - midpoint.0).abs() < 1e-9);
        assert!((first.est_lon - midpoint.1).abs() < 1e-9);
        assert_eq!(first.sources, 2);

        // Second uplink matches only AP1, so the raw estimate is AP1's
        // exact coordinates; stored = 0.4 * raw + 0.6 * previous.
        pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(payload((AP1.0, -60), ("33:33:33:33:33:33", -60))),
            ))
            .await;

        let second = db.latest_position().await?.expect("position stored");
        assert!(second.id > first.id);
        assert!((second.est_lat - (0.4 * AP1.1 + 0.6 * midpoint.0)).abs() < 1e-9);
        assert!((second.est_lon - (0.4 * AP1.2 + 0.6 * midpoint.1)).abs() < 1e-9);
        assert_eq!(second.sources, 1);
        Ok(())
    }

    #[tokio::test]
    async fn smoothing_is_chained_per_device_not_across_devices() -> Result<()> {
        let (_dir, db, _diag, pipeline) = test_pipeline().await?;

        pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(payload((AP1.0, -60), ("33:33:33:33:33:33", -60))),
            ))
            .await;

        // A different device has no history: its first estimate is
        // stored raw, untouched by tracker-01's position.
        pipeline
            .handle_uplink(&uplink(
                "tracker-02",
                Some(payload((AP2.0, -60), ("33:33:33:33:33:33", -60))),
            ))
            .await;

        let latest = db.latest_position().await?.expect("position stored");
        assert_eq!(latest.device_id, "tracker-02");
        assert!((latest.est_lat - AP2.1).abs() < 1e-9);
        assert!((latest.est_lon - AP2.2).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_same_device_uplinks_all_persist() -> Result<()> {
        let (_dir, db, _diag, pipeline) = test_pipeline().await?;

        // Identical readings: the smoothed value is a fixed point of the
        // blend, so chaining order does not change the stored position.
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let pipeline = pipeline.clone();
            tasks.push(tokio::spawn(async move {
                pipeline
                    .handle_uplink(&uplink(
                        "tracker-01",
                        Some(payload((AP1.0, -60), (AP2.0, -60))),
                    ))
                    .await
            }));
        }
        for task in tasks {
            assert_eq!(task.await?, IngestOutcome::Accepted);
        }

        let scans = db.recent_scans(20).await?;
        assert_eq!(scans.len(), 8);
        let midpoint_lat = (AP1.1 + AP2.1) / 2.0;
        for scan in &scans {
            let lat = scan.est_lat.expect("every scan resolved");
            assert!((lat - midpoint_lat).abs() < 1e-9);
        }
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_degrades_the_observation_not_the_service() -> Result<()> {
        let (_dir, db, diag, pipeline) = test_pipeline().await?;

        pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(payload((AP1.0, -60), (AP2.0, -60))),
            ))
            .await;

        // History gone: the smoothing read and the append both fail.
        // The uplink is still acknowledged; only the diagnostic log
        // records the dropped observation.
        db.execute(|conn| {
            conn.execute("DROP TABLE scans", [])?;
            Ok(())
        })
        .await?;

        let outcome = pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(payload((AP1.0, -60), (AP2.0, -60))),
            ))
            .await;

        assert_eq!(outcome, IngestOutcome::Accepted);
        let tail = diag.tail();
        assert!(tail.iter().any(|line| line.contains("history read failed")));
        assert!(tail.iter().any(|line| line.contains("scan insert failed")));
        Ok(())
    }

    #[tokio::test]
    async fn raw_readings_are_persisted_alongside_position() -> Result<()> {
        let (_dir, db, _diag, pipeline) = test_pipeline().await?;

        pipeline
            .handle_uplink(&uplink(
                "tracker-01",
                Some(DecodedPayload {
                    ap1_mac: AP1.0.to_string(),
                    ap1_rssi: -61,
                    ap2_mac: AP2.0.to_string(),
                    ap2_rssi: -72,
                    ap3_mac: Some("33:33:33:33:33:33".to_string()),
                    ap3_rssi: Some(-85),
                }),
            ))
            .await;

        let scans = db.recent_scans(10).await?;
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].readings.len(), 3);
        assert_eq!(scans[0].readings[0].rssi, -61);
        assert_eq!(scans[0].readings[2].mac, "33:33:33:33:33:33");
        assert_eq!(scans[0].timestamp, "2024-05-12T09:30:00Z");
        Ok(())
    }
}
