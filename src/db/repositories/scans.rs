use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{collect_readings, to_u32},
    models::{LatestPosition, NewScan, ScanRecord},
};

fn row_to_scan(row: &Row) -> Result<ScanRecord> {
    let readings = collect_readings([
        (row.get("ap1_mac")?, row.get("ap1_rssi")?),
        (row.get("ap2_mac")?, row.get("ap2_rssi")?),
        (row.get("ap3_mac")?, row.get("ap3_rssi")?),
    ]);
    let sources: i64 = row.get("known_aps_count")?;

    Ok(ScanRecord {
        id: row.get("id")?,
        device_id: row.get("device_id")?,
        timestamp: row.get("timestamp")?,
        readings,
        est_lat: row.get("est_lat")?,
        est_lon: row.get("est_lon")?,
        sources: to_u32(sources, "known_aps_count")?,
    })
}

impl Database {
    /// Appends one scan to history and returns its assigned id.
    pub async fn insert_scan(&self, scan: &NewScan) -> Result<i64> {
        let record = scan.clone();
        self.execute(move |conn| {
            let slot = |index: usize| {
                let reading = record.readings.get(index);
                (
                    reading.map(|r| r.mac.clone()),
                    reading.map(|r| r.rssi),
                )
            };
            let (ap1_mac, ap1_rssi) = slot(0);
            let (ap2_mac, ap2_rssi) = slot(1);
            let (ap3_mac, ap3_rssi) = slot(2);

            conn.execute(
                "INSERT INTO scans (device_id, timestamp, ap1_mac, ap1_rssi, ap2_mac, ap2_rssi, ap3_mac, ap3_rssi, est_lat, est_lon, known_aps_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.device_id,
                    record.timestamp,
                    ap1_mac,
                    ap1_rssi,
                    ap2_mac,
                    ap2_rssi,
                    ap3_mac,
                    ap3_rssi,
                    record.position.map(|(lat, _)| lat),
                    record.position.map(|(_, lon)| lon),
                    i64::from(record.sources),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// The most recent stored position for one device, used as the
    /// smoothing anchor. Rows with a null position are skipped.
    pub async fn last_position_for_device(
        &self,
        device_id: &str,
    ) -> Result<Option<(f64, f64)>> {
        let device_id = device_id.to_string();
        self.execute(move |conn| {
            let position = conn
                .query_row(
                    "SELECT est_lat, est_lon FROM scans
                     WHERE device_id = ?1 AND est_lat IS NOT NULL
                     ORDER BY id DESC LIMIT 1",
                    params![device_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(position)
        })
        .await
    }

    /// The most recent resolved position across all devices, or `None`
    /// when history holds no resolved rows yet.
    pub async fn latest_position(&self) -> Result<Option<LatestPosition>> {
        self.execute(|conn| {
            let latest = conn
                .query_row(
                    "SELECT id, timestamp, device_id, est_lat, est_lon, known_aps_count
                     FROM scans
                     WHERE est_lat IS NOT NULL
                     ORDER BY id DESC LIMIT 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, f64>(3)?,
                            row.get::<_, f64>(4)?,
                            row.get::<_, i64>(5)?,
                        ))
                    },
                )
                .optional()?;

            match latest {
                Some((id, timestamp, device_id, est_lat, est_lon, sources)) => {
                    Ok(Some(LatestPosition {
                        id,
                        timestamp,
                        device_id,
                        est_lat,
                        est_lon,
                        sources: to_u32(sources, "known_aps_count")?,
                    }))
                }
                None => Ok(None),
            }
        })
        .await
    }

    /// The `window` most recent resolved positions, reordered to
    /// chronological (ascending id) for path drawing.
    pub async fn trajectory(&self, window: usize) -> Result<Vec<(f64, f64)>> {
        let window = window as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT est_lat, est_lon FROM scans
                 WHERE est_lat IS NOT NULL
                 ORDER BY id DESC LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![window])?;
            let mut points: Vec<(f64, f64)> = Vec::new();
            while let Some(row) = rows.next()? {
                points.push((row.get(0)?, row.get(1)?));
            }

            points.reverse();
            Ok(points)
        })
        .await
    }

    /// Full history rows, newest first.
    pub async fn recent_scans(&self, limit: usize) -> Result<Vec<ScanRecord>> {
        let limit = limit as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, device_id, timestamp, ap1_mac, ap1_rssi, ap2_mac, ap2_rssi, ap3_mac, ap3_rssi, est_lat, est_lon, known_aps_count
                 FROM scans
                 ORDER BY id DESC LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut scans = Vec::new();
            while let Some(row) = rows.next()? {
                scans.push(row_to_scan(row)?);
            }

            Ok(scans)
        })
        .await
    }
}
