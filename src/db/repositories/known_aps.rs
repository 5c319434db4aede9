use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use crate::db::{connection::Database, models::KnownAccessPoint};

impl Database {
    /// Looks up a reference access point by BSSID, case-insensitively.
    ///
    /// Callers pass the normalized (trimmed, uppercased) key; the stored
    /// side is folded in SQL so un-normalized imports still match.
    pub async fn get_known_ap(&self, bssid: &str) -> Result<Option<KnownAccessPoint>> {
        let bssid = bssid.to_string();
        self.execute(move |conn| {
            let ap = conn
                .query_row(
                    "SELECT bssid, lat, lon FROM known_aps WHERE UPPER(bssid) = ?1",
                    params![bssid],
                    |row| {
                        Ok(KnownAccessPoint {
                            bssid: row.get(0)?,
                            lat: row.get(1)?,
                            lon: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(ap)
        })
        .await
    }

    pub async fn count_known_aps(&self) -> Result<i64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT count(*) FROM known_aps", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
    }
}
