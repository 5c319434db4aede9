use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};

/// Runtime settings, overridable through the environment:
/// `LOCATOR_ADDR` (socket address) and `LOCATOR_DB` (SQLite path).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            db_path: PathBuf::from("wifi_scans.db"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(raw) = env::var("LOCATOR_ADDR") {
            settings.bind_addr = raw
                .parse()
                .with_context(|| format!("invalid LOCATOR_ADDR '{raw}'"))?;
        }
        if let Ok(raw) = env::var("LOCATOR_DB") {
            settings.db_path = PathBuf::from(raw);
        }

        Ok(settings)
    }
}
