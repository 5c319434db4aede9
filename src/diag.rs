use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use chrono::Local;
use log::info;

const RING_CAPACITY: usize = 20;

/// Bounded in-memory buffer of recent pipeline events, served raw on
/// the diagnostics endpoint. Process lifetime only; oldest line is
/// evicted on overflow. Every line is mirrored to the process log.
#[derive(Clone)]
pub struct DiagnosticLog {
    inner: Arc<Mutex<VecDeque<String>>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(RING_CAPACITY))),
        }
    }

    pub fn push(&self, message: impl AsRef<str>) {
        let line = format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            message.as_ref()
        );
        info!("{line}");

        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.len() == RING_CAPACITY {
            guard.pop_front();
        }
        guard.push_back(line);
    }

    /// Buffered lines, newest first.
    pub fn tail(&self) -> Vec<String> {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.iter().rev().cloned().collect()
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new()
    }
}
