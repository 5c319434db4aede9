pub mod config;
pub mod db;
pub mod diag;
pub mod ingest;
pub mod positioning;
pub mod server;

use db::Database;
use diag::DiagnosticLog;
use ingest::IngestPipeline;
use positioning::PositioningConfig;

/// Shared state behind the HTTP handlers.
pub struct AppState {
    pub db: Database,
    pub diag: DiagnosticLog,
    pub pipeline: IngestPipeline,
    pub positioning: PositioningConfig,
}
