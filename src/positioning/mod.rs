pub mod config;
pub mod estimator;
pub mod signal;
pub mod smoothing;

pub use config::PositioningConfig;
pub use estimator::{estimate_position, normalize_bssid, PositionEstimate};
