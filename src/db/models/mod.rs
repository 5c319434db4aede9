pub mod known_ap;
pub mod position;
pub mod scan;

pub use known_ap::KnownAccessPoint;
pub use position::LatestPosition;
pub use scan::{ApReading, NewScan, ScanRecord};
