pub mod envelope;
pub mod pipeline;

pub use envelope::TtnUplink;
pub use pipeline::{IngestOutcome, IngestPipeline};
