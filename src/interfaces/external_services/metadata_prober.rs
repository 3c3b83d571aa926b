// Metadata Prober Interface
//
// The prober is an opaque external process; the core only sees this
// seam and the structural report it yields.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::value_objects::ProbeReport;
use crate::shared::error::ProbeError;

/// Extracts structural metadata from a source file
///
/// # Thread Safety
/// Implementations must be Send + Sync; probes run concurrently on the
/// ingest worker pool.
#[async_trait]
pub trait MetadataProber: Send + Sync {
    /// Probe a file. A non-recoverable parse failure is a `ProbeError`;
    /// the pipeline surfaces it as a `MetadataFailure` trouble.
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ProbeError>;
}
