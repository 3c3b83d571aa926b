// Transcode Runner Interface
//
// The transcoder is an opaque external process. The runner streams
// progress samples, honours cooperative cancellation, and terminates
// with success or a mined diagnostic.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::RunnerOption;
use crate::domain::value_objects::ProgressSample;
use crate::shared::error::RunnerError;

/// One transcoder invocation
#[derive(Debug, Clone)]
pub struct RunnerJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Option bundle from the target, forwarded verbatim
    pub options: Vec<RunnerOption>,
    /// Source runtime, used to derive percent progress
    pub duration_hint_secs: Option<f64>,
}

#[async_trait]
pub trait TranscodeRunner: Send + Sync {
    /// Run a job to completion.
    ///
    /// Progress samples are sent on `progress` while the process runs;
    /// the receiver may lag without affecting the transcode. When
    /// `cancel` fires the process is stopped and `RunnerError::Cancelled`
    /// is returned after the runner acknowledges.
    async fn run(
        &self,
        job: RunnerJob,
        progress: mpsc::Sender<ProgressSample>,
        cancel: CancellationToken,
    ) -> Result<(), RunnerError>;
}
