use std::path::PathBuf;
use std::time::Duration;

use splitlink_frame::DemuxConfig;
use splitlink_log::DEFAULT_PREFIX;

/// Configuration for a console session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Record demultiplexing settings for the reader thread.
    pub demux: DemuxConfig,
    /// Pause after a poll that returned no bytes.
    pub idle_backoff: Duration,
    /// Pause after a failed read before polling again.
    pub error_backoff: Duration,
    /// How long disconnect waits for the reader thread to exit.
    pub shutdown_timeout: Duration,
    /// Directory saved transcripts are written to.
    pub transcript_dir: PathBuf,
    /// File name prefix for saved transcripts.
    pub transcript_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            demux: DemuxConfig::default(),
            idle_backoff: Duration::from_millis(10),
            error_backoff: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(1),
            transcript_dir: PathBuf::from("."),
            transcript_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}
