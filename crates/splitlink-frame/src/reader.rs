use std::io::ErrorKind;

use splitlink_transport::ByteSource;
use tracing::debug;

use crate::codec::DemuxConfig;
use crate::demux::{Demultiplexer, Pending, Record};
use crate::error::{FrameError, Result};

/// Reads records from any [`ByteSource`].
///
/// Owns the demultiplexer state for one link. Partial records stay buffered
/// across polls; callers only ever see complete records.
pub struct RecordReader<T> {
    inner: T,
    demux: Demultiplexer,
    chunk: Vec<u8>,
    config: DemuxConfig,
}

impl<T: ByteSource> RecordReader<T> {
    /// Create a new record reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DemuxConfig::default())
    }

    /// Create a new record reader with explicit configuration.
    pub fn with_config(inner: T, config: DemuxConfig) -> Self {
        Self {
            inner,
            demux: Demultiplexer::new(config.terminator),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            config,
        }
    }

    /// Perform one bounded read and append every completed record to `out`.
    ///
    /// Returns the number of bytes read; `Ok(0)` means the poll window
    /// elapsed with no data. A source reporting end of stream yields
    /// [`FrameError::LinkClosed`]. Read errors leave the demultiplexer
    /// untouched.
    pub fn poll(&mut self, out: &mut Vec<Record>) -> Result<usize> {
        let read = self
            .inner
            .read_available(&mut self.chunk)
            .map_err(|err| match err.kind() {
                ErrorKind::UnexpectedEof => FrameError::LinkClosed,
                _ => FrameError::Io(err),
            })?;
        if read == 0 {
            return Ok(0);
        }

        let before = out.len();
        self.demux.feed(&self.chunk[..read], out);
        for record in &out[before..] {
            if record.replaced() > 0 {
                debug!(replaced = record.replaced(), "replaced undecodable bytes");
            }
        }
        Ok(read)
    }

    /// Drop any partially received record.
    pub fn discard_partial(&mut self) -> Pending {
        self.demux.discard()
    }

    /// Bytes buffered for records that have not completed yet.
    pub fn pending(&self) -> Pending {
        self.demux.pending()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }
}
