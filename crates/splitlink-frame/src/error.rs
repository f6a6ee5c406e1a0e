/// Errors that can occur while reading records or writing commands.
///
/// Malformed link input is never an error here: stray end-of-frame bytes are
/// surfaced as [`Record::FramingError`](crate::Record::FramingError) and
/// undecodable bytes are replaced during decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The outbound command contains bytes outside the ASCII range.
    #[error("command is not ASCII (first offending byte at offset {offset})")]
    NonAsciiCommand { offset: usize },

    /// An I/O error occurred while reading from or writing to the link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the link; no further reads will succeed.
    #[error("link closed by peer")]
    LinkClosed,

    /// The link accepted zero bytes of an outbound write.
    #[error("link closed while writing")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
