/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] splitlink_transport::TransportError),

    /// Record or command encoding error.
    #[error("link error: {0}")]
    Frame(#[from] splitlink_frame::FrameError),

    /// Transcript persistence error.
    #[error("transcript error: {0}")]
    Log(#[from] splitlink_log::LogError),

    /// A live link is already attached.
    #[error("already connected to {0}")]
    AlreadyConnected(String),

    /// The operation needs a live link.
    #[error("not connected")]
    NotConnected,

    /// The reader thread stopped on its own, usually because the peer
    /// closed the link. The session is disconnected.
    #[error("link to {0} lost")]
    LinkLost(String),

    /// The operation is unavailable while viewing a saved transcript.
    #[error("not available in replay mode ({0})")]
    ReplayActive(String),

    /// `close_replay` was called outside replay mode.
    #[error("not in replay mode")]
    NotInReplay,

    /// The reader thread could not be started.
    #[error("failed to start reader thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
