use std::fmt;
use std::io;

use splitlink_frame::FrameError;
use splitlink_log::LogError;
use splitlink_session::SessionError;
use splitlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(err.kind()), format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. }
        | TransportError::Configure { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::UnsupportedBaudRate(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::NonAsciiCommand { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed | FrameError::LinkClosed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn log_error(context: &str, err: LogError) -> CliError {
    match err {
        LogError::UnknownCategory(_) | LogError::UnknownModule(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        LogError::Save { ref source, .. } | LogError::Load { ref source, .. } => {
            CliError::new(io_code(source.kind()), format!("{context}: {err}"))
        }
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Log(err) => log_error(context, err),
        SessionError::Spawn(source) => {
            CliError::new(INTERNAL, format!("{context}: failed to start reader: {source}"))
        }
        SessionError::LinkLost(_) => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn unknown_filter_names_are_usage_errors() {
        let err = log_error("bad --hide", LogError::UnknownCategory("loud".into()));
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("loud"));
    }

    #[test]
    fn missing_transcript_is_a_failure() {
        let err = session_error(
            "load failed",
            SessionError::Log(LogError::Load {
                path: PathBuf::from("/nope.txt"),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("/nope.txt"));
    }

    #[test]
    fn non_utf8_transcript_is_invalid_data() {
        let err = log_error(
            "load failed",
            LogError::Load {
                path: PathBuf::from("x.txt"),
                source: io::Error::from(io::ErrorKind::InvalidData),
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn open_failures_map_to_transport_or_permission() {
        let denied = transport_error(
            "connect failed",
            TransportError::Open {
                path: PathBuf::from("/dev/ttyACM0"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(denied.code, PERMISSION_DENIED);

        let busy = transport_error(
            "connect failed",
            TransportError::Open {
                path: PathBuf::from("/dev/ttyACM0"),
                source: io::Error::other("device busy"),
            },
        );
        assert_eq!(busy.code, TRANSPORT_ERROR);
    }

    #[test]
    fn non_ascii_command_is_invalid_data() {
        let err = frame_error("send failed", FrameError::NonAsciiCommand { offset: 2 });
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn closed_link_is_a_transport_error() {
        let err = frame_error("send failed", FrameError::LinkClosed);
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.contains("closed by peer"));

        let lost = session_error("monitor", SessionError::LinkLost("/dev/ttyACM0".into()));
        assert_eq!(lost.code, TRANSPORT_ERROR);
    }

    #[test]
    fn mode_conflicts_are_failures() {
        let err = session_error("connect failed", SessionError::ReplayActive("a.txt".into()));
        assert_eq!(err.code, FAILURE);
    }
}
