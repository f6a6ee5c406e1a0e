use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::Duration;

#[cfg(unix)]
use tracing::debug;

use crate::error::{Result, TransportError};

/// Default poll timeout for link reads.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Settings applied when opening a link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Line speed in baud. Ignored for socket bridges.
    pub baud_rate: u32,
    /// Enable RTS/CTS hardware flow control.
    pub hardware_flow_control: bool,
    /// Assert DTR after opening (DSR/DTR handshaking).
    pub dsr_dtr: bool,
    /// Upper bound for a single read to wait for data.
    pub read_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            hardware_flow_control: true,
            dsr_dtr: true,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A source of raw link bytes that never blocks indefinitely.
///
/// `read_available` waits at most the link's poll timeout and returns
/// `Ok(0)` when nothing arrived in that window. A source that knows its peer
/// has gone away reports `ErrorKind::UnexpectedEof`.
pub trait ByteSource: Send {
    fn read_available(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

/// An open serial link. Implements `Read`, `Write` and [`ByteSource`].
///
/// On Unix this is either a tty device configured through termios or a
/// Unix domain socket exposed by a serial bridge.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    #[cfg(unix)]
    Tty(std::fs::File),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    /// Never constructed; keeps the matches below exhaustive on targets
    /// without a link backend.
    #[cfg(not(unix))]
    #[allow(dead_code)]
    Unsupported,
}

#[cfg(not(unix))]
fn unsupported() -> std::io::Error {
    std::io::Error::new(ErrorKind::Unsupported, "serial links are unsupported on this platform")
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Tty(file) => file.read(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
            #[cfg(not(unix))]
            LinkStreamInner::Unsupported => Err(unsupported()),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Tty(file) => file.write(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
            #[cfg(not(unix))]
            LinkStreamInner::Unsupported => Err(unsupported()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Tty(file) => file.flush(),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
            #[cfg(not(unix))]
            LinkStreamInner::Unsupported => Err(unsupported()),
        }
    }
}

impl ByteSource for LinkStream {
    /// A tty configured with `VMIN = 0` returns `Ok(0)` when its poll timeout
    /// expires. A socket reports that as `WouldBlock`, so `Ok(0)` from a
    /// socket is end of stream and comes back as `UnexpectedEof`.
    fn read_available(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.read(buf) {
            Ok(0) if !buf.is_empty() && self.is_socket() => Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "link closed by peer",
            )),
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }
}

impl LinkStream {
    /// Open the link at `path`.
    ///
    /// Unix domain sockets are connected to directly; anything else is opened
    /// as a tty and configured from `config`.
    #[cfg(unix)]
    pub fn open(path: impl AsRef<Path>, config: &LinkConfig) -> Result<Self> {
        use std::os::unix::fs::FileTypeExt;

        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.file_type().is_socket() {
            debug!(?path, "connecting to socket bridge");
            let stream = std::os::unix::net::UnixStream::connect(path).map_err(|source| {
                TransportError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            let link = Self::from_unix(stream);
            link.set_read_timeout(Some(config.read_timeout))?;
            return Ok(link);
        }

        let file = crate::tty::open_tty(path, config)?;
        Ok(Self {
            inner: LinkStreamInner::Tty(file),
        })
    }

    /// Open the link at `path`.
    #[cfg(not(unix))]
    pub fn open(path: impl AsRef<Path>, config: &LinkConfig) -> Result<Self> {
        let _ = (path, config);
        Err(TransportError::Unsupported)
    }

    /// Wrap an already-connected Unix domain socket.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Set the read timeout. Tty links carry their timeout in termios and
    /// ignore this call.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Tty(_) => Ok(()),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(not(unix))]
            LinkStreamInner::Unsupported => {
                let _ = timeout;
                Err(TransportError::Unsupported)
            }
        }
    }

    /// Try to clone this link (creates a new file descriptor).
    ///
    /// Used to split the link into a reading half for the worker thread and
    /// a writing half for outbound commands.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Tty(file) => Ok(Self {
                inner: LinkStreamInner::Tty(file.try_clone()?),
            }),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
            #[cfg(not(unix))]
            LinkStreamInner::Unsupported => Err(TransportError::Unsupported),
        }
    }

    /// Short description of the link kind, for logs and status lines.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Tty(_) => "tty",
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => "socket",
            #[cfg(not(unix))]
            LinkStreamInner::Unsupported => "unsupported",
        }
    }

    fn is_socket(&self) -> bool {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("type", &self.kind())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{Read, Write};
    use std::os::unix::net::{UnixListener, UnixStream};
    use std::time::Duration;

    use super::*;

    #[test]
    fn read_available_maps_timeout_to_zero() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut link = LinkStream::from_unix(left);
        link.set_read_timeout(Some(Duration::from_millis(10))).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(link.read_available(&mut buf).unwrap(), 0);
    }

    #[test]
    fn read_available_reports_peer_hang_up() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut link = LinkStream::from_unix(left);
        link.set_read_timeout(Some(Duration::from_millis(10))).unwrap();
        drop(right);

        let mut buf = [0u8; 16];
        let err = link.read_available(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn cloned_halves_share_the_connection() {
        let (left, mut right) = UnixStream::pair().unwrap();
        let link = LinkStream::from_unix(left);
        let mut writer = link.try_clone().unwrap();
        let mut reader = link;

        writer.write_all(b"ping\r\n").unwrap();
        let mut got = [0u8; 6];
        right.read_exact(&mut got).unwrap();
        assert_eq!(&got, b"ping\r\n");

        right.write_all(b"pong").unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn open_connects_to_socket_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let sock_path = dir.path().join("bridge.sock");
        let listener = UnixListener::bind(&sock_path).unwrap();

        let link = LinkStream::open(&sock_path, &LinkConfig::default()).unwrap();
        let (_peer, _) = listener.accept().unwrap();
        assert_eq!(link.kind(), "socket");
    }

    #[test]
    fn open_missing_path_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ttyMISSING0");

        let err = LinkStream::open(&missing, &LinkConfig::default()).unwrap_err();
        match err {
            TransportError::Open { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_config_matches_console_defaults() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert!(cfg.hardware_flow_control);
        assert!(cfg.dsr_dtr);
        assert_eq!(cfg.read_timeout, DEFAULT_READ_TIMEOUT);
    }
}
