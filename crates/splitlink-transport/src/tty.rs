use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::LinkConfig;

/// Open a tty device in raw 8N1 mode with the settings from `config`.
///
/// The device is opened non-blocking so a missing carrier cannot stall the
/// open call, then switched back to blocking reads bounded by `VTIME`.
pub(crate) fn open_tty(path: &Path, config: &LinkConfig) -> Result<File> {
    let speed = baud_constant(config.baud_rate)?;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(path)
        .map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let fd = file.as_raw_fd();
    let configure_err = |source: io::Error| TransportError::Configure {
        path: path.to_path_buf(),
        source,
    };

    // SAFETY: `termios` is a plain C struct; it is fully populated by
    // `tcgetattr` before any field is read.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `fd` is an open descriptor owned by `file`, `tio` is writable.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(configure_err(io::Error::last_os_error()));
    }

    // SAFETY: `tio` was initialised by `tcgetattr` above.
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag |= libc::CREAD | libc::CLOCAL;
    tio.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    tio.c_cflag |= libc::CS8;
    if config.hardware_flow_control {
        tio.c_cflag |= libc::CRTSCTS;
    } else {
        tio.c_cflag &= !libc::CRTSCTS;
    }
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = vtime_deciseconds(config.read_timeout);

    // SAFETY: `tio` is a valid termios value and `speed` a valid speed constant.
    let rc = unsafe {
        libc::cfsetispeed(&mut tio, speed) | libc::cfsetospeed(&mut tio, speed)
    };
    if rc != 0 {
        return Err(configure_err(io::Error::last_os_error()));
    }

    // SAFETY: `fd` is open and `tio` is a fully initialised termios value.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(configure_err(io::Error::last_os_error()));
    }

    // SAFETY: plain fcntl flag manipulation on an owned descriptor.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(configure_err(io::Error::last_os_error()));
    }

    if config.dsr_dtr {
        let bits: libc::c_int = libc::TIOCM_DTR;
        // SAFETY: TIOCMBIS reads one c_int through the provided pointer.
        if unsafe { libc::ioctl(fd, libc::TIOCMBIS, &bits as *const libc::c_int) } != 0 {
            // Pseudo-terminals reject modem-control ioctls.
            warn!(?path, error = %io::Error::last_os_error(), "could not assert DTR");
        }
    }

    debug!(
        ?path,
        baud = config.baud_rate,
        rtscts = config.hardware_flow_control,
        "tty configured"
    );
    Ok(file)
}

fn baud_constant(rate: u32) -> Result<libc::speed_t> {
    let speed = match rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        #[cfg(target_os = "linux")]
        460_800 => libc::B460800,
        #[cfg(target_os = "linux")]
        921_600 => libc::B921600,
        other => return Err(TransportError::UnsupportedBaudRate(other)),
    };
    Ok(speed)
}

/// `VTIME` is expressed in tenths of a second and saturates at 25.5s.
fn vtime_deciseconds(timeout: Duration) -> libc::cc_t {
    timeout.as_millis().div_ceil(100).min(255) as libc::cc_t
}
