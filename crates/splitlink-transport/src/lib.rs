//! Serial link transport.
//!
//! Opens the physical byte source/sink behind a console session:
//! - tty devices (raw 8N1, optional RTS/CTS flow control, DTR handshake)
//! - Unix domain sockets exposed by serial bridges and simulators
//!
//! This is the lowest layer of splitlink. Everything else builds on top of
//! the [`LinkStream`] type and the [`ByteSource`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(unix)]
mod tty;

pub use error::{Result, TransportError};
pub use traits::{ByteSource, LinkConfig, LinkStream, DEFAULT_READ_TIMEOUT};
