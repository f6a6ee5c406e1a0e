//! Serial console for firmware that multiplexes framed log records and an
//! interactive shell over one link.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial device and socket links
//! - [`frame`]: record demultiplexing and command encoding
//! - [`log`]: classification, filtering and transcripts
//! - [`session`]: background reader and live/replay session state

/// Re-export transport types.
pub mod transport {
    pub use splitlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use splitlink_frame::*;
}

/// Re-export log types.
pub mod log {
    pub use splitlink_log::*;
}

/// Re-export session types.
pub mod session {
    pub use splitlink_session::*;
}
