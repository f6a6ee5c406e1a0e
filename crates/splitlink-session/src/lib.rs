//! Console session management for splitlink.
//!
//! A [`Session`] owns the message store and display filter and is in one of
//! three [`Mode`]s: disconnected, live (a background [`Worker`] thread reads
//! the link and hands [`LinkEvent`]s over an ordered channel) or replay (a
//! saved transcript is shown read-only). Live and replay never overlap.
//!
//! Display is pushed through a [`Sink`], so the same session drives a
//! terminal, a test recorder or anything else that can show text.

pub mod config;
pub mod error;
pub mod session;
pub mod sink;
pub mod worker;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use session::{Mode, Session, FRAMING_ERROR_NOTICE};
pub use sink::{NullSink, Sink};
pub use worker::{LinkEvent, Pacing, Worker};
