//! Classification, storage and replay of console log records.
//!
//! - [`classify`] maps record text to a severity [`Category`] and an optional
//!   subsystem [`Module`]
//! - [`MessageStore`] keeps the append-only history; [`FilterState`] projects
//!   it for display
//! - [`transcript`] saves the history to disk and loads it back through the
//!   same classification path as live data

pub mod classify;
pub mod error;
pub mod filter;
pub mod store;
pub mod transcript;

pub use classify::{category_of, classify, module_of, Category, Classification, Module};
pub use error::{LogError, Result};
pub use filter::FilterState;
pub use store::{ClassifiedMessage, MessageStore, Visible};
pub use transcript::{
    load, save, save_at, transcript_file_names, SavedTranscript, Transcript, DEFAULT_PREFIX,
    TIMESTAMP_FORMAT,
};
