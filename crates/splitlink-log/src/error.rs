use std::path::PathBuf;

/// Errors that can occur while parsing filter names or persisting transcripts.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The name does not match any severity category.
    #[error("unknown category '{0}' (expected error, warn, info, detail or silabs)")]
    UnknownCategory(String),

    /// The name does not match any module tag.
    #[error("unknown module '{0}' (expected zcl, dl, im, ot, svr, dis, swu or tst)")]
    UnknownModule(String),

    /// A transcript file could not be written.
    #[error("failed to save transcript {path}: {source}")]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A transcript file could not be read.
    #[error("failed to load transcript {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LogError>;
