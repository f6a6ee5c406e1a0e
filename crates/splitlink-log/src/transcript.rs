use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{LogError, Result};
use crate::store::MessageStore;

/// Default file name prefix for saved transcripts.
pub const DEFAULT_PREFIX: &str = "silabs";

/// `strftime` pattern used to qualify saved file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A persisted log, split into the records it will replay as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    path: PathBuf,
    lines: Vec<String>,
}

impl Transcript {
    /// Read a UTF-8 transcript from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LogError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let transcript = Self::from_text(path, &content);
        debug!(?path, records = transcript.len(), "transcript read");
        Ok(transcript)
    }

    /// Split transcript text into records.
    ///
    /// Every line that is not blank becomes one record and keeps its own
    /// text followed by `\n`, exactly as a live frame ending in a newline
    /// would arrive.
    pub fn from_text(path: impl Into<PathBuf>, content: &str) -> Self {
        let lines = content
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("{line}\n"))
            .collect();
        Self {
            path: path.into(),
            lines,
        }
    }

    /// Classify every record into a fresh store.
    pub fn to_store(&self) -> MessageStore {
        let mut store = MessageStore::new();
        for line in &self.lines {
            store.append(line.as_str());
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Read and classify a transcript into a fresh store.
///
/// Either the whole file is loaded or an error is returned; no partially
/// populated store ever escapes.
pub fn load(path: impl AsRef<Path>) -> Result<MessageStore> {
    Ok(Transcript::read(path)?.to_store())
}

/// Paths written by [`save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTranscript {
    pub log_path: PathBuf,
    pub interactive_path: PathBuf,
}

/// File names for a transcript pair saved at `timestamp`.
pub fn transcript_file_names(prefix: &str, timestamp: &DateTime<Local>) -> (String, String) {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    (
        format!("{prefix}_logs_{stamp}.txt"),
        format!("{prefix}_interactive_{stamp}.txt"),
    )
}

/// Save the log history and the interactive history next to each other in
/// `dir`, named after the current local time.
pub fn save(store: &MessageStore, dir: impl AsRef<Path>, prefix: &str) -> Result<SavedTranscript> {
    save_at(store, dir, prefix, &Local::now())
}

/// [`save`] with an explicit timestamp.
///
/// Both files are staged as temporaries in `dir` and renamed into place; if
/// the second rename fails the first file is removed again, so either both
/// files exist afterwards or neither does.
pub fn save_at(
    store: &MessageStore,
    dir: impl AsRef<Path>,
    prefix: &str,
    timestamp: &DateTime<Local>,
) -> Result<SavedTranscript> {
    let dir = dir.as_ref();
    let (log_name, interactive_name) = transcript_file_names(prefix, timestamp);
    let log_path = dir.join(log_name);
    let interactive_path = dir.join(interactive_name);

    let log_file = stage(dir, &log_path, |out| {
        for message in store.messages() {
            out.write_all(message.text.as_bytes())?;
            // Keep every record on its own line so it reloads as one record.
            if !message.text.ends_with('\n') {
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    })?;
    let interactive_file = stage(dir, &interactive_path, |out| {
        out.write_all(store.interactive().as_bytes())
    })?;

    log_file.persist(&log_path).map_err(|err| LogError::Save {
        path: log_path.clone(),
        source: err.error,
    })?;
    if let Err(err) = interactive_file.persist(&interactive_path) {
        if let Err(cleanup) = std::fs::remove_file(&log_path) {
            warn!(path = ?log_path, error = %cleanup, "could not remove orphaned log file");
        }
        return Err(LogError::Save {
            path: interactive_path,
            source: err.error,
        });
    }

    info!(
        log = ?log_path,
        interactive = ?interactive_path,
        records = store.len(),
        "transcript saved"
    );
    Ok(SavedTranscript {
        log_path,
        interactive_path,
    })
}

fn stage(
    dir: &Path,
    target: &Path,
    write: impl FnOnce(&mut NamedTempFile) -> std::io::Result<()>,
) -> Result<NamedTempFile> {
    let save_err = |source| LogError::Save {
        path: target.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(save_err)?;
    write(&mut file).map_err(save_err)?;
    file.as_file().sync_all().map_err(save_err)?;
    Ok(file)
}
