use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use splitlink_frame::{CommandWriter, Record, RecordReader};
use splitlink_log::{Category, FilterState, MessageStore, Module, SavedTranscript};
use splitlink_transport::{ByteSource, LinkConfig, LinkStream};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::sink::Sink;
use crate::worker::{LinkEvent, Pacing, Worker};

/// Notice shown in the interactive pane when an end-of-frame byte arrives
/// outside a frame.
pub const FRAMING_ERROR_NOTICE: &str = "Framing error occurred\n";

/// What the session is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No link and no transcript.
    Disconnected,
    /// Records stream in from a live link.
    Live,
    /// A saved transcript is loaded read-only.
    Replay,
}

struct LiveLink {
    label: String,
    worker: Worker,
    writer: CommandWriter<Box<dyn Write + Send>>,
    events: Receiver<LinkEvent>,
}

/// A console session: the message store, the display filter, and at most
/// one of a live link or a loaded transcript.
///
/// All store and filter mutation happens on the thread that owns the
/// session. The reader thread only produces [`LinkEvent`]s, which are
/// applied in order by [`pump`](Session::pump).
pub struct Session {
    config: SessionConfig,
    store: MessageStore,
    filter: FilterState,
    live: Option<LiveLink>,
    replay: Option<PathBuf>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: MessageStore::new(),
            filter: FilterState::default(),
            live: None,
            replay: None,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.live.is_some() {
            Mode::Live
        } else if self.replay.is_some() {
            Mode::Replay
        } else {
            Mode::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.live.is_some()
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Label of the attached link, if any.
    pub fn link_label(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.label.as_str())
    }

    /// Path of the loaded transcript, if any.
    pub fn replay_path(&self) -> Option<&Path> {
        self.replay.as_deref()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a serial device or socket and attach it as the live link.
    pub fn open(&mut self, path: impl AsRef<Path>, link: &LinkConfig) -> Result<()> {
        self.check_can_connect()?;
        let path = path.as_ref();
        let stream = LinkStream::open(path, link)?;
        self.connect_link(stream, path.display().to_string())
    }

    /// Attach an already open link, splitting it into reader and writer.
    pub fn connect_link(&mut self, stream: LinkStream, label: impl Into<String>) -> Result<()> {
        self.check_can_connect()?;
        let writer = stream.try_clone()?;
        self.connect(stream, writer, label)
    }

    /// Attach a live link built from a byte source and a command sink.
    ///
    /// Rejected while a transcript is loaded or another link is attached.
    pub fn connect<S, W>(&mut self, source: S, writer: W, label: impl Into<String>) -> Result<()>
    where
        S: ByteSource + 'static,
        W: Write + Send + 'static,
    {
        self.check_can_connect()?;
        let label = label.into();

        let (tx, rx) = crossbeam_channel::unbounded();
        let reader = RecordReader::with_config(source, self.config.demux.clone());
        let pacing = Pacing {
            idle_backoff: self.config.idle_backoff,
            error_backoff: self.config.error_backoff,
        };
        let worker = Worker::spawn(reader, tx, pacing)?;

        info!(link = %label, "connected");
        self.live = Some(LiveLink {
            label,
            worker,
            writer: CommandWriter::new(Box::new(writer)),
            events: rx,
        });
        Ok(())
    }

    fn check_can_connect(&self) -> Result<()> {
        if let Some(path) = &self.replay {
            return Err(SessionError::ReplayActive(path.display().to_string()));
        }
        if let Some(live) = &self.live {
            return Err(SessionError::AlreadyConnected(live.label.clone()));
        }
        Ok(())
    }

    /// Stop the reader thread and release the link.
    ///
    /// Records the thread emitted before it stopped are still applied. Bytes
    /// of an unfinished frame or line are dropped.
    pub fn disconnect(&mut self, sink: &mut dyn Sink) -> Result<()> {
        let mut live = self.live.take().ok_or(SessionError::NotConnected)?;
        if !live.worker.stop(self.config.shutdown_timeout) {
            sink.error("reader thread did not stop in time");
        }

        let mut drained = 0;
        for event in live.events.try_iter() {
            self.apply(event, sink);
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "applied events queued before disconnect");
        }

        info!(link = %live.label, "disconnected");
        sink.status(&format!("Disconnected from {}", live.label));
        Ok(())
    }

    /// Apply events from the reader thread.
    ///
    /// Waits up to `timeout` for the first event, then applies everything
    /// already queued without blocking. Returns the number of events
    /// applied. Without a live link this returns `Ok(0)` immediately.
    pub fn pump(&mut self, sink: &mut dyn Sink, timeout: Duration) -> Result<usize> {
        let Some(live) = &self.live else {
            return Ok(0);
        };

        let mut batch = Vec::new();
        match live.events.recv_timeout(timeout) {
            Ok(event) => batch.push(event),
            Err(RecvTimeoutError::Timeout) => return Ok(0),
            Err(RecvTimeoutError::Disconnected) => return self.reader_gone(sink),
        }
        batch.extend(live.events.try_iter());

        let applied = batch.len();
        for event in batch {
            self.apply(event, sink);
        }
        Ok(applied)
    }

    fn reader_gone(&mut self, sink: &mut dyn Sink) -> Result<usize> {
        let mut live = self.live.take().ok_or(SessionError::NotConnected)?;
        warn!(link = %live.label, "reader thread exited; dropping link");
        live.worker.stop(self.config.shutdown_timeout);
        sink.status(&format!("Disconnected from {}", live.label));
        Err(SessionError::LinkLost(live.label))
    }

    fn apply(&mut self, event: LinkEvent, sink: &mut dyn Sink) {
        match event {
            LinkEvent::Record(Record::Frame(decoded)) => {
                let message = self.store.append(decoded.text);
                if self.filter.admits(message) {
                    sink.log(message);
                }
            }
            LinkEvent::Record(Record::Chunk(decoded)) => {
                self.store.append_interactive(&decoded.text);
                sink.interactive(&decoded.text);
            }
            LinkEvent::Record(Record::FramingError) => {
                self.store.append_interactive(FRAMING_ERROR_NOTICE);
                sink.interactive(FRAMING_ERROR_NOTICE);
            }
            LinkEvent::ReadError(message) => {
                sink.error(&format!("Error reading serial: {message}"));
            }
        }
    }

    /// Send a command over the live link and echo it to the interactive
    /// pane.
    ///
    /// Surrounding whitespace is trimmed; an empty command is ignored and
    /// returns `Ok(false)`.
    pub fn send_command(&mut self, command: &str, sink: &mut dyn Sink) -> Result<bool> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(false);
        }
        if let Some(path) = &self.replay {
            return Err(SessionError::ReplayActive(path.display().to_string()));
        }
        let live = self.live.as_mut().ok_or(SessionError::NotConnected)?;

        live.writer.send(command)?;
        debug!(command, "command sent");

        let echo = format!("> {command}\n");
        self.store.append_interactive(&echo);
        sink.interactive(&echo);
        Ok(true)
    }

    /// Write the log and interactive histories to the configured directory.
    pub fn save(&self) -> Result<SavedTranscript> {
        if let Some(path) = &self.replay {
            return Err(SessionError::ReplayActive(path.display().to_string()));
        }
        let saved = splitlink_log::save(
            &self.store,
            &self.config.transcript_dir,
            &self.config.transcript_prefix,
        )?;
        Ok(saved)
    }

    /// Load a transcript and switch to replay mode.
    ///
    /// The file is read and classified before anything else changes; on
    /// failure the session is left exactly as it was. A live link is
    /// disconnected first. The interactive history carries over.
    pub fn load_replay(&mut self, path: impl AsRef<Path>, sink: &mut dyn Sink) -> Result<usize> {
        let path = path.as_ref();
        if let Some(current) = &self.replay {
            return Err(SessionError::ReplayActive(current.display().to_string()));
        }

        let mut loaded = splitlink_log::load(path)?;

        if self.live.is_some() {
            self.disconnect(sink)?;
        }
        loaded.append_interactive(self.store.interactive());
        self.store = loaded;
        self.replay = Some(path.to_path_buf());

        let records = self.store.len();
        info!(?path, records, "replay loaded");
        self.rerender(sink);
        sink.status(&format!(
            "Loaded: {} (Replay Mode - Read Only)",
            path.display()
        ));
        Ok(records)
    }

    /// Leave replay mode, discarding the loaded history.
    pub fn close_replay(&mut self, sink: &mut dyn Sink) -> Result<()> {
        let path = self.replay.take().ok_or(SessionError::NotInReplay)?;
        self.store.reset();
        sink.clear_log();
        sink.clear_interactive();
        info!(?path, "replay closed");
        sink.status("Exited replay mode");
        Ok(())
    }

    /// Flip a category filter, re-render the log pane and report the
    /// categories now on display.
    pub fn toggle_category(&mut self, category: Category, sink: &mut dyn Sink) -> bool {
        let enabled = self.filter.toggle_category(category);
        self.rerender(sink);
        sink.status(&self.filter.category_summary());
        enabled
    }

    /// Flip a module filter, re-render the log pane and report the modules
    /// now on display.
    pub fn toggle_module(&mut self, module: Module, sink: &mut dyn Sink) -> bool {
        let enabled = self.filter.toggle_module(module);
        self.rerender(sink);
        sink.status(&self.filter.module_summary());
        enabled
    }

    /// Enable or disable every module, re-render the log pane and report
    /// the result.
    pub fn set_all_modules(&mut self, enabled: bool, sink: &mut dyn Sink) {
        self.filter.set_all_modules(enabled);
        self.rerender(sink);
        sink.status(&self.filter.module_summary());
    }

    /// Replace the whole filter and re-render the log pane.
    pub fn set_filter(&mut self, filter: FilterState, sink: &mut dyn Sink) {
        self.filter = filter;
        self.rerender(sink);
    }

    /// Clear the log pane and redraw every message the filter admits.
    pub fn rerender(&self, sink: &mut dyn Sink) {
        sink.clear_log();
        for message in self.store.visible(&self.filter) {
            sink.log(message);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.worker.stop(self.config.shutdown_timeout);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode())
            .field("link", &self.link_label())
            .field("replay", &self.replay_path())
            .field("records", &self.store.len())
            .finish()
    }
}
