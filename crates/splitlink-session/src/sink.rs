use splitlink_log::ClassifiedMessage;

/// Display surface fed by a [`Session`](crate::Session).
///
/// `log` only ever receives messages admitted by the current filter. After a
/// filter change or a replay load the log pane is cleared and re-rendered
/// from the full history.
pub trait Sink {
    /// Display one visible log record.
    fn log(&mut self, message: &ClassifiedMessage);

    /// Append text to the interactive pane.
    fn interactive(&mut self, text: &str);

    /// Report a non-fatal error.
    fn error(&mut self, message: &str);

    /// Show a transient status line.
    fn status(&mut self, _message: &str) {}

    /// Clear the log pane before a re-render.
    fn clear_log(&mut self) {}

    /// Clear the interactive pane.
    fn clear_interactive(&mut self) {}
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn log(&mut self, _message: &ClassifiedMessage) {}

    fn interactive(&mut self, _text: &str) {}

    fn error(&mut self, _message: &str) {}
}
