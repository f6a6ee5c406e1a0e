use serde::Serialize;

use crate::classify::{classify, Category, Module};
use crate::filter::FilterState;

/// A stored log record with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedMessage {
    /// Arrival index, starting at zero after each reset.
    pub sequence: u64,
    pub text: String,
    pub category: Category,
    pub module: Option<Module>,
}

/// Append-only history of classified log records plus the interactive pane.
///
/// Nothing is ever removed except by [`reset`](MessageStore::reset); filtered
/// views are recomputed from the full history on every call to
/// [`visible`](MessageStore::visible).
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    messages: Vec<ClassifiedMessage>,
    interactive: String,
    next_sequence: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `text`, assign the next sequence number and store it.
    pub fn append(&mut self, text: impl Into<String>) -> &ClassifiedMessage {
        let text = text.into();
        let classification = classify(&text);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.messages.push(ClassifiedMessage {
            sequence,
            text,
            category: classification.category,
            module: classification.module,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Append text to the interactive history.
    pub fn append_interactive(&mut self, text: &str) {
        self.interactive.push_str(text);
    }

    /// Messages admitted by `filter`, in arrival order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn visible<'a>(&'a self, filter: &'a FilterState) -> Visible<'a> {
        Visible {
            inner: self.messages.iter(),
            filter,
        }
    }

    /// Drop every message and the interactive history; sequence numbers
    /// restart at zero.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.interactive.clear();
        self.next_sequence = 0;
    }

    /// The full, unfiltered history.
    pub fn messages(&self) -> &[ClassifiedMessage] {
        &self.messages
    }

    pub fn interactive(&self) -> &str {
        &self.interactive
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Filtered view over a [`MessageStore`].
#[derive(Debug, Clone)]
pub struct Visible<'a> {
    inner: std::slice::Iter<'a, ClassifiedMessage>,
    filter: &'a FilterState,
}

impl<'a> Iterator for Visible<'a> {
    type Item = &'a ClassifiedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        self.inner.by_ref().find(|message| filter.admits(message))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
