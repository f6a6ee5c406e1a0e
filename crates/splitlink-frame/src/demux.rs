use bytes::{BufMut, BytesMut};

use crate::codec::{decode_lossy, DecodedText, TerminatorMode, CR, EOF_BYTE, LF, SOF};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// One record recovered from the interleaved link stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A completed `SOF … EOF` log record, sentinels stripped.
    Frame(DecodedText),
    /// A completed interactive record, trailing CR LF included.
    Chunk(DecodedText),
    /// An end-of-frame byte arrived while no frame was open.
    FramingError,
}

impl Record {
    /// Decoded text of the record, if it carries any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Record::Frame(decoded) | Record::Chunk(decoded) => Some(decoded.text.as_str()),
            Record::FramingError => None,
        }
    }

    /// Number of bytes replaced while decoding this record.
    pub fn replaced(&self) -> usize {
        match self {
            Record::Frame(decoded) | Record::Chunk(decoded) => decoded.replaced,
            Record::FramingError => 0,
        }
    }
}

/// Bytes buffered for records that have not completed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub frame: usize,
    pub chunk: usize,
}

/// Splits one interleaved byte stream into framed and interactive records.
///
/// Bytes are consumed strictly one at a time with no lookahead. Inside a
/// frame every byte except `EOF_BYTE` is payload, including a repeated `SOF`.
/// Outside a frame bytes accumulate into the interactive chunk until a CR LF
/// completes it; a partial chunk survives any number of frames arriving in
/// between.
#[derive(Debug)]
pub struct Demultiplexer {
    mode: TerminatorMode,
    in_frame: bool,
    first_terminator_seen: bool,
    frame: BytesMut,
    chunk: BytesMut,
}

impl Default for Demultiplexer {
    fn default() -> Self {
        Self::new(TerminatorMode::default())
    }
}

impl Demultiplexer {
    pub fn new(mode: TerminatorMode) -> Self {
        Self {
            mode,
            in_frame: false,
            first_terminator_seen: false,
            frame: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            chunk: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Consume one byte, returning the record it completes, if any.
    pub fn push(&mut self, byte: u8) -> Option<Record> {
        if self.in_frame {
            if byte == EOF_BYTE {
                self.in_frame = false;
                let decoded = decode_lossy(&self.frame);
                self.frame.clear();
                return Some(Record::Frame(decoded));
            }
            self.frame.put_u8(byte);
            return None;
        }

        match byte {
            SOF => {
                self.in_frame = true;
                self.frame.clear();
                None
            }
            EOF_BYTE => Some(Record::FramingError),
            _ => {
                self.chunk.put_u8(byte);
                if byte == CR {
                    self.first_terminator_seen = true;
                    None
                } else if self.first_terminator_seen && byte == LF {
                    self.first_terminator_seen = false;
                    let decoded = decode_lossy(&self.chunk);
                    self.chunk.clear();
                    Some(Record::Chunk(decoded))
                } else {
                    if self.mode == TerminatorMode::Strict {
                        self.first_terminator_seen = false;
                    }
                    None
                }
            }
        }
    }

    /// Consume a run of bytes, appending completed records to `out` in order.
    ///
    /// Returns the number of records appended.
    pub fn feed(&mut self, bytes: &[u8], out: &mut Vec<Record>) -> usize {
        let before = out.len();
        out.extend(bytes.iter().filter_map(|&byte| self.push(byte)));
        out.len() - before
    }

    /// Whether a frame is currently open.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Whether a CR is waiting for its LF.
    pub fn terminator_armed(&self) -> bool {
        self.first_terminator_seen
    }

    pub fn pending(&self) -> Pending {
        Pending {
            frame: self.frame.len(),
            chunk: self.chunk.len(),
        }
    }

    pub fn mode(&self) -> TerminatorMode {
        self.mode
    }

    /// Drop any partially built frame or chunk and return to the idle state.
    ///
    /// Returns what was dropped. Partial records are never emitted.
    pub fn discard(&mut self) -> Pending {
        let dropped = self.pending();
        self.frame.clear();
        self.chunk.clear();
        self.in_frame = false;
        self.first_terminator_seen = false;
        dropped
    }
}
