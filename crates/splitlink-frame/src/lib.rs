//! Record demultiplexing for serial consoles.
//!
//! A console link carries two interleaved streams on one wire:
//! - framed log records: `SOF (0x01)` payload `EOF (0x04)`
//! - interactive command/response text, one record per `CR LF`
//!
//! The [`Demultiplexer`] separates them byte by byte; [`RecordReader`] drives
//! it from a link and [`CommandWriter`] sends commands the other way.

pub mod codec;
pub mod demux;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_lossy, encode_command, encode_frame, DecodedText, DemuxConfig, TerminatorMode, CR,
    DEFAULT_READ_CHUNK, EOF_BYTE, LF, REPLACEMENT, SOF, TERMINATOR,
};
pub use demux::{Demultiplexer, Pending, Record};
pub use error::{FrameError, Result};
pub use reader::RecordReader;
pub use writer::CommandWriter;
