use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Start-of-frame sentinel.
pub const SOF: u8 = 0x01;

/// End-of-frame sentinel.
pub const EOF_BYTE: u8 = 0x04;

/// First byte of the interactive line terminator.
pub const CR: u8 = b'\r';

/// Second byte of the interactive line terminator.
pub const LF: u8 = b'\n';

/// Interactive line terminator, appended to outbound commands.
pub const TERMINATOR: [u8; 2] = [CR, LF];

/// Character substituted for bytes outside the ASCII range.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Default size of a single link read.
pub const DEFAULT_READ_CHUNK: usize = 4 * 1024;

/// How a CR in the unframed stream arms the LF that ends an interactive record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TerminatorMode {
    /// A CR arms the terminator until the next LF, however many unframed
    /// bytes arrive in between. Matches the firmware console tooling.
    #[default]
    Lenient,
    /// Only an LF that is the very next unframed byte after a CR terminates
    /// the record; any other unframed byte disarms it.
    Strict,
}

/// Configuration for record demultiplexing.
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// Terminator matching rule for interactive records.
    pub terminator: TerminatorMode,
    /// Maximum bytes pulled from the link per read.
    pub read_chunk_size: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            terminator: TerminatorMode::default(),
            read_chunk_size: DEFAULT_READ_CHUNK,
        }
    }
}

/// Text decoded from a record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// The decoded text, with every non-ASCII byte replaced.
    pub text: String,
    /// How many bytes were replaced with [`REPLACEMENT`].
    pub replaced: usize,
}

/// Decode a payload as ASCII, replacing each byte above 0x7F.
///
/// Never fails; each offending byte becomes one [`REPLACEMENT`] character.
pub fn decode_lossy(payload: &[u8]) -> DecodedText {
    let mut replaced = 0usize;
    let text = payload
        .iter()
        .map(|&byte| {
            if byte.is_ascii() {
                char::from(byte)
            } else {
                replaced += 1;
                REPLACEMENT
            }
        })
        .collect();
    DecodedText { text, replaced }
}

/// Encode a framed log record into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────────┬──────────┐
/// │ SOF 0x01 │ payload (ASCII)  │ EOF 0x04 │
/// └──────────┴──────────────────┴──────────┘
/// ```
///
/// The console only ever decodes frames; this exists for device simulators
/// and tests.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() + 2);
    dst.put_u8(SOF);
    dst.put_slice(payload);
    dst.put_u8(EOF_BYTE);
}

/// Encode an outbound console command: ASCII text followed by CR LF.
pub fn encode_command(command: &str, dst: &mut BytesMut) -> Result<()> {
    if let Some(offset) = command.bytes().position(|b| !b.is_ascii()) {
        return Err(FrameError::NonAsciiCommand { offset });
    }
    dst.reserve(command.len() + TERMINATOR.len());
    dst.put_slice(command.as_bytes());
    dst.put_slice(&TERMINATOR);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_ascii() {
        let decoded = decode_lossy(b"[info] boot ok\r\n");
        assert_eq!(decoded.text, "[info] boot ok\r\n");
        assert_eq!(decoded.replaced, 0);
    }

    #[test]
    fn decode_replaces_each_high_byte() {
        let decoded = decode_lossy(&[b'a', 0xC3, 0xA9, b'b', 0xFF]);
        assert_eq!(decoded.text, "a\u{FFFD}\u{FFFD}b\u{FFFD}");
        assert_eq!(decoded.replaced, 3);
    }

    #[test]
    fn encode_frame_wraps_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf);
        assert_eq!(buf.as_ref(), b"\x01hello\x04");
    }

    #[test]
    fn encode_command_appends_terminator() {
        let mut buf = BytesMut::new();
        encode_command("ot state", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"ot state\r\n");
    }

    #[test]
    fn encode_command_rejects_non_ascii() {
        let mut buf = BytesMut::new();
        let err = encode_command("caf\u{e9}", &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::NonAsciiCommand { offset: 3 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn default_config_is_lenient() {
        let cfg = DemuxConfig::default();
        assert_eq!(cfg.terminator, TerminatorMode::Lenient);
        assert_eq!(cfg.read_chunk_size, DEFAULT_READ_CHUNK);
    }
}
