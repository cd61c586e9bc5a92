//! Stateful UTF-8 decoding for chunked byte streams.
//!
//! Chunk boundaries in a streamed response carry no meaning, so a multi-byte
//! character can arrive split across two reads. [`Utf8StreamDecoder`] holds
//! the incomplete tail of one chunk and prepends it to the next, emitting
//! `U+FFFD` only for bytes that can never become valid UTF-8.
//!
//! # Example
//!
//! ```rust
//! use stream_chat::decoder::Utf8StreamDecoder;
//!
//! let mut decoder = Utf8StreamDecoder::new();
//! // "é" is 0xC3 0xA9
//! assert_eq!(decoder.decode(b"caf\xC3"), "caf");
//! assert_eq!(decoder.decode(b"\xA9!"), "é!");
//! assert_eq!(decoder.flush(), "");
//! ```

/// Byte order mark, dropped once at the start of a stream.
const BOM: char = '\u{FEFF}';

/// Incremental UTF-8 decoder carrying its own residual-byte buffer.
#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    /// Bytes of an incomplete sequence held over from the previous chunk.
    pending: Vec<u8>,
    /// Whether the stream start has been inspected for a BOM.
    bom_checked: bool,
}

impl Utf8StreamDecoder {
    /// Create a decoder with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, holding back a trailing partial sequence.
    ///
    /// Returns an empty string when the chunk (together with any held-over
    /// bytes) only contains the start of a character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    if let Some(len) = err.error_len() {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &invalid[len..];
                    } else {
                        // Incomplete sequence at the end of input: keep it for the next chunk.
                        self.pending = invalid.to_vec();
                        break;
                    }
                }
            }
        }

        self.strip_bom(out)
    }

    /// Finish the stream, returning text for any buffered bytes.
    ///
    /// A dangling partial sequence becomes a single `U+FFFD`. The decoder is
    /// reset afterwards and can be reused for a new stream.
    pub fn flush(&mut self) -> String {
        let out = if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        };
        let out = self.strip_bom(out);
        self.bom_checked = false;
        out
    }

    /// Whether bytes of an incomplete character are currently buffered.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn strip_bom(&mut self, out: String) -> String {
        if self.bom_checked || out.is_empty() {
            return out;
        }
        self.bom_checked = true;
        match out.strip_prefix(BOM) {
            Some(stripped) => stripped.to_owned(),
            None => out,
        }
    }
}
