use encoding_rs::{CoderResult, Decoder, UTF_8};

/// Incremental UTF-8 line splitter for a chunked byte feed.
///
/// Multi-byte sequences cut by a chunk boundary stay inside the decoder until
/// the rest arrives, and text after the last `\n` is carried into the next
/// `push`. Invalid bytes decode to U+FFFD instead of failing.
pub struct LineDecoder {
    decoder: Decoder,
    carry: String,
    finished: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            carry: String::new(),
            finished: false,
        }
    }

    /// Decodes `chunk` and returns every line it completed, separators stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.finished {
            return Vec::new();
        }
        self.decode_into_carry(chunk, false);
        self.take_complete_lines()
    }

    /// Flushes the decoder at end of stream. A non-blank remainder is the last line.
    pub fn finish(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        self.decode_into_carry(&[], true);
        self.finished = true;
        let rest = std::mem::take(&mut self.carry);
        if rest.trim().is_empty() {
            None
        } else {
            Some(strip_cr(rest))
        }
    }

    /// Bytes of text currently waiting for a line terminator.
    pub fn pending_len(&self) -> usize {
        self.carry.len()
    }

    fn decode_into_carry(&mut self, mut bytes: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(bytes.len())
                .unwrap_or(bytes.len().saturating_mul(3).saturating_add(4));
            self.carry.reserve(needed);
            let (result, read, _had_errors) =
                self.decoder.decode_to_string(bytes, &mut self.carry, last);
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn take_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.carry.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        complete
            .split_terminator('\n')
            .map(|line| strip_cr(line.to_string()))
            .collect()
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_cr(mut line: String) -> String {
    if line.ends_with('\r') {
        line.pop();
    }
    line
}
