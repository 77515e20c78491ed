//! Newline-delimited JSON record decoding.
//!
//! Each line is one full document, either a bare JSON string of markup or
//! an object with an `html` field. Lines may be split across chunks
//! arbitrarily, including inside a multi-byte character.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Record {
    Markup(String),
    Document { html: String },
}

/// Incremental NDJSON splitter.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buf: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the documents completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let Some(last) = self.buf.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let rest = self.buf.split_off(last + 1);
        let complete = std::mem::replace(&mut self.buf, rest);
        complete
            .split(|b| *b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Decode whatever is left once the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        decode_line(&rest)
    }

    /// Bytes waiting for their line to complete.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Record>(line) {
        Ok(Record::Markup(html) | Record::Document { html }) => Some(html),
        Err(e) => {
            crate::log!("live"; "skipping undecodable record: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_one_chunk() {
        let mut decoder = NdjsonDecoder::new();
        let docs = decoder.push(b"\"<p>1</p>\"\n{\"html\":\"<p>2</p>\"}\n");
        assert_eq!(docs, vec!["<p>1</p>", "<p>2</p>"]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(b"\"<p>caf").is_empty());
        // "é" split between its two bytes
        assert!(decoder.push(&[0xc3]).is_empty());
        let docs = decoder.push(&[0xa9, b'<', b'/', b'p', b'>', b'"', b'\n']);
        assert_eq!(docs, vec!["<p>café</p>"]);
    }

    #[test]
    fn test_blank_and_bad_lines_skipped() {
        let mut decoder = NdjsonDecoder::new();
        let docs = decoder.push(b"\n  \r\nnot json\n42\n\"ok\"\r\n");
        assert_eq!(docs, vec!["ok"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(b"\"tail\"").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert_eq!(decoder.finish(), None);
    }
}
