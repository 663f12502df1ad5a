// src/parser.rs
//
// Line framing + decoding of the sensor's text stream.
//
// The sensor firmware prints diagnostic chatter between readings; a reading
// line looks like "TDS Value=612.4,ppm". Only the newest decodable line of a
// poll cycle is kept.

use crate::sample::Sample;

/// Longest unterminated tail we keep waiting for a newline.
pub const MAX_LINE_LEN: usize = 256;

// ---------------- Framing ----------------

/// Splits arbitrary byte chunks into newline-terminated lines.
///
/// An unterminated tail is held until the next chunk completes it. A tail
/// that outgrows `max_line` is dropped along with everything up to the next
/// newline, so a cut-off reading never resurfaces as a shorter one.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(MAX_LINE_LEN)
    }
}

impl LineFramer {
    pub fn new(max_line: usize) -> Self {
        Self {
            pending: Vec::with_capacity(max_line.min(256)),
            max_line,
            discarding: false,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops any partial line (used when the device is reopened).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let chunk = if self.discarding {
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    &chunk[pos + 1..]
                }
                None => return Vec::new(),
            }
        } else {
            chunk
        };
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            lines.push(line);
        }

        if self.pending.len() > self.max_line {
            log::debug!(
                "discarding {} bytes of unterminated serial input",
                self.pending.len()
            );
            self.pending.clear();
            self.discarding = true;
        }

        lines
    }
}

// ---------------- Decoding ----------------

/// Decodes one raw line. `None` for chatter, empty lines, bad UTF-8 or
/// non-numeric values.
pub fn parse_line(raw: &[u8]) -> Option<Sample> {
    let line = match std::str::from_utf8(raw) {
        Ok(s) => s.trim(),
        Err(e) => {
            log::trace!("skipping non-UTF8 line: {e}");
            return None;
        }
    };
    if line.is_empty() {
        return None;
    }

    // "label=value,suffix": last '=' segment, then first ',' segment
    let after_eq = line.rsplit('=').next().unwrap_or(line);
    let value = after_eq.split(',').next().unwrap_or(after_eq).trim();

    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Sample::new(v)),
        _ => {
            log::trace!("skipping unparseable line: {line:?}");
            None
        }
    }
}

/// Newest line (scanning backwards) that decodes wins; older ones in the same
/// batch are dropped.
pub fn latest_sample<L: AsRef<[u8]>>(lines: &[L]) -> Option<Sample> {
    lines.iter().rev().find_map(|l| parse_line(l.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ppm(s: Option<Sample>) -> Option<f64> {
        s.map(|s| s.ppm())
    }

    #[test]
    fn parses_labelled_reading() {
        assert_eq!(ppm(parse_line(b"TDS Value=612.4,ppm")), Some(612.4));
    }

    #[test]
    fn parses_bare_number_and_crlf() {
        assert_eq!(ppm(parse_line(b"  42.5 \r")), Some(42.5));
        assert_eq!(ppm(parse_line(b"x=7")), Some(7.0));
    }

    #[test]
    fn rejects_chatter_and_blank_lines() {
        assert_eq!(parse_line(b"noise garbage"), None);
        assert_eq!(parse_line(b"   "), None);
        assert_eq!(parse_line(b"Voltage=,V"), None);
        assert_eq!(parse_line(&[0xff, 0xfe, b'1']), None);
    }

    #[test]
    fn rejects_non_finite_values() {
        assert_eq!(parse_line(b"TDS=NaN,ppm"), None);
        assert_eq!(parse_line(b"TDS=inf,ppm"), None);
    }

    #[test]
    fn newest_valid_line_wins() {
        let lines: [&[u8]; 3] = [b"TDS Value=10.0,ppm", b"TDS Value=20.0,ppm", b"booting..."];
        assert_eq!(ppm(latest_sample(&lines)), Some(20.0));
    }

    #[test]
    fn malformed_line_before_reading_is_skipped() {
        let lines: [&[u8]; 2] = [b"noise garbage", b"TDS Value=88.0,ppm"];
        assert_eq!(ppm(latest_sample(&lines)), Some(88.0));
    }

    #[test]
    fn empty_or_all_garbage_batch_yields_nothing() {
        let empty: Vec<Vec<u8>> = Vec::new();
        assert_eq!(latest_sample(&empty), None);
        let lines: [&[u8]; 3] = [b"abc", b"", b"def=ghi,jkl"];
        assert_eq!(latest_sample(&lines), None);
    }

    #[test]
    fn framer_holds_partial_line_until_terminated() {
        let mut framer = LineFramer::default();
        let lines = framer.push_chunk(b"TDS Value=1.0,ppm\r\nTDS Val");
        assert_eq!(lines, vec![b"TDS Value=1.0,ppm\r".to_vec()]);
        assert_eq!(framer.pending_len(), 7);

        let lines = framer.push_chunk(b"ue=2.5,ppm\n");
        assert_eq!(lines, vec![b"TDS Value=2.5,ppm".to_vec()]);
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn framer_discards_oversized_tail() {
        let mut framer = LineFramer::new(8);
        assert!(framer.push_chunk(b"123456789").is_empty());
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn framer_resyncs_after_overflow() {
        let mut framer = LineFramer::default();
        let mut noisy = vec![b'#'; 250];
        noisy.extend_from_slice(b"TDS Value=61");
        assert!(framer.push_chunk(&noisy).is_empty());

        // the rest of the cut-off reading must not pass for "2.4"
        let lines = framer.push_chunk(b"2.4,ppm\n");
        assert_eq!(latest_sample(&lines), None);

        let lines = framer.push_chunk(b"TDS Value=88.0,ppm\n");
        assert_eq!(ppm(latest_sample(&lines)), Some(88.0));
    }

    #[test]
    fn overflow_skip_spans_chunks_without_newline() {
        let mut framer = LineFramer::new(8);
        assert!(framer.push_chunk(b"123456789").is_empty());
        assert!(framer.push_chunk(b"0000").is_empty());
        assert_eq!(framer.pending_len(), 0);
        let lines = framer.push_chunk(b"55\nTDS=7,ppm\n");
        assert_eq!(lines, vec![b"TDS=7,ppm".to_vec()]);
    }

    #[test]
    fn clear_ends_overflow_skip() {
        let mut framer = LineFramer::new(8);
        framer.push_chunk(b"123456789");
        framer.clear();
        assert_eq!(ppm(latest_sample(&framer.push_chunk(b"3.5\n"))), Some(3.5));
    }
}
