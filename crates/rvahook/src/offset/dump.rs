//! Hook target extraction from decompiled method dumps.
//!
//! The dump generator writes a comment line carrying the method's RVA
//! directly above each method declaration:
//!
//! ```text
//!     // RVA: 0x1D236E8 Offset: 0x1D226E8 VA: 0x1D236E8
//!     public void set_Text(string value) { }
//! ```
//!
//! Instead of parsing the dump, the extractor looks at adjacent line pairs
//! and takes the RVA from the line above every `set_Text(` declaration.
//! There is no scope tracking, so a `set_Text(` that appears in an unrelated
//! context right below an RVA comment is also picked up.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use memchr::{memchr, memmem};
use tracing::{debug, info};

use super::codec::{format_offset, parse_offset, strip_hex_prefix};
use crate::error::Result;

/// Default cap on the number of extracted targets.
pub const DEFAULT_MAX_RESULTS: usize = 100;

const RVA_MARKER: &[u8] = b"RVA:";
const SETTER_MARKER: &[u8] = b"set_text";

/// Extracts hook targets from a dump, stopping after `max_results` unique offsets.
#[derive(Debug, Clone, Copy)]
pub struct DumpExtractor {
    max_results: usize,
}

impl Default for DumpExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl DumpExtractor {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Scan already-split lines.
    ///
    /// Returns canonical offset text in first-seen order, without repeats.
    pub fn extract_lines<I, S>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        if self.max_results == 0 {
            return results;
        }

        let mut seen = HashSet::new();
        let mut previous: Option<S> = None;
        let mut scanned = 0usize;

        for line in lines {
            scanned += 1;
            if let Some(comment) = previous.as_ref()
                && is_setter_declaration(line.as_ref())
                && let Some(offset) = find_rva(comment.as_ref()).and_then(parse_offset)
                && seen.insert(offset)
            {
                results.push(format_offset(offset));
                if results.len() >= self.max_results {
                    debug!("Reached extraction cap of {} after {} lines", self.max_results, scanned);
                    break;
                }
            }
            previous = Some(line);
        }

        debug!("Scanned {} lines, found {} targets", scanned, results.len());
        results
    }

    /// Stream lines from a reader. The text is decoded as UTF-8, a leading
    /// BOM is dropped and malformed sequences are replaced.
    pub fn extract_from_reader<R: BufRead>(&self, reader: R) -> Result<Vec<String>> {
        let mut failure: Option<io::Error> = None;
        let lines = DecodedLines::new(reader).map_while(|line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                failure = Some(e);
                None
            }
        });
        let results = self.extract_lines(lines);

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(results),
        }
    }

    /// Open and scan a dump file.
    pub fn extract_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let results = self.extract_from_reader(BufReader::new(file))?;
        info!("Extracted {} targets from {}", results.len(), path.display());
        Ok(results)
    }
}

/// `set_Text(` in any letter case, with optional whitespace before the paren.
fn is_setter_declaration(line: &str) -> bool {
    if memchr(b'(', line.as_bytes()).is_none() {
        return false;
    }
    let lower = line.to_ascii_lowercase();
    memmem::find_iter(lower.as_bytes(), SETTER_MARKER).any(|pos| {
        lower[pos + SETTER_MARKER.len()..]
            .trim_start()
            .starts_with('(')
    })
}

/// Numeral following the first `RVA:` marker that is followed by one.
fn find_rva(line: &str) -> Option<&str> {
    memmem::find_iter(line.as_bytes(), RVA_MARKER).find_map(|pos| {
        let rest = line[pos + RVA_MARKER.len()..].trim_start();
        leading_numeral(rest)
    })
}

fn leading_numeral(text: &str) -> Option<&str> {
    if let Some(digits) = strip_hex_prefix(text) {
        let len = digits.bytes().take_while(u8::is_ascii_hexdigit).count();
        if len > 0 {
            return Some(&text[..2 + len]);
        }
    }
    let len = text.bytes().take_while(u8::is_ascii_digit).count();
    (len > 0).then(|| &text[..len])
}

/// Line iterator that decodes each line independently so a bad byte
/// sequence only affects its own line.
struct DecodedLines<R> {
    reader: R,
    buf: Vec<u8>,
    first: bool,
}

impl<R: BufRead> DecodedLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            first: true,
        }
    }
}

impl<R: BufRead> Iterator for DecodedLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                let (text, _) = if self.first {
                    self.first = false;
                    encoding_rs::UTF_8.decode_with_bom_removal(&self.buf)
                } else {
                    encoding_rs::UTF_8.decode_without_bom_handling(&self.buf)
                };
                Some(Ok(text.into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
