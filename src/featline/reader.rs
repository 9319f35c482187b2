//! Line source
//!
//! Reads one physical line at a time into a reused buffer and trims it to what the parsers
//! expect: no UTF-8 byte order mark, no trailing `\n`, no trailing `\r`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Trim a raw line: leading BOM, then one trailing `\n`, then one trailing `\r`.
pub fn strip_line(raw: &[u8]) -> &[u8] {
    let mut line = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    lines_read: u64,
}

impl LineReader<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            lines_read: 0,
        }
    }

    /// Next line, or `None` at end of input. The slice is valid until the next call.
    pub fn read_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.lines_read += 1;
        Ok(Some(strip_line(&self.buf)))
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strips_bom_and_line_endings() {
        assert_eq!(strip_line(b"\xef\xbb\xbf1 | a\r\n"), b"1 | a");
        assert_eq!(strip_line(b"1 | a\n"), b"1 | a");
        assert_eq!(strip_line(b"\r"), b"");
        assert_eq!(strip_line(b"a\r\r\n"), b"a\r");
    }

    #[test]
    fn reads_until_end_of_input() {
        let mut reader = LineReader::new(Cursor::new(b"| a\n\n| b".to_vec()));
        assert_eq!(reader.read_line().unwrap(), Some(&b"| a"[..]));
        assert_eq!(reader.read_line().unwrap(), Some(&b""[..]));
        assert_eq!(reader.read_line().unwrap(), Some(&b"| b"[..]));
        assert_eq!(reader.read_line().unwrap(), None);
        assert_eq!(reader.lines_read(), 3);
    }
}
