//! Interchange tokenizer
//!
//! Real-world X12 files arrive in three physical encodings: fully
//! unwrapped, wrapped with a CR/LF after the first 80 bytes of the
//! header, or padded to fixed 133-column records with CR/LF line
//! terminators. [`InterchangeReader`] normalizes all three to the same
//! logical header and segment sequence.

use crate::isa::{ISA_LENGTH, IsaSegment, leading_separators_valid, trailing_separators_valid};
use crate::segment::Segment;
use crate::syntax::Delimiters;
use crate::{Error, Result};
use std::io::{BufRead, ErrorKind};
use tracing::debug;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const NUL: u8 = 0;

/// Window large enough to analyze a header padded to 133 columns
const ANALYZE_LEN: usize = 135;

/// Width of the space run padding an 80-column record to 133 columns
const PAD_WIDTH: usize = ANALYZE_LEN - 2 - 80;

/// Physical line-wrap convention detected while reading the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrapMode {
    None,
    Crlf80,
    Crlf133,
}

/// Streaming tokenizer over one X12 interchange
pub struct InterchangeReader<R> {
    input: R,
    delimiters: Option<Delimiters>,
    wrap: WrapMode,
    buf: Vec<u8>,
}

impl<R: BufRead> InterchangeReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            delimiters: None,
            wrap: WrapMode::None,
            buf: Vec::with_capacity(256),
        }
    }

    /// The delimiter set, available once the header has been read
    pub fn delimiters(&self) -> Option<Delimiters> {
        self.delimiters
    }

    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let available = self.input.fill_buf()?;
        let Some(&byte) = available.first() else {
            return Ok(None);
        };
        self.input.consume(1);
        Ok(Some(byte))
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.input.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::InvalidHeader {
                reason: "invalid ISA length",
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Locate, normalize, and validate the interchange header.
    ///
    /// Skips any leading non-alphanumeric bytes, then tries the three
    /// encodings in order: unwrapped, CR/LF at bytes 80-81, and
    /// 133-column padded records. On success the delimiter set is
    /// cached for the remainder of the interchange.
    pub fn read_header(&mut self) -> Result<IsaSegment> {
        let mut buf = [0u8; ANALYZE_LEN];

        loop {
            match self.read_byte()? {
                None => return Err(Error::UnrecognizedHeader),
                Some(b) if b.is_ascii_alphanumeric() => {
                    buf[0] = b;
                    break;
                }
                Some(_) => continue,
            }
        }
        self.fill(&mut buf[1..ISA_LENGTH])?;

        if &buf[0..3] != b"ISA" {
            return Err(Error::InvalidHeader {
                reason: "invalid ISA tag",
            });
        }

        // The first nine separator positions sit below byte 80 and are
        // unaffected by any wrapping; they must hold in every mode.
        if !leading_separators_valid(&buf) {
            return Err(Error::InvalidHeader {
                reason: "invalid ISA element separators",
            });
        }

        let mut identified = trailing_separators_valid(&buf[..ISA_LENGTH]);

        if !identified {
            if buf[80] == CR && buf[81] == LF {
                // Wrapped at column 80: drop the CR/LF by shifting the
                // tail left two bytes, then refill the tail.
                buf.copy_within(82..ISA_LENGTH, 80);
                self.fill(&mut buf[ISA_LENGTH - 2..ISA_LENGTH])?;
                if trailing_separators_valid(&buf[..ISA_LENGTH]) {
                    debug!("interchange header wrapped at column 80");
                    self.wrap = WrapMode::Crlf80;
                    identified = true;
                }
            } else {
                // Probe for a 133-column padded record: spaces from
                // byte 80 up to a CR/LF pair at bytes 133-134, with the
                // remaining 26 header bytes starting the next record.
                self.fill(&mut buf[ISA_LENGTH..])?;
                if buf[133] == CR
                    && buf[134] == LF
                    && buf[80..133].iter().all(|&b| b == b' ')
                {
                    self.fill(&mut buf[80..ISA_LENGTH])?;
                    if trailing_separators_valid(&buf[..ISA_LENGTH]) {
                        debug!("interchange header padded to 133 columns");
                        self.wrap = WrapMode::Crlf133;
                        identified = true;
                    }
                }
            }
        }

        if !identified {
            return Err(Error::UnrecognizedHeader);
        }

        let isa = IsaSegment::from_slice(&buf[..ISA_LENGTH])?;
        self.delimiters = Some(isa.delimiters());
        Ok(isa)
    }

    /// Read the next segment, or `None` at end of stream
    pub fn read_segment(&mut self) -> Result<Option<Segment>> {
        self.read_segment_filtered(None)
    }

    /// Read the next segment whose id matches `name`, skipping others.
    /// Matching is case-insensitive against the first element.
    pub fn read_segment_named(&mut self, name: &str) -> Result<Option<Segment>> {
        self.read_segment_filtered(Some(name))
    }

    fn read_segment_filtered(&mut self, name: Option<&str>) -> Result<Option<Segment>> {
        let delimiters = self.delimiters.ok_or(Error::HeaderNotRead)?;
        self.buf.clear();
        let mut seen_cr = false;

        loop {
            let Some(ch) = self.read_byte()? else {
                // Whitespace residue is the tail padding of a
                // 133-column file; anything else never saw its
                // terminator.
                if self.buf.is_empty() || self.buf.iter().all(|b| b.is_ascii_whitespace()) {
                    return Ok(None);
                }
                return Err(Error::IncompleteSegment);
            };

            if self.buf.is_empty() {
                // A new segment begins at the next alphanumeric byte
                if ch.is_ascii_alphanumeric() {
                    self.buf.push(ch);
                }
            } else if ch == delimiters.segment || (ch != CR && ch != LF && ch != NUL) {
                self.buf.push(ch);
            }

            if self.wrap == WrapMode::Crlf133 {
                if ch == CR {
                    seen_cr = true;
                } else {
                    if ch == LF && seen_cr && self.buf.len() >= PAD_WIDTH {
                        // End of a padded record: the last 53 bytes
                        // accumulated are column padding, not data
                        let keep = self.buf.len() - PAD_WIDTH;
                        self.buf.truncate(keep);
                    }
                    seen_cr = false;
                }
            }

            // A terminator with nothing accumulated is part of a
            // leading garbage run, not an empty segment
            if ch == delimiters.segment && !self.buf.is_empty() {
                match name {
                    Some(n) if !segment_name_matches(&self.buf, n, delimiters.element) => {
                        self.buf.clear();
                        seen_cr = false;
                    }
                    _ => break,
                }
            }
        }

        let text = String::from_utf8_lossy(&self.buf).into_owned();
        Segment::new(text, delimiters.element, delimiters.segment).map(Some)
    }
}

fn segment_name_matches(buf: &[u8], name: &str, element_sep: u8) -> bool {
    let name = name.as_bytes();
    buf.len() > name.len()
        && buf[..name.len()].eq_ignore_ascii_case(name)
        && buf[name.len()] == element_sep
}

#[cfg(test)]
pub(crate) mod test_support {
    /// A 106-byte production-style header using `*` `:` `^` `~`
    pub(crate) const SAMPLE_ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         \
         *ZZ*RECEIVER       *240101*1200*^*00501*000000001*0*P*:~";

    /// Re-encode a logical stream as fixed 133-column CR/LF records
    pub(crate) fn wrap133(logical: &str) -> String {
        let mut out = String::new();
        for chunk in logical.as_bytes().chunks(80) {
            out.push_str(std::str::from_utf8(chunk).unwrap());
            for _ in chunk.len()..133 {
                out.push(' ');
            }
            out.push_str("\r\n");
        }
        out
    }
}
