//! # Raw CBOR Spans
//!
//! A minimal CBOR (RFC 8949) scanner that walks items without decoding them.
//!
//! Cardano hashes the *exact bytes* of a transaction body, and the script
//! data hash covers the exact bytes of redeemers and datums. A generic
//! decode-then-encode round trip is free to pick a different (equally valid)
//! encoding for integers, lengths or maps, which would silently change the
//! transaction id and invalidate every signature. So the merge never
//! re-encodes anything it does not own: it uses [`Reader::item_span`] to
//! slice items out of the input and copies those slices verbatim.
//!
//! The scanner understands every major type, definite and indefinite
//! lengths, and tags. It does not validate UTF-8 in text strings or the
//! contents of simple values; it only needs to know where an item ends.

use thiserror::Error;

/// Nesting deeper than this is rejected rather than recursed into.
pub const MAX_DEPTH: usize = 64;

pub const MAJOR_UNSIGNED: u8 = 0;
pub const MAJOR_NEGATIVE: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_TEXT: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;
pub const MAJOR_SIMPLE: u8 = 7;

const BREAK: u8 = 0xff;

/// Errors raised while scanning CBOR.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CborError {
    #[error("input ended inside an item at offset {offset}")]
    Truncated { offset: usize },

    #[error("reserved additional info {info} at offset {offset}")]
    Reserved { offset: usize, info: u8 },

    #[error("break byte outside an indefinite-length item at offset {offset}")]
    UnexpectedBreak { offset: usize },

    #[error("nesting exceeds {} levels", MAX_DEPTH)]
    TooDeep,

    #[error("{count} trailing bytes after the top-level item")]
    TrailingBytes { count: usize },

    #[error("expected {expected} at offset {offset}")]
    Unexpected {
        offset: usize,
        expected: &'static str,
    },

    #[error("cbor decode: {0}")]
    Decode(String),

    #[error("cbor encode: {0}")]
    Encode(String),
}

/// An item header: major type plus its argument.
///
/// `arg` is `None` for indefinite-length strings, arrays and maps (and for
/// the break marker itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u8,
    pub arg: Option<u64>,
}

/// Forward-only cursor over a CBOR byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(&self) -> Result<(), CborError> {
        match self.data.len() - self.pos {
            0 => Ok(()),
            count => Err(CborError::TrailingBytes { count }),
        }
    }

    /// Major type of the next item, without consuming it.
    pub fn peek_major(&self) -> Result<u8, CborError> {
        self.data
            .get(self.pos)
            .map(|b| b >> 5)
            .ok_or(CborError::Truncated { offset: self.pos })
    }

    /// True if the next byte is the indefinite-length break marker.
    pub fn at_break(&self) -> bool {
        self.data.get(self.pos) == Some(&BREAK)
    }

    /// Consumes a break marker.
    pub fn expect_break(&mut self) -> Result<(), CborError> {
        if self.at_break() {
            self.pos += 1;
            Ok(())
        } else {
            Err(CborError::Unexpected {
                offset: self.pos,
                expected: "break",
            })
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(CborError::Truncated { offset: self.pos })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads one item header.
    pub fn header(&mut self) -> Result<Header, CborError> {
        let offset = self.pos;
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;

        let arg = match info {
            0..=23 => Some(u64::from(info)),
            24 => Some(u64::from(self.take(1)?[0])),
            25 => {
                let b = self.take(2)?;
                Some(u64::from(u16::from_be_bytes([b[0], b[1]])))
            }
            26 => {
                let b = self.take(4)?;
                Some(u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])))
            }
            27 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(self.take(8)?);
                Some(u64::from_be_bytes(buf))
            }
            28..=30 => return Err(CborError::Reserved { offset, info }),
            _ => match major {
                MAJOR_BYTES | MAJOR_TEXT | MAJOR_ARRAY | MAJOR_MAP => None,
                MAJOR_SIMPLE => return Err(CborError::UnexpectedBreak { offset }),
                _ => return Err(CborError::Reserved { offset, info }),
            },
        };
        Ok(Header { major, arg })
    }

    /// Reads the header of an unsigned integer.
    pub fn unsigned(&mut self) -> Result<u64, CborError> {
        let offset = self.pos;
        match self.header()? {
            Header {
                major: MAJOR_UNSIGNED,
                arg: Some(value),
            } => Ok(value),
            _ => Err(CborError::Unexpected {
                offset,
                expected: "unsigned integer",
            }),
        }
    }

    /// Skips one complete item, including everything nested inside it.
    pub fn skip(&mut self) -> Result<(), CborError> {
        self.skip_at(0)
    }

    fn skip_at(&mut self, depth: usize) -> Result<(), CborError> {
        if depth > MAX_DEPTH {
            return Err(CborError::TooDeep);
        }
        let offset = self.pos;
        let header = self.header()?;
        match (header.major, header.arg) {
            (MAJOR_UNSIGNED | MAJOR_NEGATIVE | MAJOR_SIMPLE, _) => Ok(()),
            (MAJOR_BYTES | MAJOR_TEXT, Some(len)) => {
                let len = usize::try_from(len).map_err(|_| CborError::Truncated { offset })?;
                self.take(len).map(|_| ())
            }
            (MAJOR_BYTES | MAJOR_TEXT, None) => {
                // Chunks must be definite strings of the same major type.
                while !self.at_break() {
                    let chunk_offset = self.pos;
                    if self.peek_major()? != header.major {
                        return Err(CborError::Unexpected {
                            offset: chunk_offset,
                            expected: "string chunk",
                        });
                    }
                    self.skip_at(depth + 1)?;
                }
                self.expect_break()
            }
            (MAJOR_ARRAY, Some(n)) => (0..n).try_for_each(|_| self.skip_at(depth + 1)),
            (MAJOR_MAP, Some(n)) => (0..n).try_for_each(|_| {
                self.skip_at(depth + 1)?;
                self.skip_at(depth + 1)
            }),
            (MAJOR_ARRAY, None) => {
                while !self.at_break() {
                    self.skip_at(depth + 1)?;
                }
                self.expect_break()
            }
            (MAJOR_MAP, None) => {
                while !self.at_break() {
                    self.skip_at(depth + 1)?;
                    self.skip_at(depth + 1)?;
                }
                self.expect_break()
            }
            (MAJOR_TAG, _) => self.skip_at(depth + 1),
            _ => Err(CborError::Reserved { offset, info: 31 }),
        }
    }

    /// Skips one item and returns its exact encoded bytes.
    pub fn item_span(&mut self) -> Result<&'a [u8], CborError> {
        let start = self.pos;
        self.skip()?;
        Ok(&self.data[start..self.pos])
    }
}

/// Appends a header using the shortest argument encoding.
pub fn write_header(out: &mut Vec<u8>, major: u8, arg: u64) {
    let major = major << 5;
    if arg < 24 {
        out.push(major | arg as u8);
    } else if arg <= u64::from(u8::MAX) {
        out.push(major | 24);
        out.push(arg as u8);
    } else if arg <= u64::from(u16::MAX) {
        out.push(major | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= u64::from(u32::MAX) {
        out.push(major | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        out.push(major | 27);
        out.extend_from_slice(&arg.to_be_bytes());
    }
}
