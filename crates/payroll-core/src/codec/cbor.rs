//! CBOR primitives for the subset used by Plutus data.
//!
//! Major types used: 0 (uint), 1 (negative int), 2 (bytes), 4 (array),
//! 5 (map), 6 (tag). Everything else is rejected on read.

use crate::errors::CborError;

/// Longest definite byte string Plutus accepts; longer ones are chunked.
pub const MAX_BYTES_CHUNK: usize = 64;

pub const MAJOR_UINT: u8 = 0;
pub const MAJOR_NINT: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;

const INFO_INDEFINITE: u8 = 31;
const BREAK: u8 = 0xff;

// =============================================================================
// WRITER
// =============================================================================

/// Append-only CBOR encoder.
#[derive(Debug, Default)]
pub struct CborWriter {
    buf: Vec<u8>,
}

impl CborWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Item head with the shortest argument encoding.
    pub fn head(&mut self, major: u8, value: u64) {
        let m = major << 5;
        if value < 24 {
            self.buf.push(m | value as u8);
        } else if value <= u64::from(u8::MAX) {
            self.buf.push(m | 24);
            self.buf.push(value as u8);
        } else if value <= u64::from(u16::MAX) {
            self.buf.push(m | 25);
            self.buf.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u64::from(u32::MAX) {
            self.buf.push(m | 26);
            self.buf.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buf.push(m | 27);
            self.buf.extend_from_slice(&value.to_be_bytes());
        }
    }

    pub fn tag(&mut self, tag: u64) {
        self.head(MAJOR_TAG, tag);
    }

    /// Byte string; chunked into an indefinite string above 64 bytes.
    pub fn bytes(&mut self, data: &[u8]) {
        if data.len() <= MAX_BYTES_CHUNK {
            self.head(MAJOR_BYTES, data.len() as u64);
            self.buf.extend_from_slice(data);
        } else {
            self.buf.push((MAJOR_BYTES << 5) | INFO_INDEFINITE);
            for chunk in data.chunks(MAX_BYTES_CHUNK) {
                self.head(MAJOR_BYTES, chunk.len() as u64);
                self.buf.extend_from_slice(chunk);
            }
            self.buf.push(BREAK);
        }
    }

    pub fn begin_indefinite(&mut self, major: u8) {
        self.buf.push((major << 5) | INFO_INDEFINITE);
    }

    pub fn end_indefinite(&mut self) {
        self.buf.push(BREAK);
    }
}

// =============================================================================
// READER
// =============================================================================

/// Decoded item head. `arg` is None for indefinite-length items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Head {
    pub major: u8,
    pub info: u8,
    pub arg: Option<u64>,
    pub offset: usize,
}

/// Cursor over CBOR input.
#[derive(Debug)]
pub struct CborReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> CborReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        if self.remaining() < n {
            return Err(CborError::UnexpectedEof { offset: self.pos });
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes a break byte if one is next.
    pub fn at_break(&mut self) -> Result<bool, CborError> {
        match self.input.get(self.pos) {
            Some(&BREAK) => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(CborError::UnexpectedEof { offset: self.pos }),
        }
    }

    pub fn head(&mut self) -> Result<Head, CborError> {
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
                let b = self.take(8)?;
                let mut word = [0u8; 8];
                word.copy_from_slice(b);
                Some(u64::from_be_bytes(word))
            }
            INFO_INDEFINITE => None,
            _ => return Err(CborError::Unsupported { major, info, offset }),
        };
        Ok(Head {
            major,
            info,
            arg,
            offset,
        })
    }

    /// Body of a byte string whose head was already read.
    pub fn bytes_body(&mut self, head: Head) -> Result<Vec<u8>, CborError> {
        match head.arg {
            Some(len) => {
                let len = usize::try_from(len)
                    .map_err(|_| CborError::UnexpectedEof { offset: head.offset })?;
                Ok(self.take(len)?.to_vec())
            }
            None => {
                let mut out = Vec::new();
                while !self.at_break()? {
                    let chunk = self.head()?;
                    match (chunk.major, chunk.arg) {
                        (MAJOR_BYTES, Some(_)) => out.extend(self.bytes_body(chunk)?),
                        _ => return Err(CborError::InvalidChunk { offset: chunk.offset }),
                    }
                }
                Ok(out)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_shortest_encoding() {
        let cases: [(u64, &[u8]); 6] = [
            (0, &[0x00]),
            (23, &[0x17]),
            (24, &[0x18, 0x18]),
            (256, &[0x19, 0x01, 0x00]),
            (65_536, &[0x1a, 0x00, 0x01, 0x00, 0x00]),
            (
                u64::MAX,
                &[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            ),
        ];
        for (value, expected) in cases {
            let mut w = CborWriter::new();
            w.head(MAJOR_UINT, value);
            assert_eq!(w.into_bytes(), expected, "value {value}");

            let mut r = CborReader::new(expected);
            assert_eq!(r.head().unwrap().arg, Some(value));
        }
    }

    #[test]
    fn test_long_bytes_are_chunked() {
        let data = vec![7u8; 100];
        let mut w = CborWriter::new();
        w.bytes(&data);
        let out = w.into_bytes();

        assert_eq!(out[0], 0x5f);
        assert_eq!(&out[1..3], &[0x58, 64]);
        assert_eq!(*out.last().unwrap(), 0xff);

        let mut r = CborReader::new(&out);
        let head = r.head().unwrap();
        assert_eq!(head.arg, None);
        assert_eq!(r.bytes_body(head).unwrap(), data);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_truncated_input() {
        let mut r = CborReader::new(&[0x19, 0x01]);
        assert_eq!(r.head(), Err(CborError::UnexpectedEof { offset: 1 }));

        let mut r = CborReader::new(&[0x43, 0x01]);
        let head = r.head().unwrap();
        assert!(matches!(
            r.bytes_body(head),
            Err(CborError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_reserved_info_rejected() {
        let mut r = CborReader::new(&[0x1c]);
        assert!(matches!(r.head(), Err(CborError::Unsupported { .. })));
    }

    #[test]
    fn test_bad_chunk_rejected() {
        // Indefinite byte string containing a uint instead of a chunk.
        let mut r = CborReader::new(&[0x5f, 0x01, 0xff]);
        let head = r.head().unwrap();
        assert_eq!(
            r.bytes_body(head),
            Err(CborError::InvalidChunk { offset: 1 })
        );
    }
}
