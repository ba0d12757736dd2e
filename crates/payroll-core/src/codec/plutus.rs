//! Plutus data: the tagged-constructor value model used for on-chain datums
//! and redeemers, with its CBOR wire form.

use super::cbor::{
    CborReader, CborWriter, Head, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NINT, MAJOR_TAG,
    MAJOR_UINT,
};
use crate::errors::CborError;

/// Maximum nesting accepted on read.
pub const MAX_DEPTH: usize = 64;

const TAG_POS_BIGNUM: u64 = 2;
const TAG_NEG_BIGNUM: u64 = 3;
const TAG_GENERAL_CONSTR: u64 = 102;
const TAG_CONSTR_0: u64 = 121;
const TAG_CONSTR_7: u64 = 1280;

/// A Plutus data value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlutusData {
    /// Constructor application: `Constr tag [fields]`.
    Constr {
        /// Constructor index.
        tag: u64,
        /// Constructor arguments.
        fields: Vec<PlutusData>,
    },
    /// Association list.
    Map(Vec<(PlutusData, PlutusData)>),
    /// List.
    List(Vec<PlutusData>),
    /// Integer that fits 128 bits.
    Integer(i128),
    /// Bignum wider than 128 bits, kept as its wire magnitude.
    BigInteger {
        /// Sign; a negative value is `-1 - magnitude`.
        negative: bool,
        /// Big-endian magnitude bytes.
        magnitude: Vec<u8>,
    },
    /// Byte string.
    Bytes(Vec<u8>),
}

impl PlutusData {
    /// Shorthand for a constructor value.
    #[must_use]
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr { tag, fields }
    }

    /// Short description used in decode error messages.
    #[must_use]
    pub fn kind(&self) -> String {
        match self {
            Self::Constr { tag, fields } => {
                format!("constructor {tag} with {} fields", fields.len())
            }
            Self::Map(_) => "map".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Integer(_) => "integer".to_string(),
            Self::BigInteger { .. } => "big integer".to_string(),
            Self::Bytes(_) => "bytes".to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Encoding
    // -------------------------------------------------------------------------

    /// CBOR encoding.
    #[must_use]
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut w = CborWriter::new();
        self.write(&mut w);
        w.into_bytes()
    }

    /// Lowercase hex of the CBOR encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }

    fn write(&self, w: &mut CborWriter) {
        match self {
            Self::Constr { tag, fields } => {
                match *tag {
                    0..=6 => w.tag(TAG_CONSTR_0 + tag),
                    7..=127 => w.tag(TAG_CONSTR_7 + (tag - 7)),
                    _ => {
                        w.tag(TAG_GENERAL_CONSTR);
                        w.head(MAJOR_ARRAY, 2);
                        w.head(MAJOR_UINT, *tag);
                    }
                }
                write_list(w, fields);
            }
            Self::Map(entries) => {
                w.head(MAJOR_MAP, entries.len() as u64);
                for (k, v) in entries {
                    k.write(w);
                    v.write(w);
                }
            }
            Self::List(items) => write_list(w, items),
            Self::Integer(value) => write_integer(w, *value),
            Self::BigInteger {
                negative,
                magnitude,
            } => {
                w.tag(if *negative {
                    TAG_NEG_BIGNUM
                } else {
                    TAG_POS_BIGNUM
                });
                w.bytes(magnitude);
            }
            Self::Bytes(bytes) => w.bytes(bytes),
        }
    }

    // -------------------------------------------------------------------------
    // Decoding
    // -------------------------------------------------------------------------

    /// Decodes exactly one value; trailing bytes are an error.
    pub fn from_cbor(input: &[u8]) -> Result<Self, CborError> {
        let mut r = CborReader::new(input);
        let value = read_value(&mut r, 0)?;
        match r.remaining() {
            0 => Ok(value),
            remaining => Err(CborError::TrailingBytes { remaining }),
        }
    }

    /// Decodes from hex text.
    pub fn from_hex(text: &str) -> Result<Self, CborError> {
        let bytes = hex::decode(text.trim()).map_err(|_| CborError::InvalidHex)?;
        Self::from_cbor(&bytes)
    }
}

/// Empty lists are definite, non-empty lists indefinite, as the off-chain
/// serialisation library produces them.
fn write_list(w: &mut CborWriter, items: &[PlutusData]) {
    if items.is_empty() {
        w.head(MAJOR_ARRAY, 0);
    } else {
        w.begin_indefinite(MAJOR_ARRAY);
        for item in items {
            item.write(w);
        }
        w.end_indefinite();
    }
}

fn write_integer(w: &mut CborWriter, value: i128) {
    if value >= 0 {
        match u64::try_from(value) {
            Ok(small) => w.head(MAJOR_UINT, small),
            Err(_) => {
                w.tag(TAG_POS_BIGNUM);
                w.bytes(&minimal_be(value as u128));
            }
        }
    } else {
        // CBOR negative n encodes -1 - n.
        let magnitude = (-1 - value) as u128;
        match u64::try_from(magnitude) {
            Ok(small) => w.head(MAJOR_NINT, small),
            Err(_) => {
                w.tag(TAG_NEG_BIGNUM);
                w.bytes(&minimal_be(magnitude));
            }
        }
    }
}

fn minimal_be(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

fn read_value(r: &mut CborReader<'_>, depth: usize) -> Result<PlutusData, CborError> {
    if depth > MAX_DEPTH {
        return Err(CborError::TooDeep { max: MAX_DEPTH });
    }
    let head = r.head()?;
    match head.major {
        MAJOR_UINT => Ok(PlutusData::Integer(i128::from(definite(head)?))),
        MAJOR_NINT => Ok(PlutusData::Integer(-1 - i128::from(definite(head)?))),
        MAJOR_BYTES => Ok(PlutusData::Bytes(r.bytes_body(head)?)),
        MAJOR_ARRAY => Ok(PlutusData::List(read_items(r, head, depth)?)),
        MAJOR_MAP => {
            let mut entries = Vec::new();
            match head.arg {
                Some(len) => {
                    for _ in 0..len {
                        let k = read_value(r, depth + 1)?;
                        let v = read_value(r, depth + 1)?;
                        entries.push((k, v));
                    }
                }
                None => {
                    while !r.at_break()? {
                        let k = read_value(r, depth + 1)?;
                        let v = read_value(r, depth + 1)?;
                        entries.push((k, v));
                    }
                }
            }
            Ok(PlutusData::Map(entries))
        }
        MAJOR_TAG => read_tagged(r, head, depth),
        _ => Err(CborError::Unsupported {
            major: head.major,
            info: head.info,
            offset: head.offset,
        }),
    }
}

fn definite(head: Head) -> Result<u64, CborError> {
    head.arg.ok_or(CborError::Unsupported {
        major: head.major,
        info: head.info,
        offset: head.offset,
    })
}

fn read_items(
    r: &mut CborReader<'_>,
    head: Head,
    depth: usize,
) -> Result<Vec<PlutusData>, CborError> {
    let mut items = Vec::new();
    match head.arg {
        Some(len) => {
            for _ in 0..len {
                items.push(read_value(r, depth + 1)?);
            }
        }
        None => {
            while !r.at_break()? {
                items.push(read_value(r, depth + 1)?);
            }
        }
    }
    Ok(items)
}

fn read_array(r: &mut CborReader<'_>, depth: usize) -> Result<Vec<PlutusData>, CborError> {
    let head = r.head()?;
    if head.major != MAJOR_ARRAY {
        return Err(CborError::Unsupported {
            major: head.major,
            info: head.info,
            offset: head.offset,
        });
    }
    read_items(r, head, depth)
}

fn read_tagged(r: &mut CborReader<'_>, head: Head, depth: usize) -> Result<PlutusData, CborError> {
    let tag = definite(head)?;
    match tag {
        TAG_CONSTR_0..=127 => Ok(PlutusData::Constr {
            tag: tag - TAG_CONSTR_0,
            fields: read_array(r, depth + 1)?,
        }),
        TAG_CONSTR_7..=1400 => Ok(PlutusData::Constr {
            tag: tag - TAG_CONSTR_7 + 7,
            fields: read_array(r, depth + 1)?,
        }),
        TAG_GENERAL_CONSTR => {
            let pair = read_array(r, depth + 1)?;
            match pair.as_slice() {
                [PlutusData::Integer(index), PlutusData::List(fields)] if *index >= 0 => {
                    let tag = u64::try_from(*index)
                        .map_err(|_| CborError::IntegerOutOfRange { offset: head.offset })?;
                    Ok(PlutusData::Constr {
                        tag,
                        fields: fields.clone(),
                    })
                }
                _ => Err(CborError::UnexpectedTag {
                    tag,
                    offset: head.offset,
                }),
            }
        }
        TAG_POS_BIGNUM | TAG_NEG_BIGNUM => {
            let bytes_head = r.head()?;
            if bytes_head.major != MAJOR_BYTES {
                return Err(CborError::UnexpectedTag {
                    tag,
                    offset: head.offset,
                });
            }
            let bytes = r.bytes_body(bytes_head)?;
            let negative = tag == TAG_NEG_BIGNUM;
            Ok(match bignum_magnitude(&bytes) {
                Some(magnitude) if negative => PlutusData::Integer(-1 - magnitude),
                Some(magnitude) => PlutusData::Integer(magnitude),
                None => PlutusData::BigInteger {
                    negative,
                    magnitude: bytes,
                },
            })
        }
        _ => Err(CborError::UnexpectedTag {
            tag,
            offset: head.offset,
        }),
    }
}

fn bignum_magnitude(bytes: &[u8]) -> Option<i128> {
    let significant: &[u8] = match bytes.iter().position(|&b| b != 0) {
        Some(start) => &bytes[start..],
        None => &[],
    };
    if significant.len() > 16 {
        return None;
    }
    let mut word = [0u8; 16];
    word[16 - significant.len()..].copy_from_slice(significant);
    i128::try_from(u128::from_be_bytes(word)).ok()
}

// =============================================================================
// TESTS
// =============================================================================
