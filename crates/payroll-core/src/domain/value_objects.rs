//! # Value Objects
//!
//! Immutable domain primitives for the payroll ledger.
//! These types are defined by their value, not by identity.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Timestamp in whole seconds since UNIX epoch.
pub type Timestamp = u64;

/// Lovelace per ADA (the native asset has six decimal places).
pub const LOVELACE_PER_ADA: u64 = 1_000_000;

// =============================================================================
// KEY HASH (28 bytes)
// =============================================================================

/// A 28-byte payment key hash identifying a wallet.
///
/// Equality is exact byte equality. No normalization is ever applied.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyHash(pub [u8; 28]);

impl KeyHash {
    /// Length of a key hash in bytes.
    pub const LEN: usize = 28;

    /// Creates a key hash from a 28-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 28]) -> Self {
        Self(bytes)
    }

    /// Creates a key hash from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 28]>::try_from(slice).ok().map(Self)
    }

    /// Parses a key hash from 56 hex characters.
    pub fn from_hex(text: &str) -> Result<Self, KeyHashParseError> {
        let bytes = hex::decode(text.trim()).map_err(|_| KeyHashParseError::NotHex)?;
        Self::from_slice(&bytes).ok_or(KeyHashParseError::WrongLength(bytes.len()))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 28] {
        &self.0
    }

    /// Lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash({})", self.to_hex())
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for KeyHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for KeyHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Failure to parse a key hash from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyHashParseError {
    /// Input was not valid hex.
    #[error("key hash is not valid hex")]
    NotHex,

    /// Input decoded to the wrong number of bytes.
    #[error("key hash must be 28 bytes, got {0}")]
    WrongLength(usize),
}

// =============================================================================
// LOVELACE
// =============================================================================

/// An amount of the native asset in its smallest unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lovelace(pub u64);

impl Lovelace {
    /// Zero lovelace.
    pub const ZERO: Self = Self(0);

    /// Creates an amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Raw quantity.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true for a zero amount.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction. None when the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Converts a decimal ADA amount to lovelace.
    ///
    /// Digits past the sixth decimal place are truncated, never rounded, so
    /// the result is never more than the amount written.
    pub fn from_ada_str(text: &str) -> Result<Self, ParseAmountError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseAmountError::Empty);
        }
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseAmountError::Invalid(text.to_string()));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(ParseAmountError::Invalid(text.to_string()));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| ParseAmountError::TooLarge)?
        };

        let mut frac_lovelace = 0u64;
        for (i, digit) in fraction.bytes().take(6).enumerate() {
            let place = 10u64.pow(5 - i as u32);
            frac_lovelace += u64::from(digit - b'0') * place;
        }

        whole
            .checked_mul(LOVELACE_PER_ADA)
            .and_then(|w| w.checked_add(frac_lovelace))
            .map(Self)
            .ok_or(ParseAmountError::TooLarge)
    }

    /// Renders as a decimal ADA amount with six decimal places.
    #[must_use]
    pub fn to_ada_string(self) -> String {
        format!(
            "{}.{:06}",
            self.0 / LOVELACE_PER_ADA,
            self.0 % LOVELACE_PER_ADA
        )
    }
}

impl fmt::Display for Lovelace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lovelace", self.0)
    }
}

impl From<u64> for Lovelace {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

/// Failure to parse a decimal amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    /// Empty input.
    #[error("amount is empty")]
    Empty,

    /// Input is not a non-negative decimal number.
    #[error("amount is not a non-negative decimal: {0:?}")]
    Invalid(String),

    /// Amount does not fit in 64 bits of lovelace.
    #[error("amount is too large")]
    TooLarge,
}

// =============================================================================
// EMPLOYEE NAME
// =============================================================================

/// An employee display name, stored on chain as raw bytes.
///
/// The ledger treats the bytes as opaque. [`EmployeeName::display`] renders
/// printable ASCII as characters and every other byte (plus the backslash)
/// as `\xNN`, so [`EmployeeName::parse_display`] recovers the exact bytes.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct EmployeeName(Vec<u8>);

impl EmployeeName {
    /// Name from UTF-8 text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }

    /// Name from raw on-chain bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes as stored on chain.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lossless, printable rendering of the name.
    #[must_use]
    pub fn display(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for &byte in &self.0 {
            if (0x20..=0x7e).contains(&byte) && byte != b'\\' {
                out.push(char::from(byte));
            } else {
                out.push_str(&format!("\\x{byte:02x}"));
            }
        }
        out
    }

    /// Inverse of [`EmployeeName::display`].
    pub fn parse_display(text: &str) -> Result<Self, NameParseError> {
        let bytes = text.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let byte = bytes[i];
            if byte == b'\\' {
                let escape = bytes.get(i + 1..i + 4).ok_or(NameParseError::BadEscape(i))?;
                if escape[0] != b'x' {
                    return Err(NameParseError::BadEscape(i));
                }
                let value = std::str::from_utf8(&escape[1..])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or(NameParseError::BadEscape(i))?;
                out.push(value);
                i += 4;
            } else if (0x20..=0x7e).contains(&byte) {
                out.push(byte);
                i += 1;
            } else {
                return Err(NameParseError::Unprintable(i));
            }
        }
        Ok(Self(out))
    }
}

impl Serialize for EmployeeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display())
    }
}

impl<'de> Deserialize<'de> for EmployeeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_display(&text).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for EmployeeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmployeeName({:?})", self.display())
    }
}

impl fmt::Display for EmployeeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Failure to parse a displayed name back into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameParseError {
    /// Malformed `\xNN` escape at the given offset.
    #[error("malformed escape at offset {0}")]
    BadEscape(usize),

    /// Unescaped non-printable character at the given offset.
    #[error("unprintable character at offset {0}")]
    Unprintable(usize),
}

// =============================================================================
// ADDRESSES AND LEDGER REFERENCES
// =============================================================================

/// A wallet address as supplied by the caller (bech32 or otherwise).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Wraps an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of the payroll validator script.
///
/// Derived once from the fixed script at startup and injected everywhere.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddress(pub String);

impl ContractAddress {
    /// Wraps an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a submitted transition (the transaction hash).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub String);

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a ledger output: producing transition and output index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtxoRef {
    /// Transition that produced the output.
    pub transition_id: TransitionId,
    /// Output index within that transition.
    pub index: u32,
}

impl fmt::Display for UtxoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.transition_id, self.index)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_hash_hex() {
        let key = KeyHash::new([0xab; 28]);
        let parsed = KeyHash::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed, key);

        assert_eq!(
            KeyHash::from_hex("abcd"),
            Err(KeyHashParseError::WrongLength(2))
        );
        assert_eq!(KeyHash::from_hex("zz"), Err(KeyHashParseError::NotHex));
    }

    #[test]
    fn test_key_hash_serde_as_hex() {
        let key = KeyHash::new([1; 28]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(28)));
        let back: KeyHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_ada_parse_floors() {
        assert_eq!(Lovelace::from_ada_str("1").unwrap(), Lovelace(1_000_000));
        assert_eq!(Lovelace::from_ada_str("1.5").unwrap(), Lovelace(1_500_000));
        assert_eq!(
            Lovelace::from_ada_str("0.0000019").unwrap(),
            Lovelace(1)
        );
        assert_eq!(
            Lovelace::from_ada_str("2.9999999999").unwrap(),
            Lovelace(2_999_999)
        );
        assert_eq!(Lovelace::from_ada_str(".25").unwrap(), Lovelace(250_000));
    }

    #[test]
    fn test_ada_parse_rejects_garbage() {
        assert_eq!(Lovelace::from_ada_str(""), Err(ParseAmountError::Empty));
        assert!(matches!(
            Lovelace::from_ada_str("-1"),
            Err(ParseAmountError::Invalid(_))
        ));
        assert!(matches!(
            Lovelace::from_ada_str("1e6"),
            Err(ParseAmountError::Invalid(_))
        ));
        assert!(matches!(
            Lovelace::from_ada_str("."),
            Err(ParseAmountError::Invalid(_))
        ));
        assert_eq!(
            Lovelace::from_ada_str("99999999999999999999"),
            Err(ParseAmountError::TooLarge)
        );
    }

    #[test]
    fn test_lovelace_display() {
        assert_eq!(Lovelace(2_500_000).to_ada_string(), "2.500000");
        assert_eq!(Lovelace(7).to_string(), "7 lovelace");
        assert_eq!(Lovelace(5).checked_sub(Lovelace(6)), None);
    }

    #[test]
    fn test_name_display_escapes_unprintable() {
        let name = EmployeeName::from_bytes(vec![b'A', b'n', 0x00, 0xff, b'\\', b'n']);
        assert_eq!(name.display(), "An\\x00\\xff\\x5cn");
    }

    #[test]
    fn test_name_display_is_lossless() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let name = EmployeeName::from_bytes(bytes);
        let parsed = EmployeeName::parse_display(&name.display()).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_name_serde_uses_display_form() {
        let name = EmployeeName::from_bytes(vec![b'A', b'n', 0x00]);
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#""An\\x00""#);
        let back: EmployeeName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
        assert!(serde_json::from_str::<EmployeeName>(r#""\\q""#).is_err());
    }

    #[test]
    fn test_name_parse_rejects_bad_escape() {
        assert_eq!(
            EmployeeName::parse_display("ab\\q12"),
            Err(NameParseError::BadEscape(2))
        );
        assert_eq!(
            EmployeeName::parse_display("ab\\x1"),
            Err(NameParseError::BadEscape(2))
        );
    }
}
