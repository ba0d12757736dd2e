//! # Wire Codec
//!
//! Plutus data and its CBOR form, plus the mapping of the payroll record and
//! redemption actions onto it.

mod cbor;
pub mod datum;
pub mod plutus;

pub use datum::{decode_action, decode_record, decode_record_hex, encode_action, encode_record};
pub use plutus::PlutusData;
