//! # Error Types
//!
//! All error types for the payroll engine. Layer errors (`CborError`,
//! `DecodeError`, `LedgerError`, `IdentityError`, `ConfigError`) flatten into
//! [`PayrollError`], which is what every caller-facing operation returns.

use crate::domain::value_objects::{
    ContractAddress, KeyHash, Lovelace, Timestamp, UtxoRef, WalletAddress,
};
use thiserror::Error;

// =============================================================================
// WIRE ERRORS
// =============================================================================

/// Structural errors from the CBOR reader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CborError {
    /// Input ended in the middle of an item.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where more input was needed.
        offset: usize,
    },

    /// An item type that Plutus data never uses.
    #[error("unsupported item (major type {major}, info {info}) at offset {offset}")]
    Unsupported {
        /// CBOR major type.
        major: u8,
        /// Additional-information bits of the head.
        info: u8,
        /// Byte offset of the head.
        offset: usize,
    },

    /// A tag that does not introduce a constructor or bignum.
    #[error("unexpected tag {tag} at offset {offset}")]
    UnexpectedTag {
        /// Tag number found.
        tag: u64,
        /// Byte offset of the tag head.
        offset: usize,
    },

    /// Chunk of an indefinite byte string was not a definite byte string.
    #[error("invalid byte string chunk at offset {offset}")]
    InvalidChunk {
        /// Byte offset of the chunk head.
        offset: usize,
    },

    /// Integer does not fit the supported range.
    #[error("integer out of range at offset {offset}")]
    IntegerOutOfRange {
        /// Byte offset of the integer.
        offset: usize,
    },

    /// Nesting exceeds the reader's depth limit.
    #[error("nesting deeper than {max} levels")]
    TooDeep {
        /// Depth limit.
        max: usize,
    },

    /// Bytes remain after the top-level item.
    #[error("{remaining} trailing bytes after item")]
    TrailingBytes {
        /// Unread byte count.
        remaining: usize,
    },

    /// Input was not valid hex.
    #[error("wire data is not valid hex")]
    InvalidHex,
}

/// Errors decoding the payroll record from its wire form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Top-level shape is not `Constr 0 [owner, employees]`.
    #[error("malformed payroll record: {reason}")]
    MalformedRecord {
        /// What was wrong.
        reason: String,
    },

    /// An employee entry is not `Constr 0 [name, identity, salary, lastPaid, nextPay]`.
    #[error("malformed employee entry #{index}: {reason}")]
    MalformedEmployee {
        /// Position of the entry in the roster.
        index: usize,
        /// What was wrong.
        reason: String,
    },
}

impl From<CborError> for DecodeError {
    fn from(err: CborError) -> Self {
        DecodeError::MalformedRecord {
            reason: err.to_string(),
        }
    }
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

/// Errors reported by the ledger client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The consumed record output was already spent by another transition.
    #[error("record output {consumed} already consumed")]
    Conflict {
        /// The output that was no longer available.
        consumed: UtxoRef,
    },

    /// The ledger rejected the transition.
    #[error("transition rejected: {0}")]
    Rejected(String),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors from identity resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The address carries no payment key credential.
    #[error("no payment credential for address {address}")]
    NoCredential {
        /// Address that could not be resolved.
        address: WalletAddress,
    },
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Contract address is empty.
    #[error("contract address is not set (PAYROLL_CONTRACT_ADDRESS)")]
    MissingContractAddress,

    /// Pay cycle must be at least one second.
    #[error("pay cycle must be positive")]
    ZeroPayCycle,

    /// Environment variable could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
    },
}

// =============================================================================
// PAYROLL ERRORS
// =============================================================================

/// Every way a payroll operation can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayrollError {
    /// On-chain record has the wrong shape.
    #[error("malformed payroll record: {reason}")]
    MalformedRecord {
        /// What was wrong.
        reason: String,
    },

    /// An on-chain employee entry has the wrong shape.
    #[error("malformed employee entry #{index}: {reason}")]
    MalformedEmployee {
        /// Position of the entry in the roster.
        index: usize,
        /// What was wrong.
        reason: String,
    },

    /// No payroll record exists at the contract.
    #[error("no payroll record at {contract}")]
    PayrollNotFound {
        /// Contract that was searched.
        contract: ContractAddress,
    },

    /// A payroll record already exists; it cannot be created again.
    #[error("payroll record already exists at {contract}")]
    PayrollExists {
        /// Contract holding the existing record.
        contract: ContractAddress,
    },

    /// Employee identity is not on the roster.
    #[error("employee {identity} not found in payroll")]
    NotFound {
        /// Identity that was looked up.
        identity: KeyHash,
    },

    /// Employee identity is already on the roster.
    #[error("employee {identity} already exists in payroll")]
    DuplicateIdentity {
        /// Identity already present.
        identity: KeyHash,
    },

    /// Caller is not the payroll owner.
    #[error("only the owner can do this: owner {expected}, caller {actual}")]
    NotOwner {
        /// The owner recorded on chain, or the permitted creator.
        expected: KeyHash,
        /// The rejected caller.
        actual: KeyHash,
    },

    /// Caller is not on the roster.
    #[error("caller {caller} is not an employee of this payroll")]
    NotAnEmployee {
        /// The rejected caller.
        caller: KeyHash,
    },

    /// Salary is not yet withdrawable.
    #[error("employee {identity} can withdraw at {next_pay} (now {now})")]
    NotYetPayable {
        /// Employee asking to be paid.
        identity: KeyHash,
        /// Earliest time the withdrawal is allowed.
        next_pay: Timestamp,
        /// Time of the request.
        now: Timestamp,
    },

    /// The contract would hold less than the funding floor.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Value the record needs to hold.
        required: Lovelace,
        /// Value it would hold.
        available: Lovelace,
    },

    /// Amount is zero or unparseable.
    #[error("invalid amount: {reason}")]
    InvalidAmount {
        /// Why the amount was refused.
        reason: String,
    },

    /// Update request changes nothing.
    #[error("update for {identity} requests no change")]
    NothingToUpdate {
        /// Employee named by the request.
        identity: KeyHash,
    },

    /// Value arithmetic overflowed 64 bits.
    #[error("amount overflow")]
    AmountOverflow,

    /// Another transition consumed the record first.
    #[error("record consumed by a competing transition ({attempts} attempts)")]
    ConflictingTransition {
        /// Attempts made, including the first.
        attempts: u32,
    },

    /// Caller address has no payment credential.
    #[error("no payment credential for address {address}")]
    NoCredential {
        /// Address that could not be resolved.
        address: WalletAddress,
    },

    /// Other ledger-client failure.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl PayrollError {
    /// Returns true if re-running the whole sequence from lookup may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConflictingTransition { .. })
    }

    /// Earliest time at which the same request could succeed, if time-gated.
    #[must_use]
    pub fn retry_after(&self) -> Option<Timestamp> {
        match self {
            Self::NotYetPayable { next_pay, .. } => Some(*next_pay),
            _ => None,
        }
    }

    /// Returns true for authorization failures.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NotOwner { .. } | Self::NotAnEmployee { .. })
    }
}

impl From<DecodeError> for PayrollError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::MalformedRecord { reason } => Self::MalformedRecord { reason },
            DecodeError::MalformedEmployee { index, reason } => {
                Self::MalformedEmployee { index, reason }
            }
        }
    }
}

impl From<IdentityError> for PayrollError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NoCredential { address } => Self::NoCredential { address },
        }
    }
}

impl From<LedgerError> for PayrollError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict { .. } => Self::ConflictingTransition { attempts: 1 },
            other => Self::Ledger(other),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
