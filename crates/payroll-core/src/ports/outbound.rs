//! # Driven Ports (SPI - Outbound)
//!
//! Collaborators the engine depends on:
//! - Ledger client: fetches the contract output and submits transitions
//! - Identity resolver: wallet address to payment key hash
//! - Time source: current time in seconds
//!
//! The engine never signs, computes fees, or talks to the network itself.

use crate::domain::actions::ValuePlan;
use crate::domain::value_objects::{
    ContractAddress, KeyHash, Lovelace, Timestamp, TransitionId, UtxoRef, WalletAddress,
};
use crate::errors::{IdentityError, LedgerError};
use async_trait::async_trait;

// =============================================================================
// LEDGER CLIENT
// =============================================================================

/// The contract output currently holding the payroll record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordUtxo {
    /// Output reference to consume.
    pub outref: UtxoRef,
    /// Inline datum bytes; None if the output carries no datum.
    pub datum: Option<Vec<u8>>,
    /// Value locked with the output.
    pub value: Lovelace,
}

/// Everything the ledger client needs to assemble one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Output to consume; None when creating the payroll.
    pub consumed: Option<UtxoRef>,
    /// Encoded redeemer; None when creating the payroll.
    pub redeemer: Option<Vec<u8>>,
    /// Encoded next record.
    pub datum: Vec<u8>,
    /// Value movement.
    pub plan: ValuePlan,
    /// Identity that must sign.
    pub signer: KeyHash,
    /// Lower validity bound.
    pub valid_from: Option<Timestamp>,
}

/// Interface to the ledger network.
///
/// ## Implementation Notes
///
/// `submit_transition` must report [`LedgerError::Conflict`] when the consumed
/// output has already been spent. The engine retries those by fetching again.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current record output at `contract`, or None if no record exists.
    async fn fetch_record_utxo(
        &self,
        contract: &ContractAddress,
    ) -> Result<Option<RecordUtxo>, LedgerError>;

    /// Assembles, signs and submits a transition.
    async fn submit_transition(
        &self,
        contract: &ContractAddress,
        request: TransitionRequest,
    ) -> Result<TransitionId, LedgerError>;
}

// =============================================================================
// IDENTITY RESOLVER
// =============================================================================

/// Derives the payment key hash of a wallet address.
pub trait IdentityResolver: Send + Sync {
    /// Payment credential of `address`.
    fn derive_identity(&self, address: &WalletAddress) -> Result<KeyHash, IdentityError>;
}

// =============================================================================
// TIME SOURCE
// =============================================================================

/// Interface for time operations.
pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the epoch.
    fn now(&self) -> Timestamp;
}

/// System time source.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
