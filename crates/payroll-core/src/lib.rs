//! # Payroll Core - Single-Output Payroll State Machine
//!
//! Off-chain engine for a payroll held by a script in exactly one ledger
//! output. Each operation reads the current record, checks the caller, builds
//! the next record and its value movement, and hands the result to a ledger
//! client for signing and submission.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Unique employee identities | `PayrollRecord::new`, `PayrollRecord::with_employee` |
//! | Funding floor (value >= sum of salaries) | `domain/invariants.rs` - `check_funding_floor()` |
//! | Value conservation per transition | `domain/invariants.rs` - `check_value_conserved()` |
//! | Owner fixed at creation | `PayrollRecord` has no owner mutator |
//! | Withdraw only at or after `nextPay` | `domain/services.rs` - `build_withdraw()` |
//!
//! ## Wire Format
//!
//! The record is Plutus data, CBOR encoded:
//!
//! ```text
//! Constr 0 [owner, [Constr 0 [name, identity, salary, lastPaid, nextPay], ..]]
//! ```
//!
//! Redeemer tags: 0 add, 1 update, 2 remove, 3 withdraw, 4 fund.
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `LedgerClient` | Fetch the record output, submit transitions |
//! | `IdentityResolver` | Wallet address to payment key hash |
//! | `TimeSource` | Current time in seconds |
//!
//! ## Usage Example
//!
//! ```ignore
//! use payroll_core::prelude::*;
//!
//! let service = PayrollService::new(config, ledger, resolver, clock)?;
//! let receipt = service.withdraw_salary(&wallet).await?;
//! println!("paid {:?}", receipt.plan.payout);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Common imports.
pub mod prelude {
    // Domain
    pub use crate::domain::{
        ContractAddress, CreationPolicy, EmployeeEntry, EmployeeName, EmployeeUpdate,
        EmployeeView, FundingPolicy, KeyHash, Lovelace, NewEmployee, PayTerms, Payout,
        PayrollAction, PayrollPolicy, PayrollRecord, PayrollSnapshot, Timestamp, Transition,
        TransitionId, UtxoRef, ValuePlan, WalletAddress,
    };

    // Errors
    pub use crate::errors::{DecodeError, LedgerError, PayrollError};

    // Ports
    pub use crate::ports::{
        IdentityResolver, LedgerClient, PayrollApi, RecordUtxo, SystemTimeSource, TimeSource,
        TransitionReceipt, TransitionRequest,
    };

    // Adapters
    pub use crate::adapters::{DirectoryResolver, InMemoryLedger, ManualClock};

    // Config and service
    pub use crate::config::PayrollConfig;
    pub use crate::service::{PayrollService, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
