//! # Authorization Guard
//!
//! Checks the caller against the record before any builder runs. A successful
//! check yields a token that the builders require, so an unauthorized
//! transition cannot be built. Tokens can only be minted here.
//!
//! Identity comparison is exact byte equality on the key hash.

use crate::domain::entities::{EmployeeEntry, PayrollRecord};
use crate::domain::value_objects::KeyHash;
use crate::errors::PayrollError;
use serde::{Deserialize, Serialize};

// =============================================================================
// POLICIES
// =============================================================================

/// Who may add value to an existing payroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingPolicy {
    /// Any identity may top up.
    #[default]
    Anyone,
    /// Only the payroll owner may top up.
    OwnerOnly,
}

/// Who may bootstrap a new payroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationPolicy {
    /// Any caller; the caller becomes the owner.
    #[default]
    Open,
    /// Only the given identity may create the payroll.
    Restricted(KeyHash),
}

// =============================================================================
// TOKENS
// =============================================================================

/// Proof that the caller owns a payroll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerAuthorization {
    owner: KeyHash,
}

impl OwnerAuthorization {
    /// Authorized owner.
    #[must_use]
    pub fn owner(&self) -> KeyHash {
        self.owner
    }

    pub(crate) fn check(&self, record: &PayrollRecord) -> Result<(), PayrollError> {
        if self.owner == record.owner() {
            Ok(())
        } else {
            Err(PayrollError::NotOwner {
                expected: record.owner(),
                actual: self.owner,
            })
        }
    }
}

/// Proof that the caller is on the roster, with their entry at check time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeAuthorization {
    entry: EmployeeEntry,
}

impl EmployeeAuthorization {
    /// The caller's entry.
    #[must_use]
    pub fn entry(&self) -> &EmployeeEntry {
        &self.entry
    }

    /// The caller's identity.
    #[must_use]
    pub fn identity(&self) -> KeyHash {
        self.entry.identity
    }

    pub(crate) fn check<'r>(
        &self,
        record: &'r PayrollRecord,
    ) -> Result<&'r EmployeeEntry, PayrollError> {
        record
            .find_employee(&self.entry.identity)
            .map_err(|_| PayrollError::NotAnEmployee {
                caller: self.entry.identity,
            })
    }
}

/// Proof that the caller may fund a payroll under the active policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FundingAuthorization {
    funder: KeyHash,
    owner: KeyHash,
}

impl FundingAuthorization {
    /// Identity bringing the value.
    #[must_use]
    pub fn funder(&self) -> KeyHash {
        self.funder
    }

    pub(crate) fn check(&self, record: &PayrollRecord) -> Result<(), PayrollError> {
        if self.owner == record.owner() {
            Ok(())
        } else {
            Err(PayrollError::NotOwner {
                expected: record.owner(),
                actual: self.funder,
            })
        }
    }
}

/// Proof that the caller may create a payroll; the caller becomes owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreationAuthorization {
    owner: KeyHash,
}

impl CreationAuthorization {
    /// Owner of the payroll to be created.
    #[must_use]
    pub fn owner(&self) -> KeyHash {
        self.owner
    }
}

// =============================================================================
// CHECKS
// =============================================================================

/// Owner-only operations: add, update, remove.
pub fn authorize_owner_op(
    record: &PayrollRecord,
    caller: &KeyHash,
) -> Result<OwnerAuthorization, PayrollError> {
    if *caller == record.owner() {
        Ok(OwnerAuthorization { owner: *caller })
    } else {
        Err(PayrollError::NotOwner {
            expected: record.owner(),
            actual: *caller,
        })
    }
}

/// Employee operations: withdraw.
pub fn authorize_employee_op(
    record: &PayrollRecord,
    caller: &KeyHash,
) -> Result<EmployeeAuthorization, PayrollError> {
    record
        .find_employee(caller)
        .map(|entry| EmployeeAuthorization {
            entry: entry.clone(),
        })
        .map_err(|_| PayrollError::NotAnEmployee { caller: *caller })
}

/// Funding under `policy`.
pub fn authorize_funding(
    record: &PayrollRecord,
    caller: &KeyHash,
    policy: FundingPolicy,
) -> Result<FundingAuthorization, PayrollError> {
    if policy == FundingPolicy::OwnerOnly {
        authorize_owner_op(record, caller)?;
    }
    Ok(FundingAuthorization {
        funder: *caller,
        owner: record.owner(),
    })
}

/// Payroll creation under `policy`.
pub fn authorize_creation(
    caller: &KeyHash,
    policy: CreationPolicy,
) -> Result<CreationAuthorization, PayrollError> {
    match policy {
        CreationPolicy::Restricted(allowed) if allowed != *caller => Err(PayrollError::NotOwner {
            expected: allowed,
            actual: *caller,
        }),
        _ => Ok(CreationAuthorization { owner: *caller }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
