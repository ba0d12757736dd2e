//! # Actions and Transitions
//!
//! The closed set of redemption actions the payroll validator accepts, the
//! value movement attached to a transition, and the proposal handed to the
//! ledger client.

use crate::domain::entities::{EmployeeEntry, PayrollRecord};
use crate::domain::value_objects::{KeyHash, Lovelace, Timestamp};
use serde::Serialize;

// =============================================================================
// ACTION
// =============================================================================

/// Redemption action consuming the current record.
///
/// The constructor index is the action tag the validator dispatches on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum PayrollAction {
    /// Tag 0: new employee appended.
    AddEmployee(EmployeeEntry),
    /// Tag 1: employee entry as it will appear after the update.
    UpdateEmployee(EmployeeEntry),
    /// Tag 2: employee removed.
    RemoveEmployee(KeyHash),
    /// Tag 3: salary paid to the signing employee.
    WithdrawSalary,
    /// Tag 4: value added to the contract.
    FundPayroll,
}

impl PayrollAction {
    /// Constructor index on the wire.
    #[must_use]
    pub fn tag(&self) -> u64 {
        match self {
            Self::AddEmployee(_) => 0,
            Self::UpdateEmployee(_) => 1,
            Self::RemoveEmployee(_) => 2,
            Self::WithdrawSalary => 3,
            Self::FundPayroll => 4,
        }
    }

    /// Name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddEmployee(_) => "add_employee",
            Self::UpdateEmployee(_) => "update_employee",
            Self::RemoveEmployee(_) => "remove_employee",
            Self::WithdrawSalary => "withdraw_salary",
            Self::FundPayroll => "fund_payroll",
        }
    }
}

// =============================================================================
// VALUE PLAN
// =============================================================================

/// Salary paid straight to an employee wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Payout {
    /// Receiving employee.
    pub recipient: KeyHash,
    /// Amount paid.
    pub amount: Lovelace,
}

/// Where the value goes when a transition is applied.
///
/// Conservation: `previous + deposit == contract_value + payout + released`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ValuePlan {
    /// Value locked with the next record.
    pub contract_value: Lovelace,
    /// Value brought in by the signer.
    pub deposit: Lovelace,
    /// Direct payment to an employee, if any.
    pub payout: Option<Payout>,
    /// Value leaving the contract back to the signer's control.
    pub released: Lovelace,
}

impl ValuePlan {
    /// Plan that only adds `deposit` to the contract.
    #[must_use]
    pub fn deposit(contract_value: Lovelace, deposit: Lovelace) -> Self {
        Self {
            contract_value,
            deposit,
            payout: None,
            released: Lovelace::ZERO,
        }
    }

    /// Total entering the transition: previous value plus deposit.
    #[must_use]
    pub fn inflow(&self, previous: Lovelace) -> Option<Lovelace> {
        previous.checked_add(self.deposit)
    }

    /// Total leaving the transition: next value, payout and release.
    #[must_use]
    pub fn outflow(&self) -> Option<Lovelace> {
        let paid = self.payout.map_or(Lovelace::ZERO, |p| p.amount);
        self.contract_value
            .checked_add(paid)?
            .checked_add(self.released)
    }
}

// =============================================================================
// TRANSITION
// =============================================================================

/// A fully built next-state proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Record to lock in the new contract output.
    pub next_record: PayrollRecord,
    /// Redemption action; None for creation, which consumes nothing.
    pub action: Option<PayrollAction>,
    /// Value movement.
    pub plan: ValuePlan,
    /// Lower validity bound the ledger must enforce, if time-gated.
    pub valid_from: Option<Timestamp>,
}

impl Transition {
    /// Action name for logs; "create_payroll" when there is no action.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.action.as_ref().map_or("create_payroll", PayrollAction::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outflow_sums_all_destinations() {
        let plan = ValuePlan {
            contract_value: Lovelace(500),
            deposit: Lovelace::ZERO,
            payout: Some(Payout {
                recipient: KeyHash::new([1; 28]),
                amount: Lovelace(100),
            }),
            released: Lovelace(25),
        };
        assert_eq!(plan.outflow(), Some(Lovelace(625)));
        assert_eq!(plan.inflow(Lovelace(625)), Some(Lovelace(625)));
    }

    #[test]
    fn test_outflow_overflow() {
        let plan = ValuePlan {
            contract_value: Lovelace(u64::MAX),
            deposit: Lovelace::ZERO,
            payout: None,
            released: Lovelace(1),
        };
        assert_eq!(plan.outflow(), None);
    }
}
