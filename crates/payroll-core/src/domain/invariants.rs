//! # Domain Invariants
//!
//! Checks that must hold for every record the engine proposes.
//!
//! - Unique identities: no two employees share a key hash.
//! - Funding floor: the value locked with a record covers every salary on it.
//! - Conservation: a value plan neither creates nor destroys value.

use crate::domain::actions::ValuePlan;
use crate::domain::entities::PayrollRecord;
use crate::domain::value_objects::Lovelace;
use crate::errors::PayrollError;
use std::collections::HashSet;

/// Returns true if no two employees share an identity.
#[must_use]
pub fn check_unique_identities(record: &PayrollRecord) -> bool {
    let mut seen = HashSet::with_capacity(record.employees().len());
    record.employees().iter().all(|e| seen.insert(e.identity))
}

/// Fails with `InsufficientFunds` if `value` is below the sum of salaries.
pub fn check_funding_floor(record: &PayrollRecord, value: Lovelace) -> Result<(), PayrollError> {
    let required = record.total_salaries()?;
    if value >= required {
        Ok(())
    } else {
        Err(PayrollError::InsufficientFunds {
            required,
            available: value,
        })
    }
}

/// Fails if the plan's outflow differs from `previous` plus its deposit.
pub fn check_value_conserved(previous: Lovelace, plan: &ValuePlan) -> Result<(), PayrollError> {
    let inflow = plan.inflow(previous).ok_or(PayrollError::AmountOverflow)?;
    let outflow = plan.outflow().ok_or(PayrollError::AmountOverflow)?;
    if inflow == outflow {
        Ok(())
    } else {
        Err(PayrollError::InsufficientFunds {
            required: outflow,
            available: inflow,
        })
    }
}

/// Full pre-submission balance check for a proposed record and plan.
pub fn check_balance(
    next: &PayrollRecord,
    previous: Lovelace,
    plan: &ValuePlan,
) -> Result<(), PayrollError> {
    check_value_conserved(previous, plan)?;
    check_funding_floor(next, plan.contract_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actions::Payout;
    use crate::domain::entities::EmployeeEntry;
    use crate::domain::value_objects::{EmployeeName, KeyHash};

    fn record(salaries: &[u64]) -> PayrollRecord {
        let employees = salaries
            .iter()
            .enumerate()
            .map(|(i, s)| {
                EmployeeEntry::hired(
                    EmployeeName::from_text("x"),
                    KeyHash::new([i as u8 + 1; 28]),
                    Lovelace(*s),
                    0,
                )
            })
            .collect();
        PayrollRecord::new(KeyHash::new([0xaa; 28]), employees).unwrap()
    }

    #[test]
    fn test_funding_floor_boundary() {
        let rec = record(&[100, 250]);
        assert!(check_funding_floor(&rec, Lovelace(350)).is_ok());
        assert_eq!(
            check_funding_floor(&rec, Lovelace(349)),
            Err(PayrollError::InsufficientFunds {
                required: Lovelace(350),
                available: Lovelace(349)
            })
        );
        assert!(check_funding_floor(&record(&[]), Lovelace::ZERO).is_ok());
    }

    #[test]
    fn test_unique_identities() {
        assert!(check_unique_identities(&record(&[1, 2, 3])));
    }

    #[test]
    fn test_conservation() {
        let plan = ValuePlan {
            contract_value: Lovelace(900),
            deposit: Lovelace::ZERO,
            payout: Some(Payout {
                recipient: KeyHash::new([1; 28]),
                amount: Lovelace(100),
            }),
            released: Lovelace::ZERO,
        };
        assert!(check_value_conserved(Lovelace(1_000), &plan).is_ok());
        assert!(check_value_conserved(Lovelace(999), &plan).is_err());
    }

    #[test]
    fn test_balance_rejects_floor_violation() {
        let rec = record(&[500]);
        let plan = ValuePlan::deposit(Lovelace(400), Lovelace(100));
        assert!(matches!(
            check_balance(&rec, Lovelace(300), &plan),
            Err(PayrollError::InsufficientFunds { .. })
        ));
    }
}
