//! # Domain Entities
//!
//! The payroll record (owner + roster) and its employee entries.
//!
//! Every mutator is copy-on-write: it returns a new record and leaves the
//! input untouched, matching the consume-and-replace model of the ledger.

use crate::domain::value_objects::{EmployeeName, KeyHash, Lovelace, Timestamp};
use crate::errors::PayrollError;
use serde::{Deserialize, Serialize};

// =============================================================================
// EMPLOYEE ENTRY
// =============================================================================

/// The mutable pay terms of one employee.
///
/// Updaters passed to [`PayrollRecord::with_replaced_employee`] only ever see
/// and return this, so they cannot touch name or identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayTerms {
    /// Salary per pay cycle.
    pub salary: Lovelace,
    /// Last withdrawal time, 0 if never paid.
    pub last_paid: Timestamp,
    /// Earliest time of the next withdrawal.
    pub next_pay: Timestamp,
}

/// One payee within the payroll record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeEntry {
    /// Display name bytes.
    pub name: EmployeeName,
    /// Payment key hash of the employee's wallet.
    pub identity: KeyHash,
    /// Salary per pay cycle.
    pub salary: Lovelace,
    /// Last withdrawal time, 0 if never paid.
    pub last_paid: Timestamp,
    /// Earliest time of the next withdrawal.
    pub next_pay: Timestamp,
}

impl EmployeeEntry {
    /// A freshly hired employee: never paid, first pay at `next_pay`.
    #[must_use]
    pub fn hired(
        name: EmployeeName,
        identity: KeyHash,
        salary: Lovelace,
        next_pay: Timestamp,
    ) -> Self {
        Self {
            name,
            identity,
            salary,
            last_paid: 0,
            next_pay,
        }
    }

    /// Current pay terms.
    #[must_use]
    pub fn terms(&self) -> PayTerms {
        PayTerms {
            salary: self.salary,
            last_paid: self.last_paid,
            next_pay: self.next_pay,
        }
    }

    /// Copy with new pay terms; name and identity carried over.
    #[must_use]
    pub fn with_terms(&self, terms: PayTerms) -> Self {
        Self {
            name: self.name.clone(),
            identity: self.identity,
            salary: terms.salary,
            last_paid: terms.last_paid,
            next_pay: terms.next_pay,
        }
    }

    /// Last withdrawal time, or None if never paid.
    #[must_use]
    pub fn last_paid_at(&self) -> Option<Timestamp> {
        (self.last_paid != 0).then_some(self.last_paid)
    }

    /// Returns true if the salary can be withdrawn at `now`.
    #[must_use]
    pub fn is_payable(&self, now: Timestamp) -> bool {
        now >= self.next_pay
    }

    /// Seconds left until the salary becomes withdrawable (0 if payable).
    #[must_use]
    pub fn seconds_until_payable(&self, now: Timestamp) -> u64 {
        self.next_pay.saturating_sub(now)
    }
}

// =============================================================================
// PAYROLL RECORD
// =============================================================================

/// The payroll ledger held in the single contract output.
///
/// INVARIANT: no two employees share an identity. The fields are private so
/// every constructor and mutator goes through the uniqueness check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayrollRecord {
    owner: KeyHash,
    employees: Vec<EmployeeEntry>,
}

impl PayrollRecord {
    /// Builds a record, rejecting duplicate identities.
    pub fn new(owner: KeyHash, employees: Vec<EmployeeEntry>) -> Result<Self, PayrollError> {
        for (i, entry) in employees.iter().enumerate() {
            if employees[..i].iter().any(|e| e.identity == entry.identity) {
                return Err(PayrollError::DuplicateIdentity {
                    identity: entry.identity,
                });
            }
        }
        Ok(Self { owner, employees })
    }

    /// A record with an owner and no employees yet.
    #[must_use]
    pub fn empty(owner: KeyHash) -> Self {
        Self {
            owner,
            employees: Vec::new(),
        }
    }

    /// Payroll owner.
    #[must_use]
    pub fn owner(&self) -> KeyHash {
        self.owner
    }

    /// Roster in insertion order.
    #[must_use]
    pub fn employees(&self) -> &[EmployeeEntry] {
        &self.employees
    }

    /// Returns true if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Returns true if `identity` is on the roster.
    #[must_use]
    pub fn contains(&self, identity: &KeyHash) -> bool {
        self.position(identity).is_some()
    }

    fn position(&self, identity: &KeyHash) -> Option<usize> {
        self.employees.iter().position(|e| e.identity == *identity)
    }

    /// Looks up an employee by identity.
    pub fn find_employee(&self, identity: &KeyHash) -> Result<&EmployeeEntry, PayrollError> {
        self.employees
            .iter()
            .find(|e| e.identity == *identity)
            .ok_or(PayrollError::NotFound {
                identity: *identity,
            })
    }

    /// New record with `entry` appended.
    pub fn with_employee(&self, entry: EmployeeEntry) -> Result<Self, PayrollError> {
        if self.contains(&entry.identity) {
            return Err(PayrollError::DuplicateIdentity {
                identity: entry.identity,
            });
        }
        let mut employees = self.employees.clone();
        employees.push(entry);
        Ok(Self {
            owner: self.owner,
            employees,
        })
    }

    /// New record with the entry for `identity` removed.
    pub fn without_employee(&self, identity: &KeyHash) -> Result<Self, PayrollError> {
        let index = self.position(identity).ok_or(PayrollError::NotFound {
            identity: *identity,
        })?;
        let mut employees = self.employees.clone();
        employees.remove(index);
        Ok(Self {
            owner: self.owner,
            employees,
        })
    }

    /// New record with one entry's pay terms replaced by `updater`.
    ///
    /// The entry keeps its position, name and identity.
    pub fn with_replaced_employee<F>(
        &self,
        identity: &KeyHash,
        updater: F,
    ) -> Result<Self, PayrollError>
    where
        F: FnOnce(PayTerms) -> PayTerms,
    {
        let index = self.position(identity).ok_or(PayrollError::NotFound {
            identity: *identity,
        })?;
        let mut employees = self.employees.clone();
        let replaced = employees[index].with_terms(updater(employees[index].terms()));
        employees[index] = replaced;
        Ok(Self {
            owner: self.owner,
            employees,
        })
    }

    /// Sum of all salaries: the funding floor.
    pub fn total_salaries(&self) -> Result<Lovelace, PayrollError> {
        self.employees
            .iter()
            .try_fold(Lovelace::ZERO, |acc, e| acc.checked_add(e.salary))
            .ok_or(PayrollError::AmountOverflow)
    }
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Presentation-ready view of one employee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmployeeView {
    /// Printable, lossless name.
    pub name: String,
    /// Employee identity.
    pub identity: KeyHash,
    /// Salary per pay cycle.
    pub salary: Lovelace,
    /// Last withdrawal, if any.
    pub last_paid: Option<Timestamp>,
    /// Next withdrawal time.
    pub next_pay: Timestamp,
    /// Seconds until payable at the time the view was taken.
    pub seconds_until_payable: u64,
}

impl EmployeeView {
    /// View of `entry` as of `now`.
    #[must_use]
    pub fn new(entry: &EmployeeEntry, now: Timestamp) -> Self {
        Self {
            name: entry.name.display(),
            identity: entry.identity,
            salary: entry.salary,
            last_paid: entry.last_paid_at(),
            next_pay: entry.next_pay,
            seconds_until_payable: entry.seconds_until_payable(now),
        }
    }
}

/// The decoded record together with the value locked alongside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayrollSnapshot {
    /// Decoded record.
    pub record: PayrollRecord,
    /// Value held by the contract output.
    pub value: Lovelace,
}

impl PayrollSnapshot {
    /// Sum of all salaries.
    pub fn total_owed(&self) -> Result<Lovelace, PayrollError> {
        self.record.total_salaries()
    }

    /// Value above the funding floor; None if the floor is not met.
    pub fn surplus(&self) -> Result<Option<Lovelace>, PayrollError> {
        Ok(self.value.checked_sub(self.total_owed()?))
    }

    /// Roster views as of `now`.
    #[must_use]
    pub fn roster(&self, now: Timestamp) -> Vec<EmployeeView> {
        self.record
            .employees()
            .iter()
            .map(|e| EmployeeView::new(e, now))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> KeyHash {
        KeyHash::new([byte; 28])
    }

    fn entry(byte: u8, salary: u64) -> EmployeeEntry {
        EmployeeEntry::hired(
            EmployeeName::from_text(&format!("emp-{byte}")),
            key(byte),
            Lovelace(salary),
            1_000,
        )
    }

    fn record() -> PayrollRecord {
        PayrollRecord::new(key(0xaa), vec![entry(1, 100), entry(2, 200)]).unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = PayrollRecord::new(key(0xaa), vec![entry(1, 100), entry(1, 50)]);
        assert_eq!(
            result,
            Err(PayrollError::DuplicateIdentity { identity: key(1) })
        );
    }

    #[test]
    fn test_find_employee() {
        let rec = record();
        assert_eq!(rec.find_employee(&key(2)).unwrap().salary, Lovelace(200));
        assert_eq!(
            rec.find_employee(&key(9)),
            Err(PayrollError::NotFound { identity: key(9) })
        );
    }

    #[test]
    fn test_with_employee_appends_without_mutating_input() {
        let rec = record();
        let next = rec.with_employee(entry(3, 300)).unwrap();
        assert_eq!(rec.employees().len(), 2);
        assert_eq!(next.employees().len(), 3);
        assert_eq!(next.employees()[2].identity, key(3));
        assert_eq!(next.owner(), rec.owner());
    }

    #[test]
    fn test_with_employee_rejects_duplicate() {
        assert_eq!(
            record().with_employee(entry(2, 1)),
            Err(PayrollError::DuplicateIdentity { identity: key(2) })
        );
    }

    #[test]
    fn test_without_employee_keeps_order() {
        let rec = record().with_employee(entry(3, 300)).unwrap();
        let next = rec.without_employee(&key(2)).unwrap();
        let ids: Vec<_> = next.employees().iter().map(|e| e.identity).collect();
        assert_eq!(ids, vec![key(1), key(3)]);
        assert_eq!(
            next.without_employee(&key(2)),
            Err(PayrollError::NotFound { identity: key(2) })
        );
    }

    #[test]
    fn test_replace_carries_identity_and_name() {
        let rec = record();
        let next = rec
            .with_replaced_employee(&key(1), |terms| PayTerms {
                salary: Lovelace(150),
                ..terms
            })
            .unwrap();
        let updated = next.find_employee(&key(1)).unwrap();
        assert_eq!(updated.salary, Lovelace(150));
        assert_eq!(updated.name, EmployeeName::from_text("emp-1"));
        assert_eq!(updated.next_pay, 1_000);
        assert_eq!(next.employees()[0].identity, key(1));
        assert_eq!(rec.find_employee(&key(1)).unwrap().salary, Lovelace(100));
    }

    #[test]
    fn test_total_salaries_overflow() {
        let rec = PayrollRecord::new(key(0), vec![entry(1, u64::MAX), entry(2, 1)]).unwrap();
        assert_eq!(rec.total_salaries(), Err(PayrollError::AmountOverflow));
        assert_eq!(record().total_salaries(), Ok(Lovelace(300)));
    }

    #[test]
    fn test_snapshot_surplus_and_roster() {
        let snapshot = PayrollSnapshot {
            record: record(),
            value: Lovelace(350),
        };
        assert_eq!(snapshot.surplus(), Ok(Some(Lovelace(50))));

        let short = PayrollSnapshot {
            record: record(),
            value: Lovelace(10),
        };
        assert_eq!(short.surplus(), Ok(None));

        let roster = snapshot.roster(400);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "emp-1");
        assert_eq!(roster[0].last_paid, None);
        assert_eq!(roster[0].seconds_until_payable, 600);
    }

    #[test]
    fn test_payable_boundary() {
        let e = entry(1, 100);
        assert!(!e.is_payable(999));
        assert!(e.is_payable(1_000));
        assert_eq!(e.seconds_until_payable(2_000), 0);
    }
}
