//! # Domain Services
//!
//! Transition builders: one pure function per operation. Each takes the
//! current record and its locked value, an authorization token from
//! [`guard`](crate::domain::guard), and the request; it returns the next
//! record, the action and the value plan, or an error and nothing else.
//!
//! Builders are deterministic in their inputs, so a request can be rebuilt
//! from scratch against a freshly fetched record after a conflict.

use crate::domain::actions::{PayrollAction, Payout, Transition, ValuePlan};
use crate::domain::entities::{EmployeeEntry, PayTerms, PayrollRecord};
use crate::domain::guard::{
    CreationAuthorization, EmployeeAuthorization, FundingAuthorization, OwnerAuthorization,
};
use crate::domain::invariants::check_balance;
use crate::domain::value_objects::{EmployeeName, KeyHash, Lovelace, Timestamp};
use crate::errors::{ConfigError, PayrollError};
use serde::{Deserialize, Serialize};

/// Thirty days in seconds.
pub const DEFAULT_PAY_CYCLE_SECS: u64 = 30 * 24 * 60 * 60;

/// Minimum value locked on creation on top of the first salary.
pub const DEFAULT_MIN_RESERVE: Lovelace = Lovelace(2_000_000);

// =============================================================================
// POLICY AND REQUESTS
// =============================================================================

/// Timing and reserve parameters shared by every builder.
///
/// The pay cycle is always positive, so `nextPay` lies strictly after the
/// time it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayrollPolicy {
    pay_cycle_secs: u64,
    min_reserve: Lovelace,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            pay_cycle_secs: DEFAULT_PAY_CYCLE_SECS,
            min_reserve: DEFAULT_MIN_RESERVE,
        }
    }
}

impl PayrollPolicy {
    /// Policy with a pay cycle of at least one second.
    pub fn new(pay_cycle_secs: u64, min_reserve: Lovelace) -> Result<Self, ConfigError> {
        if pay_cycle_secs == 0 {
            return Err(ConfigError::ZeroPayCycle);
        }
        Ok(Self {
            pay_cycle_secs,
            min_reserve,
        })
    }

    /// Seconds between withdrawals.
    #[must_use]
    pub fn pay_cycle_secs(&self) -> u64 {
        self.pay_cycle_secs
    }

    /// Reserve added to the contract on creation.
    #[must_use]
    pub fn min_reserve(&self) -> Lovelace {
        self.min_reserve
    }

    /// `now` plus one pay cycle.
    pub fn next_pay_after(&self, now: Timestamp) -> Result<Timestamp, PayrollError> {
        now.checked_add(self.pay_cycle_secs)
            .ok_or(PayrollError::AmountOverflow)
    }
}

/// An employee to hire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Display name.
    pub name: EmployeeName,
    /// Employee wallet key hash.
    pub identity: KeyHash,
    /// Salary per cycle.
    pub salary: Lovelace,
}

/// Changes to an existing employee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    /// Employee to change.
    pub identity: KeyHash,
    /// New salary; None keeps the current one.
    #[serde(default)]
    pub new_salary: Option<Lovelace>,
    /// Restart the pay cycle from now.
    #[serde(default)]
    pub reset_next_pay: bool,
}

fn positive(amount: Lovelace, what: &str) -> Result<Lovelace, PayrollError> {
    if amount.is_zero() {
        Err(PayrollError::InvalidAmount {
            reason: format!("{what} must be greater than zero"),
        })
    } else {
        Ok(amount)
    }
}

fn finish(
    previous: Lovelace,
    next_record: PayrollRecord,
    action: Option<PayrollAction>,
    plan: ValuePlan,
    valid_from: Option<Timestamp>,
) -> Result<Transition, PayrollError> {
    check_balance(&next_record, previous, &plan)?;
    Ok(Transition {
        next_record,
        action,
        plan,
        valid_from,
    })
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Creates the payroll with its first employee. The authorized caller is the
/// owner; the contract receives the salary plus the reserve.
pub fn build_create(
    auth: &CreationAuthorization,
    hire: NewEmployee,
    now: Timestamp,
    policy: &PayrollPolicy,
) -> Result<Transition, PayrollError> {
    let salary = positive(hire.salary, "salary")?;
    let entry = EmployeeEntry::hired(
        hire.name,
        hire.identity,
        salary,
        policy.next_pay_after(now)?,
    );
    let record = PayrollRecord::empty(auth.owner()).with_employee(entry)?;
    let funded = salary
        .checked_add(policy.min_reserve)
        .ok_or(PayrollError::AmountOverflow)?;

    finish(
        Lovelace::ZERO,
        record,
        None,
        ValuePlan::deposit(funded, funded),
        None,
    )
}

/// Appends an employee; the owner deposits their salary.
pub fn build_add(
    record: &PayrollRecord,
    value: Lovelace,
    auth: &OwnerAuthorization,
    hire: NewEmployee,
    now: Timestamp,
    policy: &PayrollPolicy,
) -> Result<Transition, PayrollError> {
    auth.check(record)?;
    let salary = positive(hire.salary, "salary")?;
    let entry = EmployeeEntry::hired(
        hire.name,
        hire.identity,
        salary,
        policy.next_pay_after(now)?,
    );
    let next = record.with_employee(entry.clone())?;
    let contract_value = value
        .checked_add(salary)
        .ok_or(PayrollError::AmountOverflow)?;

    finish(
        value,
        next,
        Some(PayrollAction::AddEmployee(entry)),
        ValuePlan::deposit(contract_value, salary),
        None,
    )
}

/// Changes salary and/or restarts the pay cycle; value is unchanged.
pub fn build_update(
    record: &PayrollRecord,
    value: Lovelace,
    auth: &OwnerAuthorization,
    update: &EmployeeUpdate,
    now: Timestamp,
    policy: &PayrollPolicy,
) -> Result<Transition, PayrollError> {
    auth.check(record)?;
    if let Some(salary) = update.new_salary {
        positive(salary, "new salary")?;
    }
    let current = record.find_employee(&update.identity)?;
    let salary_changes = update.new_salary.is_some_and(|s| s != current.salary);
    if !salary_changes && !update.reset_next_pay {
        return Err(PayrollError::NothingToUpdate {
            identity: update.identity,
        });
    }

    let next_pay = if update.reset_next_pay {
        policy.next_pay_after(now)?
    } else {
        current.next_pay
    };
    let next = record.with_replaced_employee(&update.identity, |terms| PayTerms {
        salary: update.new_salary.unwrap_or(terms.salary),
        next_pay,
        ..terms
    })?;
    let updated = next.find_employee(&update.identity)?.clone();

    finish(
        value,
        next,
        Some(PayrollAction::UpdateEmployee(updated)),
        ValuePlan::deposit(value, Lovelace::ZERO),
        None,
    )
}

/// Removes an employee; their salary leaves the contract to the owner.
pub fn build_remove(
    record: &PayrollRecord,
    value: Lovelace,
    auth: &OwnerAuthorization,
    identity: &KeyHash,
) -> Result<Transition, PayrollError> {
    auth.check(record)?;
    let salary = record.find_employee(identity)?.salary;
    let next = record.without_employee(identity)?;
    let contract_value = value
        .checked_sub(salary)
        .ok_or(PayrollError::InsufficientFunds {
            required: salary,
            available: value,
        })?;

    finish(
        value,
        next,
        Some(PayrollAction::RemoveEmployee(*identity)),
        ValuePlan {
            contract_value,
            deposit: Lovelace::ZERO,
            payout: None,
            released: salary,
        },
        None,
    )
}

/// Pays the caller's salary once `now` reaches their next pay time.
pub fn build_withdraw(
    record: &PayrollRecord,
    value: Lovelace,
    auth: &EmployeeAuthorization,
    now: Timestamp,
    policy: &PayrollPolicy,
) -> Result<Transition, PayrollError> {
    let entry = auth.check(record)?;
    if !entry.is_payable(now) {
        return Err(PayrollError::NotYetPayable {
            identity: entry.identity,
            next_pay: entry.next_pay,
            now,
        });
    }
    let salary = entry.salary;
    let next_pay = policy.next_pay_after(now)?;
    let next = record.with_replaced_employee(&entry.identity, |terms| PayTerms {
        last_paid: now,
        next_pay,
        ..terms
    })?;
    let contract_value = value
        .checked_sub(salary)
        .ok_or(PayrollError::InsufficientFunds {
            required: salary,
            available: value,
        })?;

    finish(
        value,
        next,
        Some(PayrollAction::WithdrawSalary),
        ValuePlan {
            contract_value,
            deposit: Lovelace::ZERO,
            payout: Some(Payout {
                recipient: entry.identity,
                amount: salary,
            }),
            released: Lovelace::ZERO,
        },
        Some(now),
    )
}

/// Adds `amount` to the contract; the record is unchanged.
pub fn build_fund(
    record: &PayrollRecord,
    value: Lovelace,
    auth: &FundingAuthorization,
    amount: Lovelace,
) -> Result<Transition, PayrollError> {
    auth.check(record)?;
    let amount = positive(amount, "funding amount")?;
    let contract_value = value
        .checked_add(amount)
        .ok_or(PayrollError::AmountOverflow)?;

    finish(
        value,
        record.clone(),
        Some(PayrollAction::FundPayroll),
        ValuePlan::deposit(contract_value, amount),
        None,
    )
}

// =============================================================================
// TESTS
// =============================================================================
