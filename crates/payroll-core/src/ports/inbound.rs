//! # Driving Ports (API - Inbound)
//!
//! The caller-facing payroll operations. Every operation takes the caller's
//! wallet address; identity is derived from it, never supplied directly.

use crate::domain::actions::{PayrollAction, ValuePlan};
use crate::domain::entities::{PayrollRecord, PayrollSnapshot};
use crate::domain::services::{EmployeeUpdate, NewEmployee};
use crate::domain::value_objects::{KeyHash, Lovelace, TransitionId, WalletAddress};
use crate::errors::PayrollError;
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a submitted transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransitionReceipt {
    /// Identifier returned by the ledger client.
    pub transition_id: TransitionId,
    /// Redemption action; None for creation.
    pub action: Option<PayrollAction>,
    /// Record proposed by the transition.
    pub next_record: PayrollRecord,
    /// Value movement of the transition.
    pub plan: ValuePlan,
    /// Submission attempts, counting conflict retries.
    pub attempts: u32,
}

/// Primary API for payroll management.
///
/// ## Usage
///
/// ```ignore
/// let receipt = api.add_employee(&owner_wallet, NewEmployee { .. }).await?;
/// println!("submitted {}", receipt.transition_id);
/// ```
#[async_trait]
pub trait PayrollApi: Send + Sync {
    /// Creates the payroll with its first employee; the caller becomes owner.
    async fn create_payroll(
        &self,
        caller: &WalletAddress,
        first: NewEmployee,
    ) -> Result<TransitionReceipt, PayrollError>;

    /// Owner appends an employee.
    async fn add_employee(
        &self,
        caller: &WalletAddress,
        hire: NewEmployee,
    ) -> Result<TransitionReceipt, PayrollError>;

    /// Owner changes salary and/or restarts the pay cycle.
    async fn update_employee(
        &self,
        caller: &WalletAddress,
        update: EmployeeUpdate,
    ) -> Result<TransitionReceipt, PayrollError>;

    /// Owner removes an employee.
    async fn remove_employee(
        &self,
        caller: &WalletAddress,
        identity: KeyHash,
    ) -> Result<TransitionReceipt, PayrollError>;

    /// Employee withdraws their salary.
    async fn withdraw_salary(
        &self,
        caller: &WalletAddress,
    ) -> Result<TransitionReceipt, PayrollError>;

    /// Adds value to the contract.
    async fn fund_payroll(
        &self,
        caller: &WalletAddress,
        amount: Lovelace,
    ) -> Result<TransitionReceipt, PayrollError>;

    /// Current record and value, or `PayrollNotFound`.
    async fn snapshot(&self) -> Result<PayrollSnapshot, PayrollError>;
}
