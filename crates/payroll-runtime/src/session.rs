//! # Session Scripts
//!
//! A session is a JSON document naming wallets and a list of steps. Each step
//! is performed by one wallet, optionally after moving the clock forward:
//!
//! ```json
//! {
//!   "start": 1700000000,
//!   "wallets": { "addr_owner": "<28-byte key hash hex>", "addr_ann": "..." },
//!   "steps": [
//!     { "caller": "addr_owner", "op": "create_payroll",
//!       "name": "Ann", "employee": "addr_ann", "salary_ada": "1" },
//!     { "caller": "addr_ann", "advance_secs": 2592000, "op": "withdraw_salary" },
//!     { "caller": "addr_owner", "op": "snapshot" }
//!   ]
//! }
//! ```
//!
//! Amounts are given in ADA and floored to whole lovelace.

use payroll_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors loading or starting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Script file could not be read.
    #[error("cannot read session script: {0}")]
    Io(#[from] std::io::Error),

    /// Script is not valid session JSON.
    #[error("invalid session script: {0}")]
    Parse(#[from] serde_json::Error),

    /// Engine rejected its configuration.
    #[error(transparent)]
    Engine(#[from] PayrollError),
}

// =============================================================================
// SCRIPT
// =============================================================================

/// A scripted session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Clock reading before the first step.
    #[serde(default)]
    pub start: Timestamp,
    /// Wallet address to payment key hash.
    pub wallets: BTreeMap<String, KeyHash>,
    /// Steps in order.
    pub steps: Vec<Step>,
}

/// One scripted request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Wallet address of the caller.
    pub caller: String,
    /// Seconds to move the clock before the request.
    #[serde(default)]
    pub advance_secs: u64,
    /// The request.
    #[serde(flatten)]
    pub op: StepOp,
}

/// Requests a step can make. Employees are named by wallet address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOp {
    /// Create the payroll with its first employee.
    CreatePayroll {
        /// Display name.
        name: String,
        /// Employee wallet address.
        employee: String,
        /// Salary in ADA.
        salary_ada: String,
    },
    /// Hire an employee.
    AddEmployee {
        /// Display name.
        name: String,
        /// Employee wallet address.
        employee: String,
        /// Salary in ADA.
        salary_ada: String,
    },
    /// Change salary and/or restart the pay cycle.
    UpdateEmployee {
        /// Employee wallet address.
        employee: String,
        /// New salary in ADA.
        #[serde(default)]
        salary_ada: Option<String>,
        /// Restart the pay cycle from now.
        #[serde(default)]
        reset_next_pay: bool,
    },
    /// Remove an employee.
    RemoveEmployee {
        /// Employee wallet address.
        employee: String,
    },
    /// Withdraw the caller's salary.
    WithdrawSalary,
    /// Add value to the contract.
    FundPayroll {
        /// Amount in ADA.
        amount_ada: String,
    },
    /// Read the current record.
    Snapshot,
}

impl StepOp {
    /// Operation name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatePayroll { .. } => "create_payroll",
            Self::AddEmployee { .. } => "add_employee",
            Self::UpdateEmployee { .. } => "update_employee",
            Self::RemoveEmployee { .. } => "remove_employee",
            Self::WithdrawSalary => "withdraw_salary",
            Self::FundPayroll { .. } => "fund_payroll",
            Self::Snapshot => "snapshot",
        }
    }
}

impl Session {
    /// Parses a session from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a session file.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of one step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// A transition was accepted.
    Submitted {
        /// Ledger receipt.
        receipt: TransitionReceipt,
    },
    /// Current state as read.
    Snapshot {
        /// Value locked with the record.
        value: Lovelace,
        /// Value above the funding floor.
        surplus: Option<Lovelace>,
        /// Roster as of the step.
        roster: Vec<EmployeeView>,
    },
    /// The request failed.
    Failed {
        /// Rendered error.
        error: String,
        /// Whether re-running could succeed.
        retryable: bool,
        /// Earliest time the request could succeed, if time-gated.
        retry_after: Option<Timestamp>,
    },
}

/// One step's outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// Position in the script.
    pub index: usize,
    /// Operation name.
    pub op: &'static str,
    /// Caller wallet.
    pub caller: String,
    /// Clock reading when the step ran.
    pub at: Timestamp,
    /// What happened.
    pub result: StepResult,
}

impl StepOutcome {
    /// Returns true unless the step failed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !matches!(self.result, StepResult::Failed { .. })
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Service wired to the in-process adapters.
pub type InMemoryService = PayrollService<InMemoryLedger, DirectoryResolver, ManualClock>;

/// Runs sessions against the in-memory ledger.
pub struct SessionRunner {
    service: InMemoryService,
    ledger: Arc<InMemoryLedger>,
    resolver: Arc<DirectoryResolver>,
    clock: Arc<ManualClock>,
}

impl SessionRunner {
    /// Wires a service for `session`'s wallets and start time.
    pub fn new(config: PayrollConfig, session: &Session) -> Result<Self, SessionError> {
        let ledger = Arc::new(InMemoryLedger::new(config.contract_address.clone()));
        let resolver: Arc<DirectoryResolver> = Arc::new(
            session
                .wallets
                .iter()
                .map(|(address, key)| (WalletAddress::new(address.as_str()), *key))
                .collect(),
        );
        let clock = Arc::new(ManualClock::new(session.start));
        let service = PayrollService::new(config, ledger.clone(), resolver.clone(), clock.clone())?;
        Ok(Self {
            service,
            ledger,
            resolver,
            clock,
        })
    }

    /// The wired service.
    #[must_use]
    pub fn service(&self) -> &InMemoryService {
        &self.service
    }

    /// The backing ledger.
    #[must_use]
    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Runs every step in order; failures are recorded, not fatal.
    pub async fn run(&self, session: &Session) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(session.steps.len());
        for (index, step) in session.steps.iter().enumerate() {
            let at = self.clock.advance(step.advance_secs);
            let result = match self.perform(step).await {
                Ok(result) => result,
                Err(err) => StepResult::Failed {
                    error: err.to_string(),
                    retryable: err.is_retryable(),
                    retry_after: err.retry_after(),
                },
            };
            match &result {
                StepResult::Failed { error, .. } => {
                    warn!(index, op = step.op.name(), caller = %step.caller, %error, "Step failed");
                }
                _ => info!(index, op = step.op.name(), caller = %step.caller, "Step completed"),
            }
            outcomes.push(StepOutcome {
                index,
                op: step.op.name(),
                caller: step.caller.clone(),
                at,
                result,
            });
        }
        outcomes
    }

    fn identity(&self, wallet: &str) -> Result<KeyHash, PayrollError> {
        Ok(self
            .resolver
            .derive_identity(&WalletAddress::new(wallet))?)
    }

    async fn perform(&self, step: &Step) -> Result<StepResult, PayrollError> {
        let caller = WalletAddress::new(step.caller.as_str());
        let receipt = match &step.op {
            StepOp::CreatePayroll {
                name,
                employee,
                salary_ada,
            } => {
                let first = self.new_employee(name, employee, salary_ada)?;
                self.service.create_payroll(&caller, first).await?
            }
            StepOp::AddEmployee {
                name,
                employee,
                salary_ada,
            } => {
                let hire = self.new_employee(name, employee, salary_ada)?;
                self.service.add_employee(&caller, hire).await?
            }
            StepOp::UpdateEmployee {
                employee,
                salary_ada,
                reset_next_pay,
            } => {
                let update = EmployeeUpdate {
                    identity: self.identity(employee)?,
                    new_salary: salary_ada.as_deref().map(ada).transpose()?,
                    reset_next_pay: *reset_next_pay,
                };
                self.service.update_employee(&caller, update).await?
            }
            StepOp::RemoveEmployee { employee } => {
                let identity = self.identity(employee)?;
                self.service.remove_employee(&caller, identity).await?
            }
            StepOp::WithdrawSalary => self.service.withdraw_salary(&caller).await?,
            StepOp::FundPayroll { amount_ada } => {
                self.service.fund_payroll(&caller, ada(amount_ada)?).await?
            }
            StepOp::Snapshot => {
                let snapshot = self.service.snapshot().await?;
                return Ok(StepResult::Snapshot {
                    value: snapshot.value,
                    surplus: snapshot.surplus()?,
                    roster: snapshot.roster(self.clock.now()),
                });
            }
        };
        Ok(StepResult::Submitted { receipt })
    }

    fn new_employee(
        &self,
        name: &str,
        employee: &str,
        salary_ada: &str,
    ) -> Result<NewEmployee, PayrollError> {
        Ok(NewEmployee {
            name: EmployeeName::from_text(name),
            identity: self.identity(employee)?,
            salary: ada(salary_ada)?,
        })
    }
}

fn ada(text: &str) -> Result<Lovelace, PayrollError> {
    Lovelace::from_ada_str(text).map_err(|err| PayrollError::InvalidAmount {
        reason: err.to_string(),
    })
}
