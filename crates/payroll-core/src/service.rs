//! # Payroll Service
//!
//! The transition orchestrator. Each request runs
//! `Lookup -> Decode -> Authorize -> Build -> BalanceCheck -> Delegate`;
//! only `Lookup` and `Delegate` suspend.
//!
//! Requests are serialized: a second transition is never started while one
//! is in flight. A `ConflictingTransition` from the ledger restarts the whole
//! sequence from `Lookup`, up to `max_conflict_retries` times.

use crate::codec::{decode_record, encode_action, encode_record};
use crate::config::PayrollConfig;
use crate::domain::actions::Transition;
use crate::domain::entities::{EmployeeView, PayrollRecord, PayrollSnapshot};
use crate::domain::guard::{
    authorize_creation, authorize_employee_op, authorize_funding, authorize_owner_op,
};
use crate::domain::invariants::check_balance;
use crate::domain::services::{
    build_add, build_create, build_fund, build_remove, build_update, build_withdraw,
    EmployeeUpdate, NewEmployee, PayrollPolicy,
};
use crate::domain::value_objects::{KeyHash, Lovelace, Timestamp, TransitionId, UtxoRef, WalletAddress};
use crate::errors::PayrollError;
use crate::ports::inbound::{PayrollApi, TransitionReceipt};
use crate::ports::outbound::{IdentityResolver, LedgerClient, RecordUtxo, TimeSource, TransitionRequest};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Statistics for the payroll service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Transitions accepted by the ledger.
    pub transitions_submitted: u64,
    /// Rebuilds after losing a conflict.
    pub conflicts_retried: u64,
    /// Requests refused for authorization.
    pub rejected_requests: u64,
    /// Requests failing for any other reason.
    pub failed_requests: u64,
}

/// Pipeline stage, recorded in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionStage {
    /// Fetch the current record output.
    Lookup,
    /// Decode its datum.
    Decode,
    /// Check the caller.
    Authorize,
    /// Compute the next record and value plan.
    Build,
    /// Re-verify conservation and the funding floor.
    BalanceCheck,
    /// Hand off to the ledger client.
    Delegate,
}

impl fmt::Display for TransitionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lookup => "lookup",
            Self::Decode => "decode",
            Self::Authorize => "authorize",
            Self::Build => "build",
            Self::BalanceCheck => "balance_check",
            Self::Delegate => "delegate",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
enum Operation {
    Create(NewEmployee),
    Add(NewEmployee),
    Update(EmployeeUpdate),
    Remove(KeyHash),
    Withdraw,
    Fund(Lovelace),
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create_payroll",
            Self::Add(_) => "add_employee",
            Self::Update(_) => "update_employee",
            Self::Remove(_) => "remove_employee",
            Self::Withdraw => "withdraw_salary",
            Self::Fund(_) => "fund_payroll",
        }
    }
}

/// The decoded contract output.
struct CurrentState {
    outref: UtxoRef,
    record: PayrollRecord,
    value: Lovelace,
}

fn decode_current(utxo: RecordUtxo) -> Result<CurrentState, PayrollError> {
    let datum = utxo.datum.ok_or_else(|| PayrollError::MalformedRecord {
        reason: "record output carries no datum".to_string(),
    })?;
    Ok(CurrentState {
        outref: utxo.outref,
        record: decode_record(&datum)?,
        value: utxo.value,
    })
}

/// The payroll service.
///
/// Generic over its collaborators so tests can run it against in-memory
/// adapters.
pub struct PayrollService<L: LedgerClient, I: IdentityResolver, T: TimeSource> {
    config: Arc<PayrollConfig>,
    policy: PayrollPolicy,
    ledger: Arc<L>,
    identities: Arc<I>,
    clock: Arc<T>,
    in_flight: Mutex<()>,
    stats: Arc<RwLock<ServiceStats>>,
}

impl<L: LedgerClient, I: IdentityResolver, T: TimeSource> PayrollService<L, I, T> {
    /// Creates the service after validating `config`.
    pub fn new(
        config: PayrollConfig,
        ledger: Arc<L>,
        identities: Arc<I>,
        clock: Arc<T>,
    ) -> Result<Self, PayrollError> {
        config.validate()?;
        let policy = config.policy()?;
        Ok(Self {
            config: Arc::new(config),
            policy,
            ledger,
            identities,
            clock,
            in_flight: Mutex::new(()),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Roster views as of the service clock.
    pub async fn roster(&self) -> Result<Vec<EmployeeView>, PayrollError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.roster(self.clock.now()))
    }

    #[instrument(
        skip(self, op),
        fields(correlation_id = %Uuid::new_v4(), operation = op.name())
    )]
    async fn execute(
        &self,
        caller: &WalletAddress,
        op: Operation,
    ) -> Result<TransitionReceipt, PayrollError> {
        let _in_flight = self.in_flight.lock().await;

        let identity = match self.identities.derive_identity(caller) {
            Ok(identity) => identity,
            Err(err) => return Err(self.fail(err.into()).await),
        };

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.attempt(&op, &identity).await {
                Ok((transition_id, transition)) => {
                    self.stats.write().await.transitions_submitted += 1;
                    info!(
                        transition_id = %transition_id,
                        kind = transition.kind(),
                        contract_value = transition.plan.contract_value.get(),
                        employees = transition.next_record.employees().len(),
                        attempts,
                        "Transition submitted"
                    );
                    return Ok(TransitionReceipt {
                        transition_id,
                        action: transition.action,
                        next_record: transition.next_record,
                        plan: transition.plan,
                        attempts,
                    });
                }
                Err(err) if err.is_retryable() => {
                    if attempts > self.config.max_conflict_retries {
                        return Err(self
                            .fail(PayrollError::ConflictingTransition { attempts })
                            .await);
                    }
                    warn!(attempts, "Record consumed by a competing transition, rebuilding");
                    self.stats.write().await.conflicts_retried += 1;
                }
                Err(err) => return Err(self.fail(err).await),
            }
        }
    }

    async fn fail(&self, err: PayrollError) -> PayrollError {
        let mut stats = self.stats.write().await;
        if err.is_unauthorized() {
            stats.rejected_requests += 1;
        } else {
            stats.failed_requests += 1;
        }
        warn!(error = %err, "Payroll request failed");
        err
    }

    async fn attempt(
        &self,
        op: &Operation,
        caller: &KeyHash,
    ) -> Result<(TransitionId, Transition), PayrollError> {
        let contract = &self.config.contract_address;

        debug!(stage = %TransitionStage::Lookup, contract = %contract);
        let utxo = self.ledger.fetch_record_utxo(contract).await?;

        debug!(stage = %TransitionStage::Decode, present = utxo.is_some());
        let current = utxo.map(decode_current).transpose()?;

        let now = self.clock.now();
        let transition = self.authorize_and_build(op, current.as_ref(), caller, now)?;

        debug!(stage = %TransitionStage::BalanceCheck);
        let previous = current.as_ref().map_or(Lovelace::ZERO, |c| c.value);
        check_balance(&transition.next_record, previous, &transition.plan)?;

        debug!(stage = %TransitionStage::Delegate);
        let request = TransitionRequest {
            consumed: current.map(|c| c.outref),
            redeemer: transition.action.as_ref().map(encode_action),
            datum: encode_record(&transition.next_record),
            plan: transition.plan,
            signer: *caller,
            valid_from: transition.valid_from,
        };
        let transition_id = self.ledger.submit_transition(contract, request).await?;
        Ok((transition_id, transition))
    }

    fn require<'c>(&self, current: Option<&'c CurrentState>) -> Result<&'c CurrentState, PayrollError> {
        current.ok_or_else(|| PayrollError::PayrollNotFound {
            contract: self.config.contract_address.clone(),
        })
    }

    fn authorize_and_build(
        &self,
        op: &Operation,
        current: Option<&CurrentState>,
        caller: &KeyHash,
        now: Timestamp,
    ) -> Result<Transition, PayrollError> {
        let policy = &self.policy;
        debug!(stage = %TransitionStage::Authorize, caller = %caller);

        match op {
            Operation::Create(first) => {
                if current.is_some() {
                    return Err(PayrollError::PayrollExists {
                        contract: self.config.contract_address.clone(),
                    });
                }
                let auth = authorize_creation(caller, self.config.creation_policy)?;
                debug!(stage = %TransitionStage::Build);
                build_create(&auth, first.clone(), now, policy)
            }
            Operation::Add(hire) => {
                let c = self.require(current)?;
                let auth = authorize_owner_op(&c.record, caller)?;
                debug!(stage = %TransitionStage::Build);
                build_add(&c.record, c.value, &auth, hire.clone(), now, policy)
            }
            Operation::Update(update) => {
                let c = self.require(current)?;
                let auth = authorize_owner_op(&c.record, caller)?;
                debug!(stage = %TransitionStage::Build);
                build_update(&c.record, c.value, &auth, update, now, policy)
            }
            Operation::Remove(identity) => {
                let c = self.require(current)?;
                let auth = authorize_owner_op(&c.record, caller)?;
                debug!(stage = %TransitionStage::Build);
                build_remove(&c.record, c.value, &auth, identity)
            }
            Operation::Withdraw => {
                let c = self.require(current)?;
                let auth = authorize_employee_op(&c.record, caller)?;
                debug!(stage = %TransitionStage::Build);
                build_withdraw(&c.record, c.value, &auth, now, policy)
            }
            Operation::Fund(amount) => {
                let c = self.require(current)?;
                let auth = authorize_funding(&c.record, caller, self.config.funding_policy)?;
                debug!(stage = %TransitionStage::Build);
                build_fund(&c.record, c.value, &auth, *amount)
            }
        }
    }
}

#[async_trait]
impl<L: LedgerClient, I: IdentityResolver, T: TimeSource> PayrollApi for PayrollService<L, I, T> {
    async fn create_payroll(
        &self,
        caller: &WalletAddress,
        first: NewEmployee,
    ) -> Result<TransitionReceipt, PayrollError> {
        self.execute(caller, Operation::Create(first)).await
    }

    async fn add_employee(
        &self,
        caller: &WalletAddress,
        hire: NewEmployee,
    ) -> Result<TransitionReceipt, PayrollError> {
        self.execute(caller, Operation::Add(hire)).await
    }

    async fn update_employee(
        &self,
        caller: &WalletAddress,
        update: EmployeeUpdate,
    ) -> Result<TransitionReceipt, PayrollError> {
        self.execute(caller, Operation::Update(update)).await
    }

    async fn remove_employee(
        &self,
        caller: &WalletAddress,
        identity: KeyHash,
    ) -> Result<TransitionReceipt, PayrollError> {
        self.execute(caller, Operation::Remove(identity)).await
    }

    async fn withdraw_salary(
        &self,
        caller: &WalletAddress,
    ) -> Result<TransitionReceipt, PayrollError> {
        self.execute(caller, Operation::Withdraw).await
    }

    async fn fund_payroll(
        &self,
        caller: &WalletAddress,
        amount: Lovelace,
    ) -> Result<TransitionReceipt, PayrollError> {
        self.execute(caller, Operation::Fund(amount)).await
    }

    async fn snapshot(&self) -> Result<PayrollSnapshot, PayrollError> {
        let contract = &self.config.contract_address;
        let utxo = self
            .ledger
            .fetch_record_utxo(contract)
            .await?
            .ok_or_else(|| PayrollError::PayrollNotFound {
                contract: contract.clone(),
            })?;
        let current = decode_current(utxo)?;
        Ok(PayrollSnapshot {
            record: current.record,
            value: current.value,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
