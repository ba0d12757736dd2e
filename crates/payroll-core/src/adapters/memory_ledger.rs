//! # In-Memory Ledger
//!
//! A single-contract ledger that holds one record output and applies
//! transitions with the same consume-and-replace semantics as the chain:
//! the consumed reference must be the current one or the submission loses
//! with a conflict.
//!
//! Used by the scenario tests and the session runner.

use crate::codec::{decode_action, decode_record};
use crate::domain::value_objects::{ContractAddress, KeyHash, Lovelace, TransitionId, UtxoRef};
use crate::errors::LedgerError;
use crate::ports::outbound::{LedgerClient, RecordUtxo, TransitionRequest};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct LedgerState {
    slot: Option<RecordUtxo>,
    counter: u64,
    pending_conflicts: u32,
    unavailable: bool,
    wallets: HashMap<KeyHash, Lovelace>,
    log: Vec<(TransitionId, TransitionRequest)>,
}

/// In-memory ledger for one payroll contract.
#[derive(Debug)]
pub struct InMemoryLedger {
    contract: ContractAddress,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Empty ledger for `contract`.
    #[must_use]
    pub fn new(contract: ContractAddress) -> Self {
        Self {
            contract,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Installs an output directly, bypassing validation.
    pub async fn seed(&self, datum: Option<Vec<u8>>, value: Lovelace) -> UtxoRef {
        let mut state = self.state.write().await;
        let outref = UtxoRef {
            transition_id: next_id(&mut state, datum.as_deref().unwrap_or_default()),
            index: 0,
        };
        state.slot = Some(RecordUtxo {
            outref: outref.clone(),
            datum,
            value,
        });
        outref
    }

    /// Makes the next `count` submissions lose to a competing transition.
    ///
    /// The competitor re-locks the same record and value, so a rebuilt
    /// request succeeds against the new output.
    pub async fn inject_conflicts(&self, count: u32) {
        self.state.write().await.pending_conflicts += count;
    }

    /// Simulates the network going away or coming back.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Current record output.
    pub async fn current(&self) -> Option<RecordUtxo> {
        self.state.read().await.slot.clone()
    }

    /// Total received by `identity` through payouts and releases.
    pub async fn received_by(&self, identity: &KeyHash) -> Lovelace {
        self.state
            .read()
            .await
            .wallets
            .get(identity)
            .copied()
            .unwrap_or_default()
    }

    /// Accepted submissions in order.
    pub async fn submissions(&self) -> Vec<(TransitionId, TransitionRequest)> {
        self.state.read().await.log.clone()
    }

    fn validate(state: &LedgerState, request: &TransitionRequest) -> Result<(), LedgerError> {
        let previous = match (&state.slot, &request.consumed) {
            (None, None) => Lovelace::ZERO,
            (Some(_), None) => {
                return Err(LedgerError::Rejected(
                    "contract already holds a record".into(),
                ))
            }
            (None, Some(consumed)) => {
                return Err(LedgerError::Conflict {
                    consumed: consumed.clone(),
                })
            }
            (Some(slot), Some(consumed)) if slot.outref != *consumed => {
                return Err(LedgerError::Conflict {
                    consumed: consumed.clone(),
                })
            }
            (Some(slot), Some(_)) => slot.value,
        };

        decode_record(&request.datum)
            .map_err(|err| LedgerError::Rejected(format!("datum: {err}")))?;
        match (&request.consumed, &request.redeemer) {
            (Some(_), Some(redeemer)) => {
                decode_action(redeemer)
                    .map_err(|err| LedgerError::Rejected(format!("redeemer: {err}")))?;
            }
            (Some(_), None) => return Err(LedgerError::Rejected("missing redeemer".into())),
            (None, _) => {}
        }

        let plan = &request.plan;
        let inflow = plan.inflow(previous);
        if inflow.is_none() || inflow != plan.outflow() {
            return Err(LedgerError::Rejected("value not balanced".into()));
        }
        if let Some(payout) = plan.payout {
            if payout.recipient != request.signer {
                return Err(LedgerError::Rejected(
                    "payout recipient must sign".into(),
                ));
            }
        }
        Ok(())
    }
}

fn next_id(state: &mut LedgerState, datum: &[u8]) -> TransitionId {
    state.counter += 1;
    let mut hasher = Sha256::new();
    hasher.update(state.counter.to_be_bytes());
    hasher.update(datum);
    TransitionId(hex::encode(hasher.finalize()))
}

fn credit(wallets: &mut HashMap<KeyHash, Lovelace>, who: KeyHash, amount: Lovelace) {
    if amount.is_zero() {
        return;
    }
    let balance = wallets.entry(who).or_default();
    *balance = balance.checked_add(amount).unwrap_or(Lovelace(u64::MAX));
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn fetch_record_utxo(
        &self,
        contract: &ContractAddress,
    ) -> Result<Option<RecordUtxo>, LedgerError> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("ledger offline".into()));
        }
        if *contract != self.contract {
            return Ok(None);
        }
        Ok(state.slot.clone())
    }

    async fn submit_transition(
        &self,
        contract: &ContractAddress,
        request: TransitionRequest,
    ) -> Result<TransitionId, LedgerError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("ledger offline".into()));
        }
        if *contract != self.contract {
            return Err(LedgerError::Rejected(format!("unknown contract {contract}")));
        }

        if state.pending_conflicts > 0 {
            if let (Some(consumed), Some(slot)) = (request.consumed.clone(), state.slot.clone()) {
                state.pending_conflicts -= 1;
                let competitor = UtxoRef {
                    transition_id: next_id(&mut state, slot.datum.as_deref().unwrap_or_default()),
                    index: 0,
                };
                state.slot = Some(RecordUtxo {
                    outref: competitor,
                    ..slot
                });
                return Err(LedgerError::Conflict { consumed });
            }
        }

        Self::validate(&state, &request)?;

        let id = next_id(&mut state, &request.datum);
        let plan = request.plan;
        if let Some(payout) = plan.payout {
            credit(&mut state.wallets, payout.recipient, payout.amount);
        }
        credit(&mut state.wallets, request.signer, plan.released);
        state.slot = Some(RecordUtxo {
            outref: UtxoRef {
                transition_id: id.clone(),
                index: 0,
            },
            datum: Some(request.datum.clone()),
            value: plan.contract_value,
        });
        state.log.push((id.clone(), request));
        debug!(transition_id = %id, "in-memory ledger applied transition");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_record;
    use crate::domain::actions::ValuePlan;
    use crate::domain::entities::PayrollRecord;

    fn contract() -> ContractAddress {
        ContractAddress::new("addr_test1payroll")
    }

    fn owner() -> KeyHash {
        KeyHash::new([0xaa; 28])
    }

    fn create_request(value: u64) -> TransitionRequest {
        TransitionRequest {
            consumed: None,
            redeemer: None,
            datum: encode_record(&PayrollRecord::empty(owner())),
            plan: ValuePlan::deposit(Lovelace(value), Lovelace(value)),
            signer: owner(),
            valid_from: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let ledger = InMemoryLedger::new(contract());
        assert_eq!(ledger.fetch_record_utxo(&contract()).await.unwrap(), None);

        let id = ledger
            .submit_transition(&contract(), create_request(5))
            .await
            .unwrap();
        let utxo = ledger.fetch_record_utxo(&contract()).await.unwrap().unwrap();
        assert_eq!(utxo.outref.transition_id, id);
        assert_eq!(utxo.value, Lovelace(5));
        assert_eq!(id.0.len(), 64);
    }

    #[tokio::test]
    async fn test_stale_reference_conflicts() {
        let ledger = InMemoryLedger::new(contract());
        ledger
            .submit_transition(&contract(), create_request(5))
            .await
            .unwrap();
        let mut request = create_request(5);
        request.consumed = Some(UtxoRef {
            transition_id: TransitionId("stale".into()),
            index: 0,
        });
        request.redeemer = Some(vec![0xd8, 0x7d, 0x80]);
        request.plan = ValuePlan::deposit(Lovelace(5), Lovelace::ZERO);
        assert!(matches!(
            ledger.submit_transition(&contract(), request).await,
            Err(LedgerError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_unbalanced_plan_rejected() {
        let ledger = InMemoryLedger::new(contract());
        let mut request = create_request(5);
        request.plan.deposit = Lovelace(4);
        assert!(matches!(
            ledger.submit_transition(&contract(), request).await,
            Err(LedgerError::Rejected(_))
        ));
        assert!(ledger.current().await.is_none());
    }

    #[tokio::test]
    async fn test_garbage_datum_rejected() {
        let ledger = InMemoryLedger::new(contract());
        let mut request = create_request(5);
        request.datum = vec![0x01];
        assert!(matches!(
            ledger.submit_transition(&contract(), request).await,
            Err(LedgerError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_conflict_moves_the_output() {
        let ledger = InMemoryLedger::new(contract());
        ledger
            .submit_transition(&contract(), create_request(5))
            .await
            .unwrap();
        let before = ledger.current().await.unwrap();
        ledger.inject_conflicts(1).await;

        let request = TransitionRequest {
            consumed: Some(before.outref.clone()),
            redeemer: Some(vec![0xd8, 0x7d, 0x80]),
            datum: before.datum.clone().unwrap(),
            plan: ValuePlan::deposit(Lovelace(6), Lovelace(1)),
            signer: owner(),
            valid_from: None,
        };
        assert!(matches!(
            ledger.submit_transition(&contract(), request.clone()).await,
            Err(LedgerError::Conflict { .. })
        ));
        let after = ledger.current().await.unwrap();
        assert_ne!(after.outref, before.outref);
        assert_eq!(after.datum, before.datum);

        let retry = TransitionRequest {
            consumed: Some(after.outref),
            ..request
        };
        assert!(ledger.submit_transition(&contract(), retry).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable() {
        let ledger = InMemoryLedger::new(contract());
        ledger.set_unavailable(true).await;
        assert!(matches!(
            ledger.fetch_record_utxo(&contract()).await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
