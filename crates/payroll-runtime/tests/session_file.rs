//! Session scripts loaded from disk.

use payroll_core::prelude::*;
use payroll_runtime::{Session, SessionError, SessionRunner, StepResult};
use std::io::Write;

fn script(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn config() -> PayrollConfig {
    PayrollConfig::for_contract(ContractAddress::new("addr_test1wpayroll"))
}

#[tokio::test]
async fn test_full_session_from_file() {
    let owner = "aa".repeat(28);
    let ann = "01".repeat(28);
    let bob = "02".repeat(28);
    let file = script(&format!(
        r#"{{
            "start": 1700000000,
            "wallets": {{ "owner": "{owner}", "ann": "{ann}", "bob": "{bob}" }},
            "steps": [
                {{ "caller": "owner", "op": "create_payroll", "name": "Ann", "employee": "ann", "salary_ada": "1" }},
                {{ "caller": "owner", "op": "add_employee", "name": "Bob", "employee": "bob", "salary_ada": "2" }},
                {{ "caller": "bob", "op": "fund_payroll", "amount_ada": "3" }},
                {{ "caller": "ann", "op": "remove_employee", "employee": "bob" }},
                {{ "caller": "owner", "op": "update_employee", "employee": "bob", "salary_ada": "2.5" }},
                {{ "caller": "owner", "op": "snapshot" }}
            ]
        }}"#
    ));

    let session = Session::load(file.path()).unwrap();
    let runner = SessionRunner::new(config(), &session).unwrap();
    let outcomes = runner.run(&session).await;

    let ok: Vec<bool> = outcomes.iter().map(|o| o.succeeded()).collect();
    assert_eq!(ok, vec![true, true, true, false, true, true]);

    match &outcomes[3].result {
        StepResult::Failed { error, .. } => assert!(error.contains("only the owner")),
        other => panic!("expected NotOwner, got {other:?}"),
    }
    match &outcomes[5].result {
        StepResult::Snapshot {
            value,
            surplus,
            roster,
        } => {
            // 1 + 2 reserve, + 2 for Bob, + 3 funded
            assert_eq!(*value, Lovelace(8_000_000));
            assert_eq!(*surplus, Some(Lovelace(4_500_000)));
            assert_eq!(roster.len(), 2);
            assert_eq!(roster[1].name, "Bob");
            assert_eq!(roster[1].salary, Lovelace(2_500_000));
        }
        other => panic!("expected snapshot, got {other:?}"),
    }

    let stats = runner.service().stats().await;
    assert_eq!(stats.transitions_submitted, 4);
    assert_eq!(stats.rejected_requests, 1);

    let json = serde_json::to_value(&outcomes).unwrap();
    assert_eq!(json[0]["result"]["status"], "submitted");
    assert_eq!(json[3]["result"]["status"], "failed");
}

#[test]
fn test_missing_file() {
    let path = std::path::Path::new("/nonexistent/payroll-session.json");
    assert!(matches!(Session::load(path), Err(SessionError::Io(_))));
}

#[test]
fn test_runner_rejects_unconfigured_contract() {
    let session = Session::from_json(r#"{"wallets":{},"steps":[]}"#).unwrap();
    assert!(matches!(
        SessionRunner::new(PayrollConfig::default(), &session),
        Err(SessionError::Engine(PayrollError::InvalidConfig(_)))
    ));
}
