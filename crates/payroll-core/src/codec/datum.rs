//! Mapping between the payroll domain and Plutus data.
//!
//! ```text
//! PayrollRecord  = Constr 0 [owner: bytes(28), employees: [Employee]]
//! Employee       = Constr 0 [name: bytes, identity: bytes(28),
//!                            salary: int, lastPaid: int, nextPay: int]
//! PayrollAction  = Constr 0 [Employee]      AddEmployee
//!                | Constr 1 [Employee]      UpdateEmployee
//!                | Constr 2 [identity]      RemoveEmployee
//!                | Constr 3 []              WithdrawSalary
//!                | Constr 4 []              FundPayroll
//! ```

use super::plutus::PlutusData;
use crate::domain::actions::PayrollAction;
use crate::domain::entities::{EmployeeEntry, PayrollRecord};
use crate::domain::value_objects::{EmployeeName, KeyHash, Lovelace};
use crate::errors::{DecodeError, PayrollError};

const RECORD_CONSTR: u64 = 0;
const EMPLOYEE_CONSTR: u64 = 0;
const RECORD_FIELDS: usize = 2;
const EMPLOYEE_FIELDS: usize = 5;

// =============================================================================
// RECORD
// =============================================================================

/// Encodes the record as datum bytes.
#[must_use]
pub fn encode_record(record: &PayrollRecord) -> Vec<u8> {
    record_to_data(record).to_cbor()
}

/// Decodes datum bytes into a record.
pub fn decode_record(bytes: &[u8]) -> Result<PayrollRecord, DecodeError> {
    record_from_data(&PlutusData::from_cbor(bytes)?)
}

/// Decodes a hex datum into a record.
pub fn decode_record_hex(text: &str) -> Result<PayrollRecord, DecodeError> {
    record_from_data(&PlutusData::from_hex(text)?)
}

/// Record as Plutus data.
#[must_use]
pub fn record_to_data(record: &PayrollRecord) -> PlutusData {
    PlutusData::constr(
        RECORD_CONSTR,
        vec![
            PlutusData::Bytes(record.owner().as_bytes().to_vec()),
            PlutusData::List(record.employees().iter().map(employee_to_data).collect()),
        ],
    )
}

/// Record from Plutus data.
pub fn record_from_data(data: &PlutusData) -> Result<PayrollRecord, DecodeError> {
    let malformed = |reason: String| DecodeError::MalformedRecord { reason };

    let fields = match data {
        PlutusData::Constr { tag, fields } if *tag == RECORD_CONSTR => fields,
        other => {
            return Err(malformed(format!(
                "expected constructor 0, found {}",
                other.kind()
            )))
        }
    };
    if fields.len() != RECORD_FIELDS {
        return Err(malformed(format!(
            "expected {RECORD_FIELDS} fields, found {}",
            fields.len()
        )));
    }

    let owner = match &fields[0] {
        PlutusData::Bytes(bytes) => KeyHash::from_slice(bytes).ok_or_else(|| {
            malformed(format!("owner must be {} bytes, found {}", KeyHash::LEN, bytes.len()))
        })?,
        other => return Err(malformed(format!("owner must be bytes, found {}", other.kind()))),
    };

    let items = match &fields[1] {
        PlutusData::List(items) => items,
        other => {
            return Err(malformed(format!(
                "employees must be a list, found {}",
                other.kind()
            )))
        }
    };

    let employees = items
        .iter()
        .enumerate()
        .map(|(index, item)| employee_from_data(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    PayrollRecord::new(owner, employees).map_err(|err| match err {
        PayrollError::DuplicateIdentity { identity } => {
            malformed(format!("duplicate employee identity {identity}"))
        }
        other => malformed(other.to_string()),
    })
}

// =============================================================================
// EMPLOYEE
// =============================================================================

/// Employee entry as Plutus data.
#[must_use]
pub fn employee_to_data(entry: &EmployeeEntry) -> PlutusData {
    PlutusData::constr(
        EMPLOYEE_CONSTR,
        vec![
            PlutusData::Bytes(entry.name.as_bytes().to_vec()),
            PlutusData::Bytes(entry.identity.as_bytes().to_vec()),
            PlutusData::Integer(i128::from(entry.salary.get())),
            PlutusData::Integer(i128::from(entry.last_paid)),
            PlutusData::Integer(i128::from(entry.next_pay)),
        ],
    )
}

/// Employee entry from Plutus data; `index` is its roster position.
pub fn employee_from_data(index: usize, data: &PlutusData) -> Result<EmployeeEntry, DecodeError> {
    let malformed = |reason: String| DecodeError::MalformedEmployee { index, reason };

    let fields = match data {
        PlutusData::Constr { tag, fields } if *tag == EMPLOYEE_CONSTR => fields,
        other => {
            return Err(malformed(format!(
                "expected constructor 0, found {}",
                other.kind()
            )))
        }
    };
    if fields.len() != EMPLOYEE_FIELDS {
        return Err(malformed(format!(
            "expected {EMPLOYEE_FIELDS} fields, found {}",
            fields.len()
        )));
    }

    let name = match &fields[0] {
        PlutusData::Bytes(bytes) => EmployeeName::from_bytes(bytes.clone()),
        other => return Err(malformed(format!("name must be bytes, found {}", other.kind()))),
    };
    let identity = match &fields[1] {
        PlutusData::Bytes(bytes) => KeyHash::from_slice(bytes).ok_or_else(|| {
            malformed(format!(
                "identity must be {} bytes, found {}",
                KeyHash::LEN,
                bytes.len()
            ))
        })?,
        other => {
            return Err(malformed(format!(
                "identity must be bytes, found {}",
                other.kind()
            )))
        }
    };
    let natural = |field: &str, data: &PlutusData| -> Result<u64, DecodeError> {
        match data {
            PlutusData::Integer(value) if *value < 0 => {
                Err(malformed(format!("{field} is negative ({value})")))
            }
            PlutusData::Integer(value) => u64::try_from(*value)
                .map_err(|_| malformed(format!("{field} exceeds 64 bits ({value})"))),
            PlutusData::BigInteger { negative: true, .. } => {
                Err(malformed(format!("{field} is negative")))
            }
            PlutusData::BigInteger { magnitude, .. } => Err(malformed(format!(
                "{field} exceeds 64 bits ({} byte bignum)",
                magnitude.len()
            ))),
            other => Err(malformed(format!(
                "{field} must be an integer, found {}",
                other.kind()
            ))),
        }
    };

    Ok(EmployeeEntry {
        name,
        identity,
        salary: Lovelace(natural("salary", &fields[2])?),
        last_paid: natural("lastPaid", &fields[3])?,
        next_pay: natural("nextPay", &fields[4])?,
    })
}

// =============================================================================
// ACTION (REDEEMER)
// =============================================================================

/// Encodes the action as redeemer bytes.
#[must_use]
pub fn encode_action(action: &PayrollAction) -> Vec<u8> {
    action_to_data(action).to_cbor()
}

/// Action as Plutus data.
#[must_use]
pub fn action_to_data(action: &PayrollAction) -> PlutusData {
    let fields = match action {
        PayrollAction::AddEmployee(entry) | PayrollAction::UpdateEmployee(entry) => {
            vec![employee_to_data(entry)]
        }
        PayrollAction::RemoveEmployee(identity) => {
            vec![PlutusData::Bytes(identity.as_bytes().to_vec())]
        }
        PayrollAction::WithdrawSalary | PayrollAction::FundPayroll => Vec::new(),
    };
    PlutusData::constr(action.tag(), fields)
}

/// Decodes redeemer bytes into an action.
pub fn decode_action(bytes: &[u8]) -> Result<PayrollAction, DecodeError> {
    action_from_data(&PlutusData::from_cbor(bytes)?)
}

/// Action from Plutus data.
pub fn action_from_data(data: &PlutusData) -> Result<PayrollAction, DecodeError> {
    let malformed = |reason: String| DecodeError::MalformedRecord {
        reason: format!("action: {reason}"),
    };
    let (tag, fields) = match data {
        PlutusData::Constr { tag, fields } => (*tag, fields.as_slice()),
        other => return Err(malformed(format!("expected constructor, found {}", other.kind()))),
    };
    match (tag, fields) {
        (0, [entry]) => Ok(PayrollAction::AddEmployee(employee_from_data(0, entry)?)),
        (1, [entry]) => Ok(PayrollAction::UpdateEmployee(employee_from_data(0, entry)?)),
        (2, [PlutusData::Bytes(bytes)]) => KeyHash::from_slice(bytes)
            .map(PayrollAction::RemoveEmployee)
            .ok_or_else(|| malformed(format!("identity must be 28 bytes, found {}", bytes.len()))),
        (3, []) => Ok(PayrollAction::WithdrawSalary),
        (4, []) => Ok(PayrollAction::FundPayroll),
        _ => Err(malformed(format!("unknown action {}", data.kind()))),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> KeyHash {
        KeyHash::new([0xaa; 28])
    }

    fn ann() -> EmployeeEntry {
        EmployeeEntry {
            name: EmployeeName::from_text("Ann"),
            identity: KeyHash::new([0xe1; 28]),
            salary: Lovelace(100),
            last_paid: 0,
            next_pay: 1_702_592_000,
        }
    }

    fn record() -> PayrollRecord {
        PayrollRecord::new(owner(), vec![ann()]).unwrap()
    }

    #[test]
    fn test_record_round_trip() {
        let rec = record();
        assert_eq!(decode_record(&encode_record(&rec)).unwrap(), rec);
    }

    #[test]
    fn test_empty_roster_encoding() {
        let rec = PayrollRecord::empty(owner());
        let hex = hex::encode(encode_record(&rec));
        // d879 9f 581c <owner> 80 ff
        assert_eq!(hex, format!("d8799f581c{}80ff", "aa".repeat(28)));
        assert_eq!(decode_record_hex(&hex).unwrap(), rec);
    }

    #[test]
    fn test_employee_field_order() {
        let data = employee_to_data(&ann());
        let PlutusData::Constr { tag: 0, fields } = data else {
            panic!("expected constructor 0");
        };
        assert_eq!(fields[0], PlutusData::Bytes(b"Ann".to_vec()));
        assert_eq!(fields[1], PlutusData::Bytes(vec![0xe1; 28]));
        assert_eq!(fields[2], PlutusData::Integer(100));
        assert_eq!(fields[3], PlutusData::Integer(0));
        assert_eq!(fields[4], PlutusData::Integer(1_702_592_000));
    }

    #[test]
    fn test_wrong_record_constructor() {
        let data = PlutusData::constr(1, vec![]);
        assert!(matches!(
            record_from_data(&data),
            Err(DecodeError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_wrong_record_arity() {
        let data = PlutusData::constr(0, vec![PlutusData::Bytes(vec![0xaa; 28])]);
        let err = record_from_data(&data).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedRecord {
                reason: "expected 2 fields, found 1".into()
            }
        );
    }

    #[test]
    fn test_short_owner_rejected() {
        let data = PlutusData::constr(
            0,
            vec![PlutusData::Bytes(vec![1; 20]), PlutusData::List(vec![])],
        );
        assert!(matches!(
            record_from_data(&data),
            Err(DecodeError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_employee_with_four_fields_rejected() {
        let mut fields = match employee_to_data(&ann()) {
            PlutusData::Constr { fields, .. } => fields,
            _ => unreachable!(),
        };
        fields.pop();
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::Bytes(owner().as_bytes().to_vec()),
                PlutusData::List(vec![employee_to_data(&ann()), PlutusData::constr(0, fields)]),
            ],
        );
        assert_eq!(
            record_from_data(&data).unwrap_err(),
            DecodeError::MalformedEmployee {
                index: 1,
                reason: "expected 5 fields, found 4".into()
            }
        );
    }

    #[test]
    fn test_negative_salary_rejected() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::Bytes(b"Bob".to_vec()),
                PlutusData::Bytes(vec![2; 28]),
                PlutusData::Integer(-5),
                PlutusData::Integer(0),
                PlutusData::Integer(10),
            ],
        );
        assert!(matches!(
            employee_from_data(3, &data),
            Err(DecodeError::MalformedEmployee { index: 3, .. })
        ));
    }

    #[test]
    fn test_oversized_timestamp_rejected() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::Bytes(b"Bob".to_vec()),
                PlutusData::Bytes(vec![2; 28]),
                PlutusData::Integer(5),
                PlutusData::Integer(0),
                PlutusData::Integer(i128::from(u64::MAX) + 1),
            ],
        );
        assert!(matches!(
            employee_from_data(0, &data),
            Err(DecodeError::MalformedEmployee { .. })
        ));
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::Bytes(owner().as_bytes().to_vec()),
                PlutusData::List(vec![employee_to_data(&ann()), employee_to_data(&ann())]),
            ],
        );
        assert!(matches!(
            record_from_data(&data),
            Err(DecodeError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_non_printable_name_survives() {
        let mut entry = ann();
        entry.name = EmployeeName::from_bytes(vec![0x00, b'A', 0xc3, 0xa9]);
        let rec = PayrollRecord::new(owner(), vec![entry.clone()]).unwrap();
        let back = decode_record(&encode_record(&rec)).unwrap();
        assert_eq!(back.employees()[0].name, entry.name);
        assert_eq!(back.employees()[0].name.display(), "\\x00A\\xc3\\xa9");
    }

    #[test]
    fn test_action_tags() {
        let actions = [
            PayrollAction::AddEmployee(ann()),
            PayrollAction::UpdateEmployee(ann()),
            PayrollAction::RemoveEmployee(ann().identity),
            PayrollAction::WithdrawSalary,
            PayrollAction::FundPayroll,
        ];
        for (expected_tag, action) in actions.iter().enumerate() {
            match action_to_data(action) {
                PlutusData::Constr { tag, .. } => assert_eq!(tag, expected_tag as u64),
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(&decode_action(&encode_action(action)).unwrap(), action);
        }
        assert_eq!(hex::encode(encode_action(&PayrollAction::WithdrawSalary)), "d87c80");
        assert_eq!(hex::encode(encode_action(&PayrollAction::FundPayroll)), "d87d80");
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(decode_action(&PlutusData::constr(5, vec![]).to_cbor()).is_err());
        assert!(decode_action(&PlutusData::constr(3, vec![PlutusData::Integer(1)]).to_cbor()).is_err());
    }

    #[test]
    fn test_wide_bignum_salary_is_malformed_employee() {
        let mut fields = match employee_to_data(&ann()) {
            PlutusData::Constr { fields, .. } => fields,
            other => panic!("unexpected {other:?}"),
        };
        fields[2] = PlutusData::BigInteger {
            negative: false,
            magnitude: vec![0x01; 17],
        };
        let datum = PlutusData::constr(
            0,
            vec![
                PlutusData::Bytes(owner().as_bytes().to_vec()),
                PlutusData::List(vec![PlutusData::constr(0, fields)]),
            ],
        )
        .to_cbor();

        let err = decode_record(&datum).unwrap_err();
        assert!(
            matches!(err, DecodeError::MalformedEmployee { index: 0, ref reason } if reason.contains("salary")),
            "got {err:?}"
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn entry() -> impl Strategy<Value = EmployeeEntry> {
            (
                proptest::collection::vec(any::<u8>(), 0..100),
                any::<[u8; 28]>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
            )
                .prop_map(|(name, identity, salary, last_paid, next_pay)| EmployeeEntry {
                    name: EmployeeName::from_bytes(name),
                    identity: KeyHash::new(identity),
                    salary: Lovelace(salary),
                    last_paid,
                    next_pay,
                })
        }

        proptest! {
            #[test]
            fn test_record_round_trips(
                owner in any::<[u8; 28]>(),
                entries in proptest::collection::vec(entry(), 0..8),
            ) {
                let mut employees: Vec<EmployeeEntry> = Vec::new();
                for e in entries {
                    if employees.iter().all(|x| x.identity != e.identity) {
                        employees.push(e);
                    }
                }
                let rec = PayrollRecord::new(KeyHash::new(owner), employees).unwrap();
                prop_assert_eq!(decode_record(&encode_record(&rec)).unwrap(), rec);
            }
        }
    }
}
