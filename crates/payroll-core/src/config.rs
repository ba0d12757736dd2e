//! Configuration for the payroll engine.
//!
//! The contract address is resolved once at startup and injected everywhere;
//! nothing reads it from global state.

use crate::domain::guard::{CreationPolicy, FundingPolicy};
use crate::domain::services::{PayrollPolicy, DEFAULT_MIN_RESERVE, DEFAULT_PAY_CYCLE_SECS};
use crate::domain::value_objects::{ContractAddress, KeyHash, Lovelace};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    /// Script address holding the payroll record.
    pub contract_address: ContractAddress,
    /// Seconds between withdrawals.
    pub pay_cycle_secs: u64,
    /// Reserve locked on creation on top of the first salary.
    pub min_reserve: Lovelace,
    /// Who may fund an existing payroll.
    pub funding_policy: FundingPolicy,
    /// Who may create the payroll.
    pub creation_policy: CreationPolicy,
    /// Rebuild attempts after losing a conflict.
    pub max_conflict_retries: u32,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            contract_address: ContractAddress::new(""),
            pay_cycle_secs: DEFAULT_PAY_CYCLE_SECS,
            min_reserve: DEFAULT_MIN_RESERVE,
            funding_policy: FundingPolicy::Anyone,
            creation_policy: CreationPolicy::Open,
            max_conflict_retries: 3,
        }
    }
}

impl PayrollConfig {
    /// Defaults for `contract`.
    #[must_use]
    pub fn for_contract(contract: ContractAddress) -> Self {
        Self {
            contract_address: contract,
            ..Self::default()
        }
    }

    /// Builder parameters derived from this configuration.
    pub fn policy(&self) -> Result<PayrollPolicy, ConfigError> {
        PayrollPolicy::new(self.pay_cycle_secs, self.min_reserve)
    }

    /// Rejects unusable settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_address.as_str().trim().is_empty() {
            return Err(ConfigError::MissingContractAddress);
        }
        self.policy().map(|_| ())
    }

    /// Loads from `PAYROLL_*` environment variables over the defaults.
    ///
    /// - `PAYROLL_CONTRACT_ADDRESS` (required)
    /// - `PAYROLL_PAY_CYCLE_SECS`
    /// - `PAYROLL_MIN_RESERVE` (lovelace)
    /// - `PAYROLL_FUNDING_POLICY` (`anyone` or `owner_only`)
    /// - `PAYROLL_CREATION_OWNER` (key hash hex; restricts creation)
    /// - `PAYROLL_MAX_CONFLICT_RETRIES`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(address) = lookup("PAYROLL_CONTRACT_ADDRESS") {
            config.contract_address = ContractAddress::new(address.trim());
        }
        if let Some(value) = lookup("PAYROLL_PAY_CYCLE_SECS") {
            config.pay_cycle_secs = parse_var("PAYROLL_PAY_CYCLE_SECS", &value)?;
        }
        if let Some(value) = lookup("PAYROLL_MIN_RESERVE") {
            config.min_reserve = Lovelace(parse_var("PAYROLL_MIN_RESERVE", &value)?);
        }
        if let Some(value) = lookup("PAYROLL_FUNDING_POLICY") {
            config.funding_policy = match value.trim().to_lowercase().as_str() {
                "anyone" => FundingPolicy::Anyone,
                "owner_only" | "owner" => FundingPolicy::OwnerOnly,
                _ => return Err(invalid("PAYROLL_FUNDING_POLICY", &value)),
            };
        }
        if let Some(value) = lookup("PAYROLL_CREATION_OWNER") {
            let owner = KeyHash::from_hex(value.trim())
                .map_err(|_| invalid("PAYROLL_CREATION_OWNER", &value))?;
            config.creation_policy = CreationPolicy::Restricted(owner);
        }
        if let Some(value) = lookup("PAYROLL_MAX_CONFLICT_RETRIES") {
            config.max_conflict_retries = parse_var("PAYROLL_MAX_CONFLICT_RETRIES", &value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidVar {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PayrollConfig::default();
        assert_eq!(config.pay_cycle_secs, 2_592_000);
        assert_eq!(config.min_reserve, Lovelace(2_000_000));
        assert_eq!(config.funding_policy, FundingPolicy::Anyone);
        assert_eq!(config.max_conflict_retries, 3);
        assert_eq!(config.validate(), Err(ConfigError::MissingContractAddress));
    }

    #[test]
    fn test_from_lookup() {
        let owner = "ab".repeat(28);
        let config = PayrollConfig::from_lookup(lookup(&[
            ("PAYROLL_CONTRACT_ADDRESS", "addr_test1wpayroll"),
            ("PAYROLL_PAY_CYCLE_SECS", "60"),
            ("PAYROLL_FUNDING_POLICY", "owner_only"),
            ("PAYROLL_CREATION_OWNER", owner.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.contract_address.as_str(), "addr_test1wpayroll");
        assert_eq!(config.policy().unwrap().pay_cycle_secs(), 60);
        assert_eq!(config.funding_policy, FundingPolicy::OwnerOnly);
        assert_eq!(
            config.creation_policy,
            CreationPolicy::Restricted(KeyHash::new([0xab; 28]))
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert_eq!(
            PayrollConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingContractAddress)
        );
        assert_eq!(
            PayrollConfig::from_lookup(lookup(&[
                ("PAYROLL_CONTRACT_ADDRESS", "addr"),
                ("PAYROLL_PAY_CYCLE_SECS", "0"),
            ])),
            Err(ConfigError::ZeroPayCycle)
        );
        assert!(matches!(
            PayrollConfig::from_lookup(lookup(&[
                ("PAYROLL_CONTRACT_ADDRESS", "addr"),
                ("PAYROLL_MIN_RESERVE", "lots"),
            ])),
            Err(ConfigError::InvalidVar { .. })
        ));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: PayrollConfig =
            serde_json::from_str(r#"{"contract_address":"addr","funding_policy":"owner_only"}"#)
                .unwrap();
        assert_eq!(config.funding_policy, FundingPolicy::OwnerOnly);
        assert_eq!(config.pay_cycle_secs, DEFAULT_PAY_CYCLE_SECS);
        assert!(config.validate().is_ok());
    }
}
