//! # Directory Resolver
//!
//! Identity resolution from a fixed address book. Stands in for bech32
//! address parsing when running against the in-memory ledger.

use crate::domain::value_objects::{KeyHash, WalletAddress};
use crate::errors::IdentityError;
use crate::ports::outbound::IdentityResolver;
use std::collections::HashMap;

/// Wallet address to key hash lookup.
#[derive(Clone, Debug, Default)]
pub struct DirectoryResolver {
    entries: HashMap<WalletAddress, KeyHash>,
}

impl DirectoryResolver {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_wallet(mut self, address: WalletAddress, identity: KeyHash) -> Self {
        self.insert(address, identity);
        self
    }

    /// Registers `address`, replacing any previous credential.
    pub fn insert(&mut self, address: WalletAddress, identity: KeyHash) {
        self.entries.insert(address, identity);
    }

    /// Number of registered wallets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no wallet is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(WalletAddress, KeyHash)> for DirectoryResolver {
    fn from_iter<I: IntoIterator<Item = (WalletAddress, KeyHash)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IdentityResolver for DirectoryResolver {
    fn derive_identity(&self, address: &WalletAddress) -> Result<KeyHash, IdentityError> {
        self.entries
            .get(address)
            .copied()
            .ok_or_else(|| IdentityError::NoCredential {
                address: address.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let resolver = DirectoryResolver::new()
            .with_wallet(WalletAddress::new("addr_owner"), KeyHash::new([1; 28]));
        assert_eq!(
            resolver.derive_identity(&WalletAddress::new("addr_owner")),
            Ok(KeyHash::new([1; 28]))
        );
        assert_eq!(
            resolver.derive_identity(&WalletAddress::new("addr_script")),
            Err(IdentityError::NoCredential {
                address: WalletAddress::new("addr_script")
            })
        );
    }
}
