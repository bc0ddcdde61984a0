//! Typed keys for the address index store.

use std::fmt;

/// A structured store key that renders to the byte key used by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Table of subscribed addresses and their cached balances.
    SubscribedAddresses,
    /// Height of the last fully indexed block.
    IndexedBlockNumber,
    /// Empty marker present once an address is subscribed.
    Subscription(String),
    /// Ordered list of transaction hashes for one subscribed address.
    AddressTransactions(String),
    /// Body of one transaction.
    Transaction(String),
}

impl StoreKey {
    pub fn subscription(address: &str) -> Self {
        Self::Subscription(address.to_string())
    }

    pub fn address_transactions(address: &str) -> Self {
        Self::AddressTransactions(address.to_string())
    }

    pub fn transaction(hash: &str) -> Self {
        Self::Transaction(hash.to_string())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscribedAddresses => write!(f, "subscribed_addresses"),
            Self::IndexedBlockNumber => write!(f, "indexed_block_number"),
            Self::Subscription(address) => write!(f, "sub:{}", address),
            Self::AddressTransactions(address) => write!(f, "addr:{}", address),
            Self::Transaction(hash) => write!(f, "tx:{}", hash),
        }
    }
}
