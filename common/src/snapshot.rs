//! Persisted documents: the raw crawl dump and the genesis balance fixtures

use crate::balance::{total_of, NormalizedBalance};
use crate::byte_array::AccountKey;
use crate::types::AccountRecord;
use dashu_int::UBig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A JSON document whose size can be checked after it is read back
pub trait Document: Serialize + DeserializeOwned {
    /// Human readable name used in logs and errors
    const KIND: &'static str;

    fn record_count(&self) -> usize;
}

/// Everything retrieved by a crawl, in crawl order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsDump {
    pub accounts: Vec<AccountRecord>,
}

impl Document for AccountsDump {
    const KIND: &'static str = "accounts dump";

    fn record_count(&self) -> usize {
        self.accounts.len()
    }
}

/// Genesis entry keyed by public key, serialised as `["<hex>", "<integer>"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance(pub AccountKey, pub NormalizedBalance);

/// Balances section of a genesis fixture, keyed by public key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSnapshot {
    pub balances: Vec<GenesisBalance>,
}

impl GenesisSnapshot {
    pub fn push(&mut self, key: AccountKey, balance: NormalizedBalance) {
        self.balances.push(GenesisBalance(key, balance));
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of every balance in the fixture
    pub fn total_issuance(&self) -> UBig {
        total_of(self.balances.iter().map(|GenesisBalance(_, balance)| balance))
    }
}

impl Document for GenesisSnapshot {
    const KIND: &'static str = "genesis fixture";

    fn record_count(&self) -> usize {
        self.len()
    }
}

/// Genesis entry keyed by SS58 address, serialised as `["<address>", "<integer>"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressedBalance(pub String, pub NormalizedBalance);

/// Genesis fixture with public keys replaced by addresses of the target network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedSnapshot {
    pub balances: Vec<AddressedBalance>,
}

impl ConvertedSnapshot {
    pub fn total_issuance(&self) -> UBig {
        total_of(self.balances.iter().map(|AddressedBalance(_, balance)| balance))
    }
}

impl Document for ConvertedSnapshot {
    const KIND: &'static str = "converted genesis fixture";

    fn record_count(&self) -> usize {
        self.balances.len()
    }
}
