//! Core type definitions for Harbour

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest network identifier representable in the two-byte SS58 prefix form
pub const MAX_NETWORK_ID: u16 = 16383;

/// One account as reported by the remote indexer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Checksummed address on the source chain
    pub address: String,

    /// Balance in display units, as a decimal string
    pub balance: String,
}

impl AccountRecord {
    pub fn new(address: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            balance: balance.into(),
        }
    }
}

/// SS58 network identifier, distinguishing chains that share the address format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct NetworkId(u16);

impl NetworkId {
    /// DataHighway
    pub const DATAHIGHWAY: NetworkId = NetworkId(33);

    /// Generic Substrate
    pub const SUBSTRATE: NetworkId = NetworkId(42);

    /// Returns `None` if the identifier does not fit the address prefix
    pub const fn new(id: u16) -> Option<Self> {
        if id <= MAX_NETWORK_ID {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for NetworkId {
    type Error = String;
    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::new(id).ok_or_else(|| format!("network id {id} exceeds {MAX_NETWORK_ID}"))
    }
}

impl From<NetworkId> for u16 {
    fn from(id: NetworkId) -> Self {
        id.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
