//! Harbour genesis assembler
//! Turns crawled accounts into a genesis balances fixture keyed by public key,
//! and persists fixtures with a read-back verification.

pub mod converter;
pub mod fixture;

pub use crate::converter::convert;
pub use crate::fixture::{
    inspect, load_raw_dump, write_converted, write_genesis, write_raw_dump, FixtureSummary,
};

use dashu_int::UBig;
use harbour_common::configuration::GenesisConfig;
use harbour_common::persist::PersistError;
use harbour_common::snapshot::GenesisSnapshot;
use harbour_common::{
    AccountKey, AccountRecord, AddressError, BalanceError, BalanceNormalizer, Ss58Codec,
};
use harbour_module_account_crawler::CrawlError;
use std::collections::HashSet;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, info_span};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Invalid address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("Invalid balance for {address}: {source}")]
    InvalidBalance {
        address: String,
        #[source]
        source: BalanceError,
    },

    #[error("Public key {key} of {address} already appears in the fixture")]
    DuplicateKey { key: AccountKey, address: String },

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Persist(PersistError),

    #[error("Verification failed: persisted {found} records, expected {expected}")]
    VerificationFailed { expected: usize, found: usize },

    #[error("Total issuance mismatch: expected {expected}, found {found}")]
    IssuanceMismatch { expected: UBig, found: UBig },
}

impl From<PersistError> for AssembleError {
    fn from(e: PersistError) -> Self {
        match e {
            PersistError::CountMismatch {
                expected, found, ..
            } => AssembleError::VerificationFailed { expected, found },
            other => AssembleError::Persist(other),
        }
    }
}

/// Converts account records for one target chain
#[derive(Debug, Clone)]
pub struct GenesisAssembler {
    codec: Ss58Codec,
    /// Template with an empty issuance total, cloned for every run
    normalizer: BalanceNormalizer,
}

impl GenesisAssembler {
    pub fn new(codec: Ss58Codec, normalizer: BalanceNormalizer) -> Self {
        Self { codec, normalizer }
    }

    pub fn from_config(config: &GenesisConfig) -> Result<Self, BalanceError> {
        Ok(Self::new(config.codec(), config.normalizer()?))
    }

    pub fn codec(&self) -> &Ss58Codec {
        &self.codec
    }

    /// Build the fixture, preserving record order. The first record that
    /// cannot be decoded or normalised aborts the whole run.
    pub fn assemble(&self, records: &[AccountRecord]) -> Result<GenesisSnapshot, AssembleError> {
        let span = info_span!("assemble", records = records.len());
        let _entered = span.enter();
        let start = Instant::now();

        let mut normalizer = self.normalizer.clone();
        let mut snapshot = GenesisSnapshot::default();
        let mut keys = HashSet::with_capacity(records.len());

        for record in records {
            let key = self.codec.decode(&record.address).map_err(|source| {
                AssembleError::InvalidAddress {
                    address: record.address.clone(),
                    source,
                }
            })?;
            if !keys.insert(key) {
                return Err(AssembleError::DuplicateKey {
                    key,
                    address: record.address.clone(),
                });
            }
            let balance = normalizer.normalize(&record.balance).map_err(|source| {
                AssembleError::InvalidBalance {
                    address: record.address.clone(),
                    source,
                }
            })?;
            debug!("{} -> {key} {balance}", record.address);
            snapshot.push(key, balance);
        }

        let found = snapshot.total_issuance();
        if found != *normalizer.total_issuance() {
            return Err(AssembleError::IssuanceMismatch {
                expected: normalizer.total_issuance().clone(),
                found,
            });
        }

        info!(
            "Assembled {} balances with total issuance {found} in {:.2?}",
            snapshot.len(),
            start.elapsed()
        );
        Ok(snapshot)
    }
}
