use crate::CrawlError;
use harbour_common::snapshot::AccountsDump;
use harbour_common::AccountRecord;
use std::collections::{BTreeSet, HashSet};

/// Progress of one crawl, owned by the crawler while it runs.
///
/// `total_count` is fixed by the first page response. Accounts are kept in
/// the order they were received, and an address index guards uniqueness.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    total_count: Option<u64>,
    pages_seen: BTreeSet<u64>,
    accounts: Vec<AccountRecord>,
    addresses: HashSet<String>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn pages_seen(&self) -> &BTreeSet<u64> {
        &self.pages_seen
    }

    pub fn accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Index of the last page, once the total is known
    pub fn max_page(&self, rows_per_page: u32) -> Option<u64> {
        self.total_count.map(|total| total / rows_per_page as u64)
    }

    /// First write wins; the total never changes once known
    pub fn set_total_count(&mut self, count: u64) {
        self.total_count.get_or_insert(count);
    }

    /// Append one page of records, failing on the first address already held.
    /// The state is left untouched if the page is rejected.
    pub fn absorb(&mut self, page: u64, records: Vec<AccountRecord>) -> Result<(), CrawlError> {
        let mut incoming = HashSet::with_capacity(records.len());
        for record in &records {
            if self.addresses.contains(&record.address) || !incoming.insert(record.address.as_str()) {
                return Err(CrawlError::DuplicateAccount {
                    address: record.address.clone(),
                    page,
                });
            }
        }

        self.addresses.extend(records.iter().map(|r| r.address.clone()));
        self.accounts.extend(records);
        self.pages_seen.insert(page);
        Ok(())
    }

    /// Check that every expected account was retrieved
    pub fn verify(&self) -> Result<(), CrawlError> {
        let expected = self.total_count.ok_or(CrawlError::NotStarted)?;
        let actual = self.accounts.len() as u64;
        if actual != expected {
            return Err(CrawlError::IncompleteCrawl { expected, actual });
        }
        Ok(())
    }

    /// The retrieved accounts as a persistable dump
    pub fn to_dump(&self) -> AccountsDump {
        AccountsDump {
            accounts: self.accounts.clone(),
        }
    }

    pub fn into_accounts(self) -> Vec<AccountRecord> {
        self.accounts
    }
}
