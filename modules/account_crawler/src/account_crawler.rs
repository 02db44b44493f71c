//! Harbour account crawler
//! Retrieves every account from a paginated remote ledger index, one rate
//! limited page at a time, in ascending page order.

pub mod client;
pub mod configuration;
pub mod gate;
pub mod state;

pub use crate::client::{AccountPage, PageRequest, PageSource, SubscanClient, TransportError};
pub use crate::configuration::{CrawlerConfig, MAX_ROWS_PER_PAGE};
pub use crate::gate::RequestGate;
pub use crate::state::CrawlState;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Duplicate account {address} detected on page {page}")]
    DuplicateAccount { address: String, page: u64 },

    #[error("Incomplete crawl: expected {expected} accounts, retrieved {actual}")]
    IncompleteCrawl { expected: u64, actual: u64 },

    #[error("Crawl has not retrieved its first page")]
    NotStarted,

    #[error("Rows per page must be within 1..=100, got {0}")]
    InvalidPageSize(u32),
}

impl CrawlError {
    /// Only transport failures are worth resuming; everything else means the
    /// remote data itself is inconsistent
    pub fn is_transient(&self) -> bool {
        matches!(self, CrawlError::Transport(_))
    }
}

/// Drives a page source until the collection is exhausted
pub struct Crawler<S> {
    source: S,
    rows_per_page: u32,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, rows_per_page: u32) -> Result<Self, CrawlError> {
        if rows_per_page == 0 || rows_per_page > MAX_ROWS_PER_PAGE {
            return Err(CrawlError::InvalidPageSize(rows_per_page));
        }
        Ok(Self {
            source,
            rows_per_page,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }

    /// Crawl the whole collection from scratch
    pub async fn crawl_all(&self) -> Result<CrawlState, CrawlError> {
        let mut state = CrawlState::new();
        self.resume(&mut state).await?;
        Ok(state)
    }

    /// Crawl from scratch, resuming the same state after transport failures
    /// up to `max_attempts` attempts in total
    pub async fn crawl_with_retries(&self, max_attempts: u32) -> Result<CrawlState, CrawlError> {
        let mut state = CrawlState::new();
        let mut attempt = 1;
        loop {
            match self.resume(&mut state).await {
                Ok(()) => return Ok(state),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(
                        "Crawl attempt {attempt} of {max_attempts} failed after {} accounts: {e}",
                        state.len()
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Continue a crawl, fetching only the pages `state` has not absorbed.
    /// On success every account has been retrieved exactly once.
    pub async fn resume(&self, state: &mut CrawlState) -> Result<(), CrawlError> {
        let start = Instant::now();

        if state.total_count().is_none() {
            let first = self.fetch(0).await?;
            info!("Accounts available from API: {}", first.count);
            state.set_total_count(first.count);
            self.absorb(state, 0, first)?;
        }

        let total = state.total_count().ok_or(CrawlError::NotStarted)?;
        let max_page = total / self.rows_per_page as u64;

        for page in 0..=max_page {
            if state.pages_seen().contains(&page) {
                continue;
            }
            let response = self.fetch(page).await?;
            if response.count != total {
                warn!(
                    "Page {page} reports {} accounts, crawl started with {total}",
                    response.count
                );
            }
            self.absorb(state, page, response)?;
        }

        state.verify()?;
        info!(
            "Retrieved {} accounts over {} pages in {:.2?}",
            state.len(),
            max_page + 1,
            start.elapsed()
        );
        Ok(())
    }

    async fn fetch(&self, page: u64) -> Result<AccountPage, CrawlError> {
        let request = PageRequest::ascending(page, self.rows_per_page);
        Ok(self.source.fetch_page(&request).await?)
    }

    fn absorb(
        &self,
        state: &mut CrawlState,
        page: u64,
        response: AccountPage,
    ) -> Result<(), CrawlError> {
        let max_page = state.max_page(self.rows_per_page).unwrap_or(page);
        info!(
            "Processing page {page} of {max_page} with {} rows",
            response.list.len()
        );
        state.absorb(page, response.list)
    }
}
