//! Persisting crawl dumps and genesis fixtures, each checked by reading the
//! written file back

use crate::AssembleError;
use dashu_int::UBig;
use harbour_common::persist::{read_document, write_verified, Layout};
use harbour_common::snapshot::{AccountsDump, ConvertedSnapshot, Document, GenesisSnapshot};
use harbour_module_account_crawler::{CrawlError, CrawlState};
use std::path::Path;
use tracing::info;

/// Record count and total issuance of a persisted fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSummary {
    pub records: usize,
    pub total_issuance: UBig,
}

/// Write a completed crawl as a compact dump. The persisted length must match
/// the total count the remote reported.
pub async fn write_raw_dump(path: &Path, state: &CrawlState) -> Result<AccountsDump, AssembleError> {
    state.verify()?;
    let expected = state.total_count().ok_or(CrawlError::NotStarted)? as usize;
    Ok(write_verified(path, &state.to_dump(), Layout::Compact, expected).await?)
}

pub async fn load_raw_dump(path: &Path) -> Result<AccountsDump, AssembleError> {
    let dump: AccountsDump = read_document(path).await?;
    info!("Loaded {} accounts from {}", dump.record_count(), path.display());
    Ok(dump)
}

/// Write the fixture pretty printed, then check both record count and total
/// issuance of what was read back
pub async fn write_genesis(
    path: &Path,
    snapshot: &GenesisSnapshot,
) -> Result<GenesisSnapshot, AssembleError> {
    let persisted = write_verified(path, snapshot, Layout::Pretty, snapshot.len()).await?;
    check_issuance(snapshot.total_issuance(), persisted.total_issuance())?;
    Ok(persisted)
}

pub async fn write_converted(
    path: &Path,
    converted: &ConvertedSnapshot,
) -> Result<ConvertedSnapshot, AssembleError> {
    let expected = converted.record_count();
    let persisted = write_verified(path, converted, Layout::Pretty, expected).await?;
    check_issuance(converted.total_issuance(), persisted.total_issuance())?;
    Ok(persisted)
}

/// Summarise a persisted fixture keyed by public key
pub async fn inspect(path: &Path) -> Result<FixtureSummary, AssembleError> {
    let snapshot: GenesisSnapshot = read_document(path).await?;
    let summary = FixtureSummary {
        records: snapshot.len(),
        total_issuance: snapshot.total_issuance(),
    };
    info!(
        "{} holds {} balances with total issuance {}",
        path.display(),
        summary.records,
        summary.total_issuance
    );
    Ok(summary)
}

fn check_issuance(expected: UBig, found: UBig) -> Result<(), AssembleError> {
    if expected != found {
        return Err(AssembleError::IssuanceMismatch { expected, found });
    }
    info!("Verified total issuance {found}");
    Ok(())
}
