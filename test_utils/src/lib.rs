//! Fixtures shared by the Harbour module tests

use harbour_common::address;
use harbour_common::{AccountKey, AccountRecord, NetworkId};
use serde_json::{json, Value};

/// Deterministic public key, distinct for every seed
pub fn account_key(seed: u64) -> AccountKey {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_be_bytes());
    for (i, byte) in bytes.iter_mut().enumerate().skip(8) {
        *byte = (seed as u8).wrapping_mul(31).wrapping_add(i as u8);
    }
    AccountKey::from(bytes)
}

/// Display-unit balance for the `i`th sample account. Every 10th account is
/// dust below a 0.001 existential deposit.
pub fn sample_balance(i: usize) -> String {
    if i % 10 == 9 {
        "0.0001".to_string()
    } else {
        format!("{}.{:03}", i * 17 % 5000, i % 1000)
    }
}

/// `n` accounts with valid, unique addresses on `network`
pub fn sample_accounts(n: usize, network: NetworkId) -> Vec<AccountRecord> {
    (0..n)
        .map(|i| AccountRecord::new(address::encode(&account_key(i as u64), network), sample_balance(i)))
        .collect()
}

/// Successful response envelope for one page of the account collection
pub fn subscan_body(count: u64, list: &[AccountRecord]) -> Value {
    json!({
        "code": 0,
        "message": "Success",
        "generated_at": 1700000000,
        "data": {
            "count": count,
            "list": list,
        }
    })
}

/// Split `accounts` into the pages a server with `rows` per page would return,
/// including the trailing page that may be empty
pub fn pages(accounts: &[AccountRecord], rows: usize) -> Vec<Vec<AccountRecord>> {
    let max_page = accounts.len() / rows;
    (0..=max_page)
        .map(|page| {
            let start = page * rows;
            let end = (start + rows).min(accounts.len());
            accounts[start..end].to_vec()
        })
        .collect()
}
