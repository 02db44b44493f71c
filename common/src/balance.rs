//! Fixed-point balance normalisation
//!
//! Source balances arrive as decimal strings in display units. Genesis wants
//! integers in the smallest unit, i.e. `balance * 10^decimals`. All arithmetic
//! here is exact: decimals go through `BigDecimal` and the running issuance is
//! an unbounded `UBig`.

use bigdecimal::BigDecimal;
use dashu_int::UBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("Invalid decimal balance '{0}'")]
    InvalidDecimal(String),

    #[error("Invalid integer balance '{0}'")]
    InvalidInteger(String),

    #[error(
        "Balance {value} carries {decimals} fractional digits, more than the target precision of {target}"
    )]
    PrecisionOverflow {
        value: String,
        decimals: u64,
        target: u32,
    },

    #[error("Existential deposit must not be negative: {0}")]
    NegativeDeposit(String),
}

/// Integer balance in the target chain's smallest unit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedBalance(UBig);

impl NormalizedBalance {
    pub fn value(&self) -> &UBig {
        &self.0
    }
}

impl From<UBig> for NormalizedBalance {
    fn from(value: UBig) -> Self {
        Self(value)
    }
}

impl fmt::Display for NormalizedBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts only plain unsigned digit strings
impl FromStr for NormalizedBalance {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BalanceError::InvalidInteger(s.to_string()));
        }
        UBig::from_str(s)
            .map(Self)
            .map_err(|_| BalanceError::InvalidInteger(s.to_string()))
    }
}

impl Serialize for NormalizedBalance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NormalizedBalance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a plain decimal literal: optional sign, digits, optional fraction.
/// Exponents, whitespace and bare separators are rejected.
pub fn parse_decimal(text: &str) -> Result<BigDecimal, BalanceError> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !fraction.map_or(true, is_digits) {
        return Err(BalanceError::InvalidDecimal(text.to_string()));
    }

    BigDecimal::from_str(text).map_err(|_| BalanceError::InvalidDecimal(text.to_string()))
}

/// Number of digits after the separator in the value's canonical form,
/// i.e. ignoring trailing zeros
pub fn fractional_digits(value: &BigDecimal) -> u64 {
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    scale.max(0) as u64
}

/// Rescale `decimal` to an integer with `target_decimals` implied fractional
/// digits, after raising it to `existential_deposit` if it falls below.
pub fn normalize(
    decimal: &str,
    target_decimals: u32,
    existential_deposit: &BigDecimal,
) -> Result<NormalizedBalance, BalanceError> {
    let parsed = parse_decimal(decimal)?;
    let floored = if parsed < *existential_deposit {
        existential_deposit.clone()
    } else {
        parsed
    };

    let decimals = fractional_digits(&floored);
    if decimals > target_decimals as u64 {
        return Err(BalanceError::PrecisionOverflow {
            value: decimal.to_string(),
            decimals,
            target: target_decimals,
        });
    }

    // Exact: the target scale is never below the canonical scale
    let (units, _) = floored.with_scale(target_decimals as i64).as_bigint_and_exponent();
    units.to_string().parse()
}

/// Sum of a sequence of balances
pub fn total_of<'a>(balances: impl IntoIterator<Item = &'a NormalizedBalance>) -> UBig {
    let mut total = UBig::ZERO;
    for balance in balances {
        total += &balance.0;
    }
    total
}

/// Normaliser for one session, accumulating total issuance of everything it
/// has produced
#[derive(Debug, Clone)]
pub struct BalanceNormalizer {
    target_decimals: u32,
    existential_deposit: BigDecimal,
    total_issuance: UBig,
    normalized: usize,
}

impl BalanceNormalizer {
    pub fn new(target_decimals: u32, existential_deposit: &str) -> Result<Self, BalanceError> {
        let deposit = parse_decimal(existential_deposit)?;
        if deposit < BigDecimal::from(0) {
            return Err(BalanceError::NegativeDeposit(existential_deposit.to_string()));
        }

        let decimals = fractional_digits(&deposit);
        if decimals > target_decimals as u64 {
            return Err(BalanceError::PrecisionOverflow {
                value: existential_deposit.to_string(),
                decimals,
                target: target_decimals,
            });
        }

        Ok(Self {
            target_decimals,
            existential_deposit: deposit,
            total_issuance: UBig::ZERO,
            normalized: 0,
        })
    }

    pub fn normalize(&mut self, decimal: &str) -> Result<NormalizedBalance, BalanceError> {
        let balance = normalize(decimal, self.target_decimals, &self.existential_deposit)?;
        self.total_issuance += balance.value();
        self.normalized += 1;
        Ok(balance)
    }

    pub fn target_decimals(&self) -> u32 {
        self.target_decimals
    }

    pub fn existential_deposit(&self) -> &BigDecimal {
        &self.existential_deposit
    }

    pub fn total_issuance(&self) -> &UBig {
        &self.total_issuance
    }

    /// How many balances have been normalised in this session
    pub fn normalized_count(&self) -> usize {
        self.normalized
    }
}
