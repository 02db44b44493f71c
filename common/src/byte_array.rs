use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseKeyError {
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

macro_rules! declare_byte_array_type {
    ($name:ident, $size:expr) => {
        /// $name, serialised as a hex string
        #[derive(
            Default, Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr,
        )]
        pub struct $name(pub [u8; $size]);

        impl $name {
            pub const LEN: usize = $size;
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;
            fn try_from(arr: &[u8]) -> Result<Self, Self::Error> {
                Ok($name(arr.try_into()?))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = [u8; $size];
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        /// Parses lower or upper case hex, with or without a `0x` prefix
        impl FromStr for $name {
            type Err = ParseKeyError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(digits)?;
                let actual = bytes.len();
                let array: [u8; $size] = bytes.try_into().map_err(|_| ParseKeyError::Length {
                    expected: $size,
                    actual,
                })?;
                Ok(Self(array))
            }
        }
    };
}

// Raw sr25519/ed25519 public key identifying an account in genesis
declare_byte_array_type!(AccountKey, 32);
