// Harbour common library - main library exports

pub mod address;
pub mod balance;
pub mod byte_array;
pub mod configuration;
pub mod persist;
pub mod snapshot;
pub mod types;

// Flattened re-exports
pub use self::address::{AddressError, Ss58Codec};
pub use self::balance::{BalanceError, BalanceNormalizer, NormalizedBalance};
pub use self::byte_array::AccountKey;
pub use self::types::*;
