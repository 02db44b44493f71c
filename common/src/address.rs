//! SS58 address encoding for Harbour
//!
//! An SS58 address is the base58 encoding of
//! `prefix || public key || checksum`, where the prefix carries the
//! network identifier in one byte (ids below 64) or two bytes (ids up to
//! 16383), and the checksum is the first two bytes of
//! `blake2b-512("SS58PRE" || prefix || public key)`.

use crate::byte_array::AccountKey;
use crate::types::NetworkId;
use blake2::{Blake2b512, Digest};
use thiserror::Error;

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid base58 encoding: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("Invalid address length {0}")]
    InvalidLength(usize),

    #[error("Reserved or non-canonical address prefix 0x{0:02x}")]
    InvalidPrefix(u8),

    #[error("Address checksum mismatch")]
    ChecksumMismatch,

    #[error("Address belongs to network {found}, expected {expected}")]
    WrongNetwork { expected: NetworkId, found: NetworkId },
}

/// Address codec bound to one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ss58Codec {
    network: NetworkId,
}

impl Ss58Codec {
    pub fn new(network: NetworkId) -> Self {
        Self { network }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Encode a public key as an address on this network
    pub fn encode(&self, key: &AccountKey) -> String {
        encode(key, self.network)
    }

    /// Decode an address, rejecting any that was not issued for this network
    pub fn decode(&self, address: &str) -> Result<AccountKey, AddressError> {
        let (found, key) = decode_any(address)?;
        if found != self.network {
            return Err(AddressError::WrongNetwork {
                expected: self.network,
                found,
            });
        }
        Ok(key)
    }
}

/// Encode a public key under the given network identifier
pub fn encode(key: &AccountKey, network: NetworkId) -> String {
    let mut data = encode_prefix(network);
    data.extend_from_slice(key.as_ref());
    let checksum = checksum(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(data).into_string()
}

/// Decode an address of any network, returning the network it names
pub fn decode_any(address: &str) -> Result<(NetworkId, AccountKey), AddressError> {
    let data = bs58::decode(address).into_vec()?;

    let (prefix_len, network) = decode_prefix(&data)?;
    if data.len() != prefix_len + AccountKey::LEN + CHECKSUM_LEN {
        return Err(AddressError::InvalidLength(data.len()));
    }

    let (body, expected) = data.split_at(data.len() - CHECKSUM_LEN);
    if checksum(body)[..CHECKSUM_LEN] != *expected {
        return Err(AddressError::ChecksumMismatch);
    }

    let key = AccountKey::try_from(&body[prefix_len..])
        .map_err(|_| AddressError::InvalidLength(data.len()))?;
    Ok((network, key))
}

/// The network an address was issued for
pub fn network_of(address: &str) -> Result<NetworkId, AddressError> {
    decode_any(address).map(|(network, _)| network)
}

fn checksum(body: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREAMBLE);
    hasher.update(body);
    hasher.finalize().to_vec()
}

fn encode_prefix(network: NetworkId) -> Vec<u8> {
    let id = network.get();
    if id < 64 {
        vec![id as u8]
    } else {
        let first = ((id & 0b0000_0000_1111_1100) >> 2) as u8 | 0b0100_0000;
        let second = (id >> 8) as u8 | (((id & 0b0000_0000_0000_0011) as u8) << 6);
        vec![first, second]
    }
}

fn decode_prefix(data: &[u8]) -> Result<(usize, NetworkId), AddressError> {
    let first = *data.first().ok_or(AddressError::InvalidLength(0))?;
    match first {
        0..=63 => Ok((1, NetworkId::new(first as u16).ok_or(AddressError::InvalidPrefix(first))?)),
        64..=127 => {
            let second = *data.get(1).ok_or(AddressError::InvalidLength(data.len()))?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            let id = lower as u16 | ((upper as u16) << 8);
            // Ids below 64 must use the one byte form
            if id < 64 {
                return Err(AddressError::InvalidPrefix(first));
            }
            let network = NetworkId::new(id).ok_or(AddressError::InvalidPrefix(first))?;
            Ok((2, network))
        }
        _ => Err(AddressError::InvalidPrefix(first)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_NETWORK_ID;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for AccountKey {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut key = Self::default();
            key.0.iter_mut().for_each(|byte| {
                *byte = u8::arbitrary(g);
            });
            key
        }
    }

    impl Arbitrary for NetworkId {
        fn arbitrary(g: &mut Gen) -> Self {
            // Half of the draws take the one byte prefix form
            let id = if bool::arbitrary(g) {
                u16::arbitrary(g) % 64
            } else {
                u16::arbitrary(g) % (MAX_NETWORK_ID + 1)
            };
            NetworkId::new(id).unwrap()
        }
    }

    const ALICE_KEY: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const BOB_KEY: &str = "8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";

    const ALICE_SUBSTRATE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const BOB_SUBSTRATE: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
    const ALICE_DATAHIGHWAY: &str = "4Nn1beMcdNf3cZcp14hCR77cFjvEjmd8gBiLfEpfdauwP1KB";
    const ALICE_POLKADOT: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
    const ALICE_MOONBEAM: &str = "VdvKmYJfD4VXA9fzz1SbmCo2eYHSzUFbaDCZSuaNKJAe8YNg6";
    const ALICE_64: &str = "cEaNSpz4PxFcZ7nT1VEKrKewH67rfx6MfcM6yKojyyPz7qaqp";
    const ALICE_16383: &str = "yNa8JpqfFB3q8A29rCwSgxvdU94ufJw2yKKxDgznS5m1PoFvn";

    fn key(hex: &str) -> AccountKey {
        hex.parse().unwrap()
    }

    fn network(id: u16) -> NetworkId {
        NetworkId::new(id).unwrap()
    }

    #[test]
    fn encodes_known_substrate_addresses() {
        let codec = Ss58Codec::new(NetworkId::SUBSTRATE);
        assert_eq!(codec.encode(&key(ALICE_KEY)), ALICE_SUBSTRATE);
        assert_eq!(codec.encode(&key(BOB_KEY)), BOB_SUBSTRATE);
    }

    #[test]
    fn decodes_known_datahighway_address() {
        let codec = Ss58Codec::new(NetworkId::DATAHIGHWAY);
        assert_eq!(codec.decode(ALICE_DATAHIGHWAY).unwrap(), key(ALICE_KEY));
    }

    #[test]
    fn two_byte_prefixes() {
        for (id, address) in [(1284, ALICE_MOONBEAM), (64, ALICE_64), (16383, ALICE_16383)] {
            assert_eq!(encode(&key(ALICE_KEY), network(id)), address);
            assert_eq!(decode_any(address).unwrap(), (network(id), key(ALICE_KEY)));
        }
    }

    #[test]
    fn round_trips_addresses() {
        for address in [
            ALICE_SUBSTRATE,
            BOB_SUBSTRATE,
            ALICE_DATAHIGHWAY,
            ALICE_POLKADOT,
            ALICE_MOONBEAM,
        ] {
            let network = network_of(address).unwrap();
            let codec = Ss58Codec::new(network);
            assert_eq!(codec.encode(&codec.decode(address).unwrap()), address);
        }
    }

    #[test]
    fn round_trips_keys() {
        for seed in 0u8..=16 {
            let k = AccountKey::from([seed.wrapping_mul(37); 32]);
            for id in [0, 2, 33, 42, 63, 64, 255, 1284, 16383] {
                let codec = Ss58Codec::new(network(id));
                assert_eq!(codec.decode(&codec.encode(&k)).unwrap(), k);
            }
        }
    }

    #[test]
    fn rejects_address_from_other_network() {
        let codec = Ss58Codec::new(NetworkId::DATAHIGHWAY);
        assert_eq!(
            codec.decode(ALICE_SUBSTRATE),
            Err(AddressError::WrongNetwork {
                expected: NetworkId::DATAHIGHWAY,
                found: NetworkId::SUBSTRATE,
            })
        );
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut data = bs58::decode(ALICE_DATAHIGHWAY).into_vec().unwrap();
        let last = data.len() - 1;
        data[last] ^= 0x01;
        let tampered = bs58::encode(data).into_string();
        assert_eq!(
            decode_any(&tampered),
            Err(AddressError::ChecksumMismatch)
        );
    }

    #[test]
    fn rejects_corrupted_key_byte() {
        let mut data = bs58::decode(ALICE_DATAHIGHWAY).into_vec().unwrap();
        data[5] ^= 0x80;
        let tampered = bs58::encode(data).into_string();
        assert_eq!(
            decode_any(&tampered),
            Err(AddressError::ChecksumMismatch)
        );
    }

    #[test]
    fn rejects_bad_base58() {
        // '0', 'O', 'I' and 'l' are not in the base58 alphabet
        assert!(matches!(
            decode_any("0Nn1beMcdNf3cZcp14hCR77cFjvEjmd8gBiLfEpfdauwP1KB"),
            Err(AddressError::Base58(_))
        ));
    }

    #[test]
    fn rejects_truncated_address() {
        assert!(matches!(
            decode_any(&ALICE_DATAHIGHWAY[..20]),
            Err(AddressError::InvalidLength(_))
        ));
        assert_eq!(decode_any(""), Err(AddressError::InvalidLength(0)));
    }

    #[test]
    fn rejects_reserved_prefix() {
        let mut data = vec![0x80u8];
        data.extend_from_slice(&[0u8; 34]);
        let address = bs58::encode(data).into_string();
        assert_eq!(decode_any(&address), Err(AddressError::InvalidPrefix(0x80)));
    }

    #[test]
    fn rejects_non_canonical_two_byte_prefix() {
        // Two byte form of id 33
        let mut data = vec![0b0100_1000u8, 0b0100_0000];
        data.extend_from_slice(&key(ALICE_KEY).0);
        let sum = checksum(&data);
        data.extend_from_slice(&sum[..CHECKSUM_LEN]);
        let address = bs58::encode(data).into_string();
        assert!(matches!(
            decode_any(&address),
            Err(AddressError::InvalidPrefix(_))
        ));
    }

    #[quickcheck]
    fn decode_inverts_encode(key: AccountKey, network: NetworkId) -> bool {
        let codec = Ss58Codec::new(network);
        codec.decode(&codec.encode(&key)) == Ok(key)
    }

    #[quickcheck]
    fn address_names_its_network(key: AccountKey, network: NetworkId) -> bool {
        let address = encode(&key, network);
        let Ok((found, decoded)) = decode_any(&address) else {
            return false;
        };
        network_of(&address) == Ok(network)
            && found == network
            && encode(&decoded, found) == address
    }
}
