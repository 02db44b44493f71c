//! Re-keying of a genesis fixture from public keys to SS58 addresses

use harbour_common::snapshot::{AddressedBalance, ConvertedSnapshot, GenesisBalance, GenesisSnapshot};
use harbour_common::Ss58Codec;
use tracing::debug;

/// Replace every public key with its address under `codec`'s network.
/// Balances and order are carried through unchanged.
pub fn convert(snapshot: &GenesisSnapshot, codec: &Ss58Codec) -> ConvertedSnapshot {
    let balances = snapshot
        .balances
        .iter()
        .map(|GenesisBalance(key, balance)| {
            let address = codec.encode(key);
            debug!("Encoded {key} as {address}");
            AddressedBalance(address, balance.clone())
        })
        .collect();
    ConvertedSnapshot { balances }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbour_common::NetworkId;

    const ALICE_KEY: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const BOB_KEY: &str = "8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";

    #[test]
    fn converts_keys_to_datahighway_addresses() {
        let mut snapshot = GenesisSnapshot::default();
        snapshot.push(ALICE_KEY.parse().unwrap(), "1000000000000000".parse().unwrap());
        snapshot.push(BOB_KEY.parse().unwrap(), "17001000000000000000".parse().unwrap());

        let converted = convert(&snapshot, &Ss58Codec::new(NetworkId::DATAHIGHWAY));

        assert_eq!(
            serde_json::to_value(&converted).unwrap(),
            serde_json::json!({
                "balances": [
                    ["4Nn1beMcdNf3cZcp14hCR77cFjvEjmd8gBiLfEpfdauwP1KB", "1000000000000000"],
                    ["4MCrKaBUVef9TZ8Ja8jFfmCe9tuMHEDoBMa1bsgzZbzhcAze", "17001000000000000000"],
                ]
            })
        );
        assert_eq!(converted.total_issuance(), snapshot.total_issuance());
    }

    #[test]
    fn accepts_prefixed_keys() {
        let json = serde_json::json!({ "balances": [[format!("0x{ALICE_KEY}"), "5"]] });
        let snapshot: GenesisSnapshot = serde_json::from_value(json).unwrap();

        let converted = convert(&snapshot, &Ss58Codec::new(NetworkId::SUBSTRATE));
        assert_eq!(converted.balances[0].0, "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY");
    }

    #[test]
    fn addresses_decode_back_to_keys() {
        let codec = Ss58Codec::new(NetworkId::DATAHIGHWAY);
        let mut snapshot = GenesisSnapshot::default();
        for seed in 0..10u8 {
            snapshot.push([seed; 32].into(), "1".parse().unwrap());
        }

        let converted = convert(&snapshot, &codec);
        for (original, converted) in snapshot.balances.iter().zip(&converted.balances) {
            assert_eq!(codec.decode(&converted.0).unwrap(), original.0);
        }
    }
}
