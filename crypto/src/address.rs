//! Shelley address decoding and stake address derivation.
//!
//! Address format (CIP-19): one header byte followed by credential hashes.
//! The high nibble of the header is the address type, the low nibble the
//! network id. Base addresses (types 0–3) carry a 28-byte payment credential
//! followed by a 28-byte staking credential:
//!
//! | type | payment | stake  |
//! |------|---------|--------|
//! | 0    | key     | key    |
//! | 1    | script  | key    |
//! | 2    | key     | script |
//! | 3    | script  | script |
//!
//! Reward addresses are `header ++ stake_credential` with type 14 (key) or
//! 15 (script).

use bech32::{FromBase32, ToBase32, Variant};
use stakeclaim_types::{Network, PaymentAddress, StakeAddress};

use crate::AddressError;

/// Length of a credential hash (Blake2b-224).
const CREDENTIAL_LEN: usize = 28;
/// Header + payment credential + stake credential.
const BASE_ADDRESS_LEN: usize = 1 + 2 * CREDENTIAL_LEN;
/// Reward header high nibble for a key-hash staking credential.
const REWARD_KEY_HEADER: u8 = 0b1110_0000;
/// Reward header high nibble for a script-hash staking credential.
const REWARD_SCRIPT_HEADER: u8 = 0b1111_0000;

/// What a user typed into the address field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressInput {
    /// `$name`, resolved through the handle policy.
    Handle(String),
    /// Anything else is treated as a bech32 payment address.
    Payment(PaymentAddress),
}

impl AddressInput {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_prefix('$') {
            Some(name) => Self::Handle(name.to_string()),
            None => Self::Payment(PaymentAddress::new(trimmed)),
        }
    }
}

/// Indexer `unit` of the asset representing `handle` under `policy_id`.
pub fn handle_unit(policy_id: &str, handle: &str) -> Result<String, AddressError> {
    if handle.is_empty() {
        return Err(AddressError::EmptyHandle);
    }
    Ok(format!("{policy_id}{}", hex::encode(handle.as_bytes())))
}

/// Decode a bech32 address into its raw bytes.
pub fn decode_address(address: &str) -> Result<Vec<u8>, AddressError> {
    let (_hrp, data, variant) =
        bech32::decode(address).map_err(|e| AddressError::Bech32(e.to_string()))?;
    if variant != Variant::Bech32 {
        return Err(AddressError::Bech32("expected bech32, found bech32m".into()));
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32(e.to_string()))?;
    if bytes.is_empty() {
        return Err(AddressError::InvalidLength(0));
    }
    Ok(bytes)
}

/// Derive the reward (stake) address embedded in a base payment address.
///
/// Returns `Ok(None)` for well-formed addresses without a staking credential
/// (enterprise, pointer, reward). Undecodable input, a truncated base address,
/// or an address from another network is an error.
pub fn derive_stake_address(
    address: &PaymentAddress,
    network: Network,
) -> Result<Option<StakeAddress>, AddressError> {
    let bytes = decode_address(address.as_str())?;
    let header = bytes[0];
    let address_type = header >> 4;
    let network_id = header & 0x0f;

    if network_id != network.id() {
        return Err(AddressError::NetworkMismatch {
            expected: network.id(),
            found: network_id,
        });
    }

    let reward_header = match address_type {
        0 | 1 => REWARD_KEY_HEADER,
        2 | 3 => REWARD_SCRIPT_HEADER,
        _ => return Ok(None),
    };
    if bytes.len() != BASE_ADDRESS_LEN {
        return Err(AddressError::InvalidLength(bytes.len()));
    }

    let mut reward = Vec::with_capacity(1 + CREDENTIAL_LEN);
    reward.push(reward_header | network.id());
    reward.extend_from_slice(&bytes[1 + CREDENTIAL_LEN..]);

    let encoded = bech32::encode(network.reward_hrp(), reward.to_base32(), Variant::Bech32)
        .map_err(|e| AddressError::Bech32(e.to_string()))?;
    Ok(Some(StakeAddress::new(encoded)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // CIP-19 test vectors.
    const BASE_MAINNET: &str = "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x";
    const STAKE_MAINNET: &str = "stake1uyehkck0lajq8gr28t9uxnuvgcqrc6070x3k9r8048z8y5gh6ffgw";
    const ENTERPRISE_MAINNET: &str = "addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8";

    const PAYMENT_HASH: [u8; 28] = [0x11; 28];
    const STAKE_HASH: [u8; 28] = [0x22; 28];

    fn encode(hrp: &str, bytes: &[u8]) -> String {
        bech32::encode(hrp, bytes.to_base32(), Variant::Bech32).unwrap()
    }

    fn base_address(address_type: u8, network: Network) -> PaymentAddress {
        let mut bytes = vec![(address_type << 4) | network.id()];
        bytes.extend_from_slice(&PAYMENT_HASH);
        bytes.extend_from_slice(&STAKE_HASH);
        let hrp = match network {
            Network::Mainnet => "addr",
            Network::Testnet => "addr_test",
        };
        PaymentAddress::new(encode(hrp, &bytes))
    }

    fn expected_reward(header: u8, network: Network) -> String {
        let mut bytes = vec![header | network.id()];
        bytes.extend_from_slice(&STAKE_HASH);
        encode(network.reward_hrp(), &bytes)
    }

    #[test]
    fn cip19_base_address_yields_stake_address() {
        let addr = PaymentAddress::new(BASE_MAINNET);
        let stake = derive_stake_address(&addr, Network::Mainnet).unwrap();
        assert_eq!(stake.unwrap().as_str(), STAKE_MAINNET);
    }

    #[test]
    fn cip19_enterprise_address_has_no_stake_key() {
        let addr = PaymentAddress::new(ENTERPRISE_MAINNET);
        assert_eq!(derive_stake_address(&addr, Network::Mainnet).unwrap(), None);
    }

    #[test]
    fn key_stake_credential_uses_key_header() {
        for t in [0u8, 1] {
            let stake = derive_stake_address(&base_address(t, Network::Mainnet), Network::Mainnet)
                .unwrap()
                .unwrap();
            assert_eq!(stake.as_str(), expected_reward(0xe0, Network::Mainnet));
            assert!(stake.as_str().starts_with("stake1"));
        }
    }

    #[test]
    fn script_stake_credential_uses_script_header() {
        for t in [2u8, 3] {
            let stake = derive_stake_address(&base_address(t, Network::Mainnet), Network::Mainnet)
                .unwrap()
                .unwrap();
            assert_eq!(stake.as_str(), expected_reward(0xf0, Network::Mainnet));
        }
    }

    #[test]
    fn testnet_addresses_use_testnet_prefix() {
        let stake = derive_stake_address(&base_address(0, Network::Testnet), Network::Testnet)
            .unwrap()
            .unwrap();
        assert!(stake.as_str().starts_with("stake_test1"));
        assert_eq!(stake.as_str(), expected_reward(0xe0, Network::Testnet));
    }

    #[test]
    fn network_mismatch_is_rejected() {
        let err = derive_stake_address(&base_address(0, Network::Testnet), Network::Mainnet)
            .unwrap_err();
        assert_eq!(
            err,
            AddressError::NetworkMismatch {
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let addr = PaymentAddress::new("not-an-address");
        assert!(matches!(
            derive_stake_address(&addr, Network::Mainnet),
            Err(AddressError::Bech32(_))
        ));
    }

    #[test]
    fn truncated_base_address_is_invalid() {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&PAYMENT_HASH);
        let addr = PaymentAddress::new(encode("addr", &bytes));
        assert_eq!(
            derive_stake_address(&addr, Network::Mainnet),
            Err(AddressError::InvalidLength(29))
        );
    }

    #[test]
    fn dollar_prefix_is_a_handle() {
        assert_eq!(
            AddressInput::parse("$alice"),
            AddressInput::Handle("alice".into())
        );
        assert_eq!(
            AddressInput::parse(" addr1xyz "),
            AddressInput::Payment(PaymentAddress::new("addr1xyz"))
        );
    }

    #[test]
    fn handle_unit_is_policy_plus_hex_name() {
        assert_eq!(handle_unit("f0ff", "abc").unwrap(), "f0ff616263");
        assert_eq!(handle_unit("f0ff", ""), Err(AddressError::EmptyHandle));
    }
}
