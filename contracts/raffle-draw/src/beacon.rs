use cosmwasm_std::Storage;
use drand_verify::{G2PubkeyRfc, Pubkey};
use raffle_draw_common::{BeaconRng, DrawError};
use sha2::{Digest, Sha256};

use crate::error::ContractError;
use crate::state::{StoredBeacon, BEACONS, TARGET_ROUNDS};

/// Quicknet public key (G2, 96 bytes), hex encoded.
/// Network: drand quicknet (bls-unchained-g1-rfc9380)
pub const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// BLS-verify a quicknet round and return its randomness, `sha256(signature)`.
///
/// Quicknet is unchained, so there is no previous signature.
pub fn verify_quicknet_round(
    pubkey: &[u8],
    round: u64,
    signature: &[u8],
) -> Result<[u8; 32], ContractError> {
    let pk_fixed: [u8; 96] = pubkey
        .try_into()
        .map_err(|_| ContractError::InvalidPubkeyLength { got: pubkey.len() })?;

    let pk = G2PubkeyRfc::from_fixed(pk_fixed).map_err(|_| ContractError::VerificationFailed {
        reason: "pubkey is not a valid G2 point".to_string(),
    })?;

    let valid = pk
        .verify(round, &[], signature)
        .map_err(|e| ContractError::VerificationFailed {
            reason: format!("{:?}", e),
        })?;
    if !valid {
        return Err(ContractError::VerificationFailed {
            reason: format!("signature does not match round {}", round),
        });
    }

    Ok(Sha256::digest(signature).into())
}

/// The verified beacon of the round `raffle_id` committed to at creation.
///
/// Beacons of earlier rounds are never used, even when they are the newest
/// stored: their randomness was public before the raffle's orders closed.
pub fn committed_beacon(
    storage: &dyn Storage,
    raffle_id: u64,
) -> Result<StoredBeacon, ContractError> {
    let round = TARGET_ROUNDS
        .may_load(storage, raffle_id)?
        .ok_or(DrawError::NotFound { raffle_id })?;
    BEACONS
        .may_load(storage, round)?
        .ok_or(ContractError::BeaconNotFound { round })
}

/// Random source for one raffle. Raffles committed to the same round get
/// independent streams through the raffle id domain.
pub fn raffle_rng(beacon: &StoredBeacon, raffle_id: u64) -> Result<BeaconRng, DrawError> {
    let randomness: [u8; 32] =
        beacon
            .randomness
            .as_slice()
            .try_into()
            .map_err(|_| DrawError::Randomness {
                reason: format!(
                    "beacon round {} holds {} bytes of randomness, expected 32",
                    beacon.round,
                    beacon.randomness.len()
                ),
            })?;

    let mut domain = Vec::with_capacity(15);
    domain.extend_from_slice(b"raffle:");
    domain.extend_from_slice(&raffle_id.to_be_bytes());

    Ok(BeaconRng::new(&randomness, beacon.round, &domain))
}
