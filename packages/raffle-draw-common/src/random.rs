use std::collections::VecDeque;
use std::num::NonZeroU32;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

use crate::types::DrawMethod;

/// Source of uniformly distributed 32-bit values.
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Tag recorded on the winner record.
    fn method(&self) -> DrawMethod;

    /// One 32-bit draw reduced modulo `bound`.
    ///
    /// Bounds that do not divide 2^32 carry a small modulo bias; that bias is
    /// accepted and rejection sampling is deliberately not used.
    fn next_below(&mut self, bound: NonZeroU32) -> u32 {
        self.next_u32() % bound.get()
    }
}

/// ChaCha20 keystream keyed from a verified drand beacon.
///
/// `key = sha256(beacon_randomness || domain)`. The domain separates raffles
/// drawn from the same beacon.
pub struct BeaconRng {
    rng: ChaCha20Rng,
    round: u64,
}

impl BeaconRng {
    pub fn new(beacon_randomness: &[u8; 32], round: u64, domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(beacon_randomness);
        hasher.update(domain);
        let key: [u8; 32] = hasher.finalize().into();

        Self {
            rng: ChaCha20Rng::from_seed(key),
            round,
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }
}

impl RandomSource for BeaconRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn method(&self) -> DrawMethod {
        DrawMethod::DrandChaCha20 { round: self.round }
    }
}

/// Replays a fixed list of values, cycling when exhausted. Used for tests and
/// dry runs where the outcome must be reproducible.
pub struct FixedSequence {
    values: VecDeque<u32>,
}

impl FixedSequence {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl RandomSource for FixedSequence {
    fn next_u32(&mut self) -> u32 {
        match self.values.pop_front() {
            Some(v) => {
                self.values.push_back(v);
                v
            }
            None => 0,
        }
    }

    fn method(&self) -> DrawMethod {
        DrawMethod::FixedSequence
    }
}
