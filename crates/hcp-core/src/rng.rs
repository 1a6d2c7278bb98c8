//! Seeded randomness for the sampler and the graph generators.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Random stream owned by exactly one consumer.
///
/// A run never shares a stream: the sampler gets a fresh handle per epoch,
/// seeded through [`derive_substream_seed`], so any point on an epoch
/// boundary can be reproduced from the master seed alone.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Handle seeded from a 64-bit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform index in `[0, bound)`; `bound` must be positive.
    pub fn index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "index bound must be positive");
        self.rng.gen_range(0..bound)
    }

    /// Uniform integer in `[0, bound)`; `bound` must be positive.
    pub fn below_u64(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0, "bound must be positive");
        self.rng.gen_range(0..bound)
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Seed of substream `substream` under `master_seed`.
///
/// SipHash-1-3 with zero keys over `(master_seed, substream)`; the value is
/// identical on every platform.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}
