//! Deterministic random number generation.
//!
//! RULE: Nothing in the rota may call any platform RNG.
//! All randomness (tie-breaks, weight mutation, simulated standby
//! activation) flows through a `RandomSource`. Production code uses
//! `StreamRng` instances derived from a single master seed:
//!   - Adding a new stream never changes existing streams.
//!   - Each stream is fully reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// The injectable randomness seam.
pub trait RandomSource {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Roll a float in [lo, hi].
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// A named, deterministic RNG stream.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }
}

impl RandomSource for StreamRng {
    fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// All RNG streams for a single process run, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_stream(&self, stream: RngStream) -> StreamRng {
        StreamRng::new(self.master_seed, stream as u64).with_name(stream.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngStream {
    TieBreak = 0,
    Mutation = 1,
    StandbyActivation = 2,
}

impl RngStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TieBreak => "tie_break",
            Self::Mutation => "mutation",
            Self::StandbyActivation => "standby_activation",
        }
    }
}
