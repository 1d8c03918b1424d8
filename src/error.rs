//! Error types shared across the crate.

use thiserror::Error;

/// Errors surfaced by cipher construction and key generation. The round function, the
/// LAT builder, and the attack loops are total over their domains and never fail.
#[derive(Debug, Error)]
pub enum Error {
    /// The operating system's random source could not supply key material.
    #[error("random source failure: {0}")]
    RandomSource(#[from] rand::Error),

    /// The pipeline consists of full rounds followed by a separate final substitution
    /// round, so fewer than two rounds is rejected.
    #[error("at least 2 rounds are required, got {0}")]
    TooFewRounds(usize),

    /// The substitution table is not a permutation of the values 0..16.
    #[error("S-box table is not a bijection on 4-bit values")]
    InvalidSbox,

    /// The bit-position table is not a permutation of the positions 0..16.
    #[error("P-box table is not a bijection on bit positions")]
    InvalidPbox,
}
