//! A miniature substitution-permutation network on 16-bit blocks, together with a
//! linear-cryptanalysis attack that recovers the key from known plaintext/ciphertext
//! pairs.
//!
//! The cipher is deliberately weak: four 4-bit S-boxes per round, a bit permutation,
//! and a rotation-based key schedule, at a scale where the linear approximation table
//! of the S-box can be inspected by eye. The attack first scores all 256 guesses for
//! the two key nibbles the final substitution layer exposes, then brute-forces the
//! remaining nibbles of each promising guess against a short verification prefix of
//! the corpus.

pub mod attack;
pub mod cipher;
pub mod error;
pub mod lat;
pub mod pbox;
pub mod sbox;
pub mod utility;

pub use crate::error::Error;
