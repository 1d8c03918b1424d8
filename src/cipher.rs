//! The toy SPN block cipher: round function, key schedule, and the encryption and
//! decryption pipelines.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::Error;
use crate::pbox::Pbox;
use crate::sbox::Sbox;

/// The built-in substitution table (the PRESENT S-box).
pub const SBOX: [u8; 16] = [0xc, 0x5, 0x6, 0xb,
                            0x9, 0x0, 0xa, 0xd,
                            0x3, 0xe, 0xf, 0x8,
                            0x4, 0x7, 0x1, 0x2];

/// The built-in bit permutation, a transposition of the 4x4 bit matrix.
pub const PBOX: [u8; 16] = [0x0, 0x4, 0x8, 0xc,
                            0x1, 0x5, 0x9, 0xd,
                            0x2, 0x6, 0xa, 0xe,
                            0x3, 0x7, 0xb, 0xf];

/// A structure representing an instance of the cipher: a round count and the two
/// tables. Tables are validated once at construction and immutable afterwards, so an
/// instance can be shared freely between the encryption side and the attack.
#[derive(Clone)]
pub struct Spn {
    rounds: usize,
    sbox: Sbox,
    pbox: Pbox,
}

impl Spn {
    /// Creates a cipher instance with the built-in tables.
    pub fn new(rounds: usize) -> Result<Spn, Error> {
        Spn::with_tables(rounds, Sbox::new(SBOX)?, Pbox::new(PBOX)?)
    }

    /// Creates a cipher instance with caller-supplied tables. The pipeline consists of
    /// `rounds - 1` full rounds followed by the final substitution round, so at least
    /// two rounds are required.
    pub fn with_tables(rounds: usize, sbox: Sbox, pbox: Pbox) -> Result<Spn, Error> {
        if rounds < 2 {
            return Err(Error::TooFewRounds(rounds));
        }

        Ok(Spn { rounds, sbox, pbox })
    }

    /// Returns the number of rounds.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Returns a reference to the S-box of the cipher.
    pub fn sbox(&self) -> &Sbox {
        &self.sbox
    }

    /// Returns a reference to the P-box of the cipher.
    pub fn pbox(&self) -> &Pbox {
        &self.pbox
    }

    /// Draws a random master key from the operating system's random source and expands
    /// it into a schedule. A failing source is surfaced, never retried.
    pub fn generate_keys(&self) -> Result<Vec<u16>, Error> {
        let mut bytes = [0; 2];
        OsRng.try_fill_bytes(&mut bytes)?;

        Ok(self.key_schedule(u16::from_be_bytes(bytes)))
    }

    /// Expands a master key into `rounds + 1` round keys. Every round key is the
    /// previous one rotated left by four bits, so any contiguous 4-bit window of the
    /// master key, together with its rotation offset, determines the whole schedule.
    pub fn key_schedule(&self, key: u16) -> Vec<u16> {
        let mut keys = Vec::with_capacity(self.rounds + 1);
        let mut key = key;

        for _ in 0..=self.rounds {
            keys.push(key);
            key = key.rotate_left(4);
        }

        keys
    }

    /// Applies one non-final round: key mixing, substitution, bit permutation.
    fn round(&self, block: u16, round_key: u16) -> u16 {
        self.pbox.permute(self.sbox.substitute(block ^ round_key))
    }

    /// Encrypts a single block. The final substitution round skips the permutation;
    /// the attack targets exactly this unpermuted layer, so the asymmetry must stay.
    pub fn encrypt_block(&self, block: u16, round_keys: &[u16]) -> u16 {
        debug_assert_eq!(round_keys.len(), self.rounds + 1);

        let mut output = block;

        for &round_key in round_keys.iter().take(self.rounds - 1) {
            output = self.round(output, round_key);
        }

        output = self.sbox.substitute(output ^ round_keys[self.rounds - 1]);
        output ^ round_keys[self.rounds]
    }

    /// Decrypts a single block by running the pipeline backwards.
    pub fn decrypt_block(&self, block: u16, round_keys: &[u16]) -> u16 {
        debug_assert_eq!(round_keys.len(), self.rounds + 1);

        let mut output = block ^ round_keys[self.rounds];
        output = self.sbox.substitute_inv(output);
        output ^= round_keys[self.rounds - 1];

        for &round_key in round_keys[..self.rounds - 1].iter().rev() {
            output = self.sbox.substitute_inv(self.pbox.permute_inv(output));
            output ^= round_key;
        }

        output
    }

    /// Encrypts a sequence of blocks independently under the same schedule. There is
    /// no chaining between blocks; the attack relies on every pair being an
    /// independent sample under one fixed key.
    pub fn encrypt(&self, blocks: &[u16], round_keys: &[u16]) -> Vec<u16> {
        blocks.iter().map(|&block| self.encrypt_block(block, round_keys)).collect()
    }

    /// Decrypts a sequence of blocks independently under the same schedule.
    pub fn decrypt(&self, blocks: &[u16], round_keys: &[u16]) -> Vec<u16> {
        blocks.iter().map(|&block| self.decrypt_block(block, round_keys)).collect()
    }
}

/// Samples `count` uniformly random blocks from the operating system's random source.
pub fn random_blocks(count: usize) -> Result<Vec<u16>, Error> {
    let mut bytes = vec![0; count * 2];
    OsRng.try_fill_bytes(&mut bytes)?;

    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect())
}
