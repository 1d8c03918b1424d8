//! Type representing an S-box.

use crate::error::Error;

/// A structure that represents a 4-bit S-box together with its inverse.
#[derive(Clone, Debug)]
pub struct Sbox {
    table: [u8; 16],
    inverse: [u8; 16],
}

impl Sbox {
    /// Creates a new S-box from its table description and derives the inverse table.
    /// The table must be a permutation of the values 0..16.
    pub fn new(table: [u8; 16]) -> Result<Sbox, Error> {
        let mut inverse = [16; 16];

        for (x, &y) in table.iter().enumerate() {
            if y > 0xf || inverse[y as usize] != 16 {
                return Err(Error::InvalidSbox);
            }

            inverse[y as usize] = x as u8;
        }

        Ok(Sbox { table, inverse })
    }

    /// Applies the S-box to a nibble.
    pub fn apply(&self, x: u8) -> u8 {
        self.table[(x & 0xf) as usize]
    }

    /// Applies the inverse S-box to a nibble.
    pub fn apply_inv(&self, x: u8) -> u8 {
        self.inverse[(x & 0xf) as usize]
    }

    /// Substitutes each of the four nibbles of a block independently, preserving
    /// nibble positions.
    pub fn substitute(&self, block: u16) -> u16 {
        substitute_with(&self.table, block)
    }

    /// Substitutes each nibble of a block through the inverse table.
    pub fn substitute_inv(&self, block: u16) -> u16 {
        substitute_with(&self.inverse, block)
    }
}

fn substitute_with(table: &[u8; 16], block: u16) -> u16 {
    u16::from(table[(block >> 12) as usize]) << 12
        | u16::from(table[(block >> 8 & 0xf) as usize]) << 8
        | u16::from(table[(block >> 4 & 0xf) as usize]) << 4
        | u16::from(table[(block & 0xf) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::SBOX;

    #[test]
    fn inverse_undoes_forward() {
        let sbox = Sbox::new(SBOX).unwrap();

        for x in 0..16 {
            assert_eq!(sbox.apply_inv(sbox.apply(x)), x);
            assert_eq!(sbox.apply(sbox.apply_inv(x)), x);
        }
    }

    #[test]
    fn substitute_preserves_nibble_positions() {
        let sbox = Sbox::new(SBOX).unwrap();

        // SBOX[0] = 0xc, SBOX[1] = 0x5, SBOX[2] = 0x6, SBOX[3] = 0xb
        assert_eq!(sbox.substitute(0x0000), 0xcccc);
        assert_eq!(sbox.substitute(0x0123), 0xc56b);
        assert_eq!(sbox.substitute_inv(0xc56b), 0x0123);
    }

    #[test]
    fn rejects_non_bijective_tables() {
        let mut table = SBOX;
        table[3] = table[7];
        assert!(Sbox::new(table).is_err());

        let mut table = SBOX;
        table[0] = 16;
        assert!(Sbox::new(table).is_err());
    }
}
