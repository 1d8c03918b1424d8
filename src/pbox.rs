//! Type representing a bit-position permutation (P-box).

use crate::error::Error;

/// A permutation of the 16 bit positions of a block, together with its inverse.
/// Entry `i` of the table gives the position that bit `i` of the input moves to.
#[derive(Clone, Debug)]
pub struct Pbox {
    table: [u8; 16],
    inverse: [u8; 16],
}

impl Pbox {
    /// Creates a new P-box from its position table and derives the inverse table.
    /// The table must be a permutation of the positions 0..16.
    pub fn new(table: [u8; 16]) -> Result<Pbox, Error> {
        let mut inverse = [16; 16];

        for (i, &j) in table.iter().enumerate() {
            if j > 0xf || inverse[j as usize] != 16 {
                return Err(Error::InvalidPbox);
            }

            inverse[j as usize] = i as u8;
        }

        Ok(Pbox { table, inverse })
    }

    /// Moves every bit of the block to its new position.
    pub fn permute(&self, block: u16) -> u16 {
        permute_with(&self.table, block)
    }

    /// Moves every bit of the block back to its original position.
    pub fn permute_inv(&self, block: u16) -> u16 {
        permute_with(&self.inverse, block)
    }
}

fn permute_with(table: &[u8; 16], block: u16) -> u16 {
    let mut output = 0;

    for (i, &j) in table.iter().enumerate() {
        output |= (block >> i & 1) << j;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::PBOX;

    #[test]
    fn inverse_undoes_forward() {
        let pbox = Pbox::new(PBOX).unwrap();

        for i in 0..16 {
            let block = 1 << i;
            assert_eq!(pbox.permute_inv(pbox.permute(block)), block);
            assert_eq!(pbox.permute(pbox.permute_inv(block)), block);
        }
    }

    #[test]
    fn moves_bits_to_table_positions() {
        let pbox = Pbox::new(PBOX).unwrap();

        // The built-in P-box transposes the 4x4 bit matrix: bit 1 moves to
        // position 4, and nibble 1 spreads over bits 1, 5, 9, 13.
        assert_eq!(pbox.permute(0x0002), 0x0010);
        assert_eq!(pbox.permute(0x00f0), 0x2222);
        assert_eq!(pbox.permute(0x0000), 0x0000);
        assert_eq!(pbox.permute(0xffff), 0xffff);
    }

    #[test]
    fn rejects_non_bijective_tables() {
        let mut table = PBOX;
        table[2] = table[9];
        assert!(Pbox::new(table).is_err());

        let mut table = PBOX;
        table[15] = 16;
        assert!(Pbox::new(table).is_err());
    }
}
