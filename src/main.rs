use structopt::StructOpt;

use spncrack::attack;
use spncrack::cipher::{self, Spn};
use spncrack::error::Error;
use spncrack::lat::Lat;
use spncrack::sbox::Sbox;

mod options;

use crate::options::SpncrackOptions;

fn main() {
    if let Err(err) = run(SpncrackOptions::from_args()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(options: SpncrackOptions) -> Result<(), Error> {
    match options {
        SpncrackOptions::Lat => print_lat(),
        SpncrackOptions::Attack { rounds, pairs, alpha, gamma, top, check_pairs } => {
            run_attack(rounds, pairs, alpha, gamma, top, check_pairs)
        },
        SpncrackOptions::Demo { rounds, message } => run_demo(rounds, &message),
    }
}

fn print_lat() -> Result<(), Error> {
    let lat = Lat::new(&Sbox::new(cipher::SBOX)?);

    println!("LAT of the built-in S-box (rows: input mask, columns: output mask):");
    print!("{}", lat);

    let (alpha, beta, bias) = lat.strongest();
    println!("Strongest nontrivial approximation: ({:x}, {:x}) with bias {}", alpha, beta, bias);

    Ok(())
}

fn run_attack(rounds: usize,
              pairs: usize,
              alpha: u16,
              gamma: u16,
              top: usize,
              check_pairs: usize)
              -> Result<(), Error> {
    let spn = Spn::new(rounds)?;
    let round_keys = spn.generate_keys()?;

    println!("Target: {} rounds, key 0x{:04x}", rounds, round_keys[0]);
    println!("Masks: alpha 0x{:04x}, gamma 0x{:04x}", alpha, gamma);

    println!("Collecting {} known plaintext/ciphertext pairs.", pairs);
    let plaintexts = cipher::random_blocks(pairs)?;
    let ciphertexts = spn.encrypt(&plaintexts, &round_keys);
    let corpus: Vec<(u16, u16)> = plaintexts.into_iter().zip(ciphertexts).collect();

    println!("Scoring partial-key candidates.");
    let start = time::precise_time_s();
    let (best, counts) = attack::recover_partial_key(&spn, &corpus, alpha, gamma);
    println!("Best guess: 0x{:02x} [{:.3} s]", best, time::precise_time_s() - start);

    // The two nibbles the final substitution layer exposes belong to the last key of
    // the schedule.
    let last_key = round_keys[rounds];
    let truth = ((last_key >> 8) & 0xf0) as u8 | ((last_key >> 4) & 0x0f) as u8;
    println!("True value: 0x{:02x}", truth);

    let candidates = attack::top_candidates(&counts, top);

    println!("Top {} candidates:", candidates.len());
    for candidate in &candidates {
        println!("    0x{:02x} : {}", candidate.guess, candidate.count);
    }

    println!("Recovering full keys, checking {} pairs per guess.", check_pairs.min(corpus.len()));
    let start = time::precise_time_s();
    let partials: Vec<u8> = candidates.iter().map(|candidate| candidate.guess).collect();
    let found = attack::recover_full_key(&spn, &corpus, &partials, check_pairs);
    println!("Found {} key(s) [{:.3} s]", found.len(), time::precise_time_s() - start);

    for key in &found {
        if *key == round_keys[0] {
            println!("    0x{:04x} (the target key)", key);
        } else {
            println!("    0x{:04x}", key);
        }
    }

    if found.is_empty() {
        println!("Attack inconclusive. Enlarge the corpus or the candidate set.");
    }

    Ok(())
}

fn run_demo(rounds: usize, message: &str) -> Result<(), Error> {
    let spn = Spn::new(rounds)?;
    let round_keys = spn.generate_keys()?;

    let blocks = text_to_blocks(message);
    let encrypted = spn.encrypt(&blocks, &round_keys);
    let decrypted = spn.decrypt(&encrypted, &round_keys);

    println!("Key:        0x{:04x}", round_keys[0]);
    print!("Ciphertext:");
    for block in &encrypted {
        print!(" {:04x}", block);
    }
    println!();

    match blocks_to_text(&decrypted) {
        Some(text) => println!("Recovered:  {}", text),
        None => println!("Recovered:  <padding corrupted>"),
    }

    Ok(())
}

/// Pads the message PKCS#7-style to the 2-byte block size and packs big-endian pairs
/// of bytes into blocks.
fn text_to_blocks(text: &str) -> Vec<u16> {
    let mut bytes = text.as_bytes().to_vec();
    let pad = 2 - bytes.len() % 2;
    bytes.resize(bytes.len() + pad, pad as u8);

    bytes.chunks_exact(2).map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]])).collect()
}

/// Unpacks blocks into bytes, strips the padding, and decodes the message. Returns
/// `None` if the padding is inconsistent.
fn blocks_to_text(blocks: &[u16]) -> Option<String> {
    let bytes: Vec<u8> = blocks.iter().flat_map(|block| block.to_be_bytes()).collect();

    let pad = *bytes.last()? as usize;
    if pad == 0 || pad > bytes.len() {
        return None;
    }

    let (text, padding) = bytes.split_at(bytes.len() - pad);
    if padding.iter().any(|&byte| byte as usize != pad) {
        return None;
    }

    Some(String::from_utf8_lossy(text).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_round_trip() {
        for message in ["", "a", "ab", "attack at dawn"] {
            let blocks = text_to_blocks(message);
            assert_eq!(blocks_to_text(&blocks).as_deref(), Some(message));
        }
    }

    #[test]
    fn corrupted_padding_is_rejected() {
        assert_eq!(blocks_to_text(&[0x6100]), None);
        assert_eq!(blocks_to_text(&[0x6161, 0x0005]), None);
        assert_eq!(blocks_to_text(&[]), None);
    }
}
