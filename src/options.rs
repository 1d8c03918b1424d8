//! Command line options of the demo binary.

use structopt::StructOpt;

fn parse_mask(s: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(s.trim_start_matches("0x"), 16)
}

#[derive(Clone, StructOpt)]
#[structopt(name = "spncrack",
            about = "A toy SPN cipher and a linear key-recovery attack against it.")]
pub enum SpncrackOptions {
    /// Print the linear approximation table of the built-in S-box.
    #[structopt(name = "lat")]
    Lat,

    /// Run the known-plaintext attack against a freshly generated key.
    #[structopt(name = "attack")]
    Attack {
        /// Number of cipher rounds.
        #[structopt(short = "r", long = "rounds", default_value = "4")]
        rounds: usize,

        /// Number of random plaintext/ciphertext pairs to collect.
        #[structopt(short = "n", long = "pairs", default_value = "10000")]
        pairs: usize,

        /// Input mask applied to the plaintext, in hexadecimal.
        #[structopt(short = "a", long = "alpha", default_value = "1010",
                    parse(try_from_str = parse_mask))]
        alpha: u16,

        /// Output mask applied to the state entering the final substitution layer,
        /// in hexadecimal.
        #[structopt(short = "g", long = "gamma", default_value = "2020",
                    parse(try_from_str = parse_mask))]
        gamma: u16,

        /// Number of top-ranked partial candidates fed into full-key recovery.
        #[structopt(short = "t", long = "top", default_value = "10")]
        top: usize,

        /// Number of corpus pairs used to verify a full-key guess.
        #[structopt(short = "c", long = "check", default_value = "30")]
        check_pairs: usize,
    },

    /// Encrypt and decrypt a short message to demonstrate the cipher round trip.
    #[structopt(name = "demo")]
    Demo {
        /// Number of cipher rounds.
        #[structopt(short = "r", long = "rounds", default_value = "4")]
        rounds: usize,

        /// Message to run through the cipher.
        #[structopt(short = "m", long = "message", default_value = "attack at dawn")]
        message: String,
    },
}
