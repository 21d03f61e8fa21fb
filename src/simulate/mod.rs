//! The four pipeline stages. Each reads named input files and writes named
//! output files; randomised stages draw from a caller-supplied generator.

pub mod annotation;
pub mod sample;
pub mod turnover;
pub mod utrs;

use rand::Rng;

const BASES: &[u8; 4] = b"ACGT";

/// Replace an unambiguous base with one of the three others. Other symbols are kept.
pub(crate) fn substitute_base(base: u8, rng: &mut impl Rng) -> u8 {
    match BASES.iter().position(|&b| b == base.to_ascii_uppercase()) {
        Some(idx) => BASES[(idx + rng.gen_range(1..BASES.len())) % BASES.len()],
        None => base,
    }
}
