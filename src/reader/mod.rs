pub mod bed;
pub mod model;
pub mod reference;

use crate::error::Result;

/// Random access to reference sequences by 0-based, half-open interval.
pub trait SequenceSource {
    fn sequence_len(&self, chrom: &str) -> Option<u64>;
    fn fetch(&mut self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>>;
}
