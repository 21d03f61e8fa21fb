//! Observed T>C conversion rate of aligned reads over a reference region.

use noodles::bam;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::RecordBuf;
use std::fmt;
use std::fs::File;
use std::path::Path;

use crate::error::{CustomError, Result};
use crate::model::Strand;
use crate::reader::SequenceSource;

/// `chr:start-end`, 1-based and inclusive as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    /// Parse `chr1:1,000-2,000`. Thousands separators are ignored.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || CustomError::Region {
            region: spec.to_string(),
        };
        let cleaned = spec.replace(',', "");
        let (chrom, range) = cleaned.rsplit_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        let start: u64 = start.trim().parse().map_err(|_| invalid())?;
        let end: u64 = end.trim().parse().map_err(|_| invalid())?;
        if chrom.is_empty() || start == 0 || start > end {
            return Err(invalid());
        }
        Ok(Self {
            chrom: chrom.to_string(),
            start,
            end,
        })
    }

    fn contains(&self, pos: u64) -> bool {
        (self.start..=self.end).contains(&pos)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionCounts {
    pub t_count: u64,
    pub conversions: u64,
}

impl ConversionCounts {
    pub fn rate(&self) -> f64 {
        if self.t_count == 0 {
            0.0
        } else {
            self.conversions as f64 / self.t_count as f64
        }
    }
}

/// Reference and read base of a conversion on `strand`, in reference orientation.
fn conversion_bases(strand: Strand) -> (u8, u8) {
    match strand {
        Strand::Plus => (b'T', b'C'),
        Strand::Minus => (b'A', b'G'),
    }
}

/// Tally one record's aligned bases against the region.
/// `region_seq` holds the reference bases of `region`.
fn tally_record(
    record: &RecordBuf,
    region: &Region,
    region_seq: &[u8],
    strand: Strand,
    counts: &mut ConversionCounts,
) {
    let Some(start) = record.alignment_start() else {
        return;
    };
    let (ref_base, read_base) = conversion_bases(strand);
    let read = record.sequence().as_ref();
    let mut ref_pos = usize::from(start) as u64;
    let mut read_pos = 0usize;

    for op in record.cigar().as_ref() {
        let len = op.len();
        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                for i in 0..len {
                    let pos = ref_pos + i as u64;
                    if !region.contains(pos) {
                        continue;
                    }
                    let reference = region_seq[(pos - region.start) as usize];
                    if reference != ref_base {
                        continue;
                    }
                    counts.t_count += 1;
                    if read
                        .get(read_pos + i)
                        .is_some_and(|b| b.to_ascii_uppercase() == read_base)
                    {
                        counts.conversions += 1;
                    }
                }
                ref_pos += len as u64;
                read_pos += len;
            }
            Kind::Insertion | Kind::SoftClip => read_pos += len,
            Kind::Deletion | Kind::Skip => ref_pos += len as u64,
            Kind::HardClip | Kind::Pad => {}
        }
    }
}

/// Count T positions of `region` covered by reads of one BAM, and how many read as C.
/// Only reads in the orientation of `strand` are used; `-` counts A>G on reverse reads.
pub fn conversion_rate_from_bam(
    bam_path: &Path,
    reference: &mut impl SequenceSource,
    region: &Region,
    strand: Strand,
) -> Result<ConversionCounts> {
    let len = reference
        .sequence_len(&region.chrom)
        .ok_or_else(|| CustomError::UnknownSequence {
            chrom: region.chrom.clone(),
        })?;
    let end = region.end.min(len);
    let region_seq = reference.fetch(&region.chrom, region.start - 1, end)?;
    let region = Region {
        end,
        ..region.clone()
    };

    let bam_err = |source| CustomError::Bam {
        source,
        path: bam_path.to_path_buf(),
    };
    let mut reader = File::open(bam_path)
        .map(bam::io::Reader::new)
        .map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: bam_path.to_path_buf(),
        })?;
    let header = reader.read_header().map_err(bam_err)?;
    let mut counts = ConversionCounts::default();
    let Some(ref_id) = header
        .reference_sequences()
        .get_index_of(region.chrom.as_bytes())
    else {
        return Ok(counts);
    };

    for result in reader.record_bufs(&header) {
        let record = result.map_err(bam_err)?;
        let flags = record.flags();
        if flags.is_unmapped() || record.reference_sequence_id() != Some(ref_id) {
            continue;
        }
        let reverse = flags.is_reverse_complemented();
        if reverse != (strand == Strand::Minus) {
            continue;
        }
        tally_record(&record, &region, &region_seq, strand, &mut counts);
    }
    Ok(counts)
}
