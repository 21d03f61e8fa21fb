use bio::io::fasta;
use log::{debug, info, warn};
use noodles::bam;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::alignment::{unmapped_header, unmapped_record};
use crate::artifacts::{SampleArtifacts, ensure_dir};
use crate::config::seeded_rng;
use crate::error::{CustomError, Result};
use crate::model::{SampleDescriptor, Strand, UtrModel};
use crate::output::write_utr_summary;
use crate::progress::Reporter;
use crate::simulate::substitute_base;

/// Per-UTR ground truth and observed conversion counts of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct UtrSummary {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
    pub length: u64,
    pub strand: Strand,
    pub half_life: u32,
    pub labeled_fraction: f64,
    pub reads: u64,
    pub labeled_reads: u64,
    pub tc_reads: u64,
    pub t_count: u64,
    pub conversions: u64,
}

impl UtrSummary {
    fn new(model: &UtrModel, pulse: u32, chase: u32) -> Self {
        let bed = &model.turnover.bed;
        Self {
            chrom: bed.chrom.clone(),
            start: bed.start,
            end: bed.end,
            name: bed.name.clone(),
            length: bed.len(),
            strand: bed.strand,
            half_life: model.turnover.half_life,
            labeled_fraction: model.turnover.labeled_fraction(pulse, chase),
            reads: 0,
            labeled_reads: 0,
            tc_reads: 0,
            t_count: 0,
            conversions: 0,
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.t_count == 0 {
            0.0
        } else {
            self.conversions as f64 / self.t_count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub name: String,
    pub bam: PathBuf,
    pub summary: PathBuf,
    pub reads: u64,
    pub labeled_reads: u64,
    pub conversions: u64,
}

fn write_err(path: &Path) -> impl Fn(std::io::Error) -> CustomError + '_ {
    move |e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    }
}

/// Draw `descriptor.read_count` reads from the UTRs in proportion to their expression
/// and write them to the temporary BED and FASTA files. Returns the number written.
fn simulate_reads(
    models: &[UtrModel],
    descriptor: &SampleDescriptor,
    read_length: u32,
    artifacts: &SampleArtifacts,
    reporter: &Reporter,
    rng: &mut impl Rng,
) -> Result<u64> {
    let read_length = read_length as usize;
    let weights: Vec<f64> = models
        .iter()
        .map(|m| {
            if m.sequence.len() >= read_length {
                m.expression
            } else {
                0.0
            }
        })
        .collect();
    let picker = match descriptor.read_count {
        0 => None,
        _ => match WeightedIndex::new(&weights) {
            Ok(picker) => Some(picker),
            Err(e) => {
                warn!(
                    "Sample {}: no UTR can produce reads ({e}), writing an empty sample",
                    descriptor.name
                );
                None
            }
        },
    };

    let bed_file = File::create(&artifacts.reads_bed).map_err(write_err(&artifacts.reads_bed))?;
    let mut bed = BufWriter::new(bed_file);
    let fasta_file =
        File::create(&artifacts.reads_fasta).map_err(write_err(&artifacts.reads_fasta))?;
    let mut fasta = fasta::Writer::new(fasta_file);

    let Some(picker) = picker else {
        bed.flush().map_err(write_err(&artifacts.reads_bed))?;
        fasta.flush().map_err(write_err(&artifacts.reads_fasta))?;
        return Ok(0);
    };

    let pb = reporter.bar(descriptor.read_count, "reads");
    for read_idx in 0..descriptor.read_count {
        let model = &models[picker.sample(rng)];
        let utr = &model.turnover.bed;
        let offset = rng.gen_range(0..=model.sequence.len() - read_length);
        let mut read = model.sequence[offset..offset + read_length].to_vec();
        if descriptor.seq_error > 0.0 {
            for base in read.iter_mut() {
                if rng.gen_bool(descriptor.seq_error) {
                    *base = substitute_base(*base, rng);
                }
            }
        }

        let (start, end) = match utr.strand {
            Strand::Plus => {
                let start = utr.start + offset as u64;
                (start, start + read_length as u64)
            }
            Strand::Minus => {
                let end = utr.end.saturating_sub(offset as u64);
                (end.saturating_sub(read_length as u64), end)
            }
        };
        let read_name = format!("{}_{}", descriptor.name, read_idx + 1);
        writeln!(
            bed,
            "{}\t{start}\t{end}\t{read_name}\t0\t{}",
            utr.chrom, utr.strand
        )
        .map_err(write_err(&artifacts.reads_bed))?;
        fasta
            .write(&read_name, Some(utr.name.as_str()), &read)
            .map_err(write_err(&artifacts.reads_fasta))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    bed.flush().map_err(write_err(&artifacts.reads_bed))?;
    fasta.flush().map_err(write_err(&artifacts.reads_fasta))?;
    Ok(descriptor.read_count)
}

/// Read the simulated reads back, label each one as newly synthesised according to its
/// UTR's half-life, inject T>C conversions into labeled reads and encode them as BAM.
fn add_conversions(
    models: &[UtrModel],
    descriptor: &SampleDescriptor,
    artifacts: &SampleArtifacts,
    rng: &mut impl Rng,
) -> Result<Vec<UtrSummary>> {
    let mut summaries: Vec<UtrSummary> = models
        .iter()
        .map(|m| UtrSummary::new(m, descriptor.pulse, descriptor.chase))
        .collect();
    let by_name: HashMap<&str, usize> = models
        .iter()
        .enumerate()
        .map(|(idx, m)| (m.name(), idx))
        .collect();

    let bam_err = |source| CustomError::Bam {
        source,
        path: artifacts.bam.clone(),
    };
    let header = unmapped_header();
    let bam_file = File::create(&artifacts.bam).map_err(write_err(&artifacts.bam))?;
    let mut writer = bam::io::Writer::new(bam_file);
    writer.write_header(&header).map_err(bam_err)?;

    let reads_file = File::open(&artifacts.reads_fasta).map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: artifacts.reads_fasta.clone(),
    })?;
    for result in fasta::Reader::new(reads_file).records() {
        let record = result.map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: artifacts.reads_fasta.clone(),
        })?;
        let utr_idx = record
            .desc()
            .and_then(|utr| by_name.get(utr).copied())
            .ok_or_else(|| CustomError::ReadOrigin {
                path: artifacts.reads_fasta.clone(),
                read: record.id().to_string(),
            })?;
        let summary = &mut summaries[utr_idx];

        let mut read = record.seq().to_vec();
        let t_count = read.iter().filter(|&&b| b == b'T').count() as u64;
        let labeled = rng.gen_bool(summary.labeled_fraction.clamp(0.0, 1.0));
        let mut conversions = 0u32;
        if labeled {
            for base in read.iter_mut().filter(|b| **b == b'T') {
                if rng.gen_bool(descriptor.conversion_rate) {
                    *base = b'C';
                    conversions += 1;
                }
            }
        }

        summary.reads += 1;
        summary.t_count += t_count;
        summary.conversions += conversions as u64;
        if labeled {
            summary.labeled_reads += 1;
        }
        if conversions > 0 {
            summary.tc_reads += 1;
        }

        let alignment = unmapped_record(record.id(), &read, conversions);
        writer
            .write_alignment_record(&header, &alignment)
            .map_err(bam_err)?;
    }
    writer.finish(&header).map_err(bam_err)?;
    Ok(summaries)
}

fn remove_temporaries(artifacts: &SampleArtifacts) -> Result<()> {
    for path in artifacts.temporaries() {
        std::fs::remove_file(path).map_err(|e| CustomError::Remove {
            source: e,
            path: path.to_path_buf(),
        })?;
    }
    Ok(())
}

/// Simulate one sample against already loaded UTR models.
///
/// Writes `<sample>_reads.bam` and `<sample>_utrsummary.csv`. The temporary read
/// BED/FASTA are removed as soon as the BAM is complete; if an earlier step fails
/// they are left in place.
pub fn simulate_sample(
    models: &[UtrModel],
    descriptor: &SampleDescriptor,
    read_length: u32,
    artifacts: &SampleArtifacts,
    reporter: &Reporter,
) -> Result<SampleOutcome> {
    let mut rng = seeded_rng(descriptor.seed);
    if let Some(dir) = artifacts.bam.parent() {
        ensure_dir(dir)?;
    }

    info!(
        "Simulating {} reads with sequencing error of {} for sample {}",
        descriptor.read_count, descriptor.seq_error, descriptor.name
    );
    debug!(
        "Sample {}: time point {} min, replicate {}, pulse {} min, chase {} min",
        descriptor.name, descriptor.time_point, descriptor.replicate, descriptor.pulse, descriptor.chase
    );
    let reads = simulate_reads(models, descriptor, read_length, artifacts, reporter, &mut rng)?;
    let summaries = add_conversions(models, descriptor, artifacts, &mut rng)?;
    remove_temporaries(artifacts)?;
    write_utr_summary(&artifacts.summary, &summaries)?;

    let outcome = SampleOutcome {
        name: descriptor.name.clone(),
        bam: artifacts.bam.clone(),
        summary: artifacts.summary.clone(),
        reads,
        labeled_reads: summaries.iter().map(|s| s.labeled_reads).sum(),
        conversions: summaries.iter().map(|s| s.conversions).sum(),
    };
    debug!(
        "Sample {}: {} reads, {} labeled, {} conversions",
        outcome.name, outcome.reads, outcome.labeled_reads, outcome.conversions
    );
    Ok(outcome)
}
