use bio::alphabets::dna::revcomp;
use log::{info, warn};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::artifacts::{ModelArtifacts, ensure_dir};
use crate::error::Result;
use crate::model::{Strand, TurnoverRecord, UtrModel, Variant};
use crate::output::{write_bed12, write_expression_table, write_utr_fasta, write_vcf};
use crate::reader::SequenceSource;
use crate::reader::bed::read_turnover_bed;
use crate::simulate::substitute_base;

/// Substitute bases of a genomic (plus-strand) sequence at `rate`, returning the variants.
fn inject_snps(seq: &mut [u8], start: u64, rate: f64, rng: &mut impl Rng) -> Vec<Variant> {
    if rate <= 0.0 {
        return Vec::new();
    }
    let mut variants = Vec::new();
    for (offset, base) in seq.iter_mut().enumerate() {
        if !rng.gen_bool(rate) {
            continue;
        }
        let alternate = substitute_base(*base, rng);
        if alternate == *base {
            continue;
        }
        variants.push(Variant {
            pos: start + offset as u64,
            reference: *base,
            alternate,
        });
        *base = alternate;
    }
    variants
}

/// Log-normal relative abundance, median 1.
fn draw_expression(rng: &mut impl Rng) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z.exp()
}

pub fn build_models(
    records: Vec<TurnoverRecord>,
    reference: &mut impl SequenceSource,
    read_length: u32,
    snp_rate: f64,
    rng: &mut impl Rng,
) -> Result<Vec<UtrModel>> {
    let mut models = Vec::with_capacity(records.len());
    for turnover in records {
        let bed = &turnover.bed;
        let mut genomic = reference.fetch(&bed.chrom, bed.start, bed.end)?;
        let variants = inject_snps(&mut genomic, bed.start, snp_rate, rng);
        let sequence = match bed.strand {
            Strand::Plus => genomic,
            Strand::Minus => revcomp(&genomic),
        };
        let mut expression = draw_expression(rng);
        if sequence.len() < read_length as usize {
            warn!(
                "UTR {} ({} bp) is shorter than the read length, it will receive no reads",
                bed.name,
                sequence.len()
            );
            expression = 0.0;
        }
        models.push(UtrModel {
            turnover,
            sequence,
            expression,
            variants,
        });
    }
    Ok(models)
}

/// Build the UTR models for a half-life BED and write the four co-indexed model files.
/// Returns the summed UTR length.
pub fn model_utrs(
    artifacts: &ModelArtifacts,
    reference: &mut impl SequenceSource,
    read_length: u32,
    snp_rate: f64,
    rng: &mut impl Rng,
) -> Result<u64> {
    let records = read_turnover_bed(&artifacts.turnover_bed)?;
    let models = build_models(records, reference, read_length, snp_rate, rng)?;

    if let Some(dir) = artifacts.bed12.parent() {
        ensure_dir(dir)?;
    }
    write_bed12(&artifacts.bed12, &models)?;
    write_utr_fasta(&artifacts.fasta, &models)?;
    write_expression_table(&artifacts.expression, &models)?;
    write_vcf(&artifacts.variants, &models)?;

    let total_length: u64 = models.iter().map(|m| m.turnover.bed.len()).sum();
    let n_variants: usize = models.iter().map(|m| m.variants.len()).sum();
    info!(
        "Modelled {} UTRs ({total_length} bp, {n_variants} SNPs) into {}",
        models.len(),
        artifacts.bed12.display()
    );
    Ok(total_length)
}
