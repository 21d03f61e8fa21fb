//! Stage composition: each function runs one stage on paths derived from
//! [`crate::artifacts`], so the single-stage commands and the sweep agree on
//! every file name.

use log::info;
use rand::{Rng, RngCore};
use std::path::{Path, PathBuf};

use crate::artifacts::{
    AnnotationArtifacts, ModelArtifacts, SampleArtifacts, filtered_bed_path, turnover_bed_path,
};
use crate::config::HalfLifeBounds;
use crate::error::Result;
use crate::model::{SampleDescriptor, UtrModel};
use crate::progress::Reporter;
use crate::read_count::target_read_count;
use crate::reader::bed::total_utr_length;
use crate::reader::model::load_utr_models;
use crate::reader::reference::IndexedReference;
use crate::simulate::annotation::prepare_annotation;
use crate::simulate::sample::{SampleOutcome, simulate_sample};
use crate::simulate::turnover::simulate_turnover;
use crate::simulate::utrs::model_utrs;

#[derive(Debug, Clone, Copy)]
pub struct AnnotationParams {
    pub read_length: u32,
    pub snp_rate: f64,
    pub half_lives: HalfLifeBounds,
}

/// Per-sample read simulation settings shared by every sample of a run.
#[derive(Debug, Clone, Copy)]
pub struct ReadParams {
    pub read_length: u32,
    /// Explicit read count; 0 derives it from `coverage`.
    pub read_number: u64,
    pub coverage: u32,
    pub seq_error: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone)]
pub struct PreparedAnnotation {
    pub artifacts: AnnotationArtifacts,
    pub total_utr_length: u64,
}

pub fn prepare_bed(annotation: &Path, output_dir: &Path, read_length: u32) -> Result<PathBuf> {
    let filtered = filtered_bed_path(annotation, output_dir);
    prepare_annotation(annotation, &filtered, read_length)?;
    Ok(filtered)
}

pub fn turnover(
    bed: &Path,
    output_dir: &Path,
    bounds: HalfLifeBounds,
    rng: &mut impl Rng,
) -> Result<PathBuf> {
    info!("Simulating turnover");
    let turnover_bed = turnover_bed_path(bed, output_dir);
    simulate_turnover(bed, &turnover_bed, bounds, rng)?;
    Ok(turnover_bed)
}

/// Model the UTRs of a half-life BED, writing the model files into `output_dir`.
/// Returns the artifacts and the summed UTR length.
pub fn utrs(
    turnover_bed: &Path,
    reference: &Path,
    output_dir: &Path,
    read_length: u32,
    snp_rate: f64,
    rng: &mut impl Rng,
) -> Result<(ModelArtifacts, u64)> {
    info!("Simulating UTRs");
    let mut reference = IndexedReference::open(&reference)?;
    let artifacts = ModelArtifacts::alongside(turnover_bed, output_dir);
    let total = model_utrs(&artifacts, &mut reference, read_length, snp_rate, rng)?;
    Ok((artifacts, total))
}

/// Run the three annotation stages once, in dependency order.
pub fn prepare_shared_annotation(
    annotation: &Path,
    reference: &Path,
    output_dir: &Path,
    params: &AnnotationParams,
    rng: &mut impl Rng,
) -> Result<PreparedAnnotation> {
    let artifacts = AnnotationArtifacts::derive(annotation, output_dir);
    let filtered = prepare_bed(annotation, output_dir, params.read_length)?;
    let turnover_bed = turnover(&filtered, output_dir, params.half_lives, rng)?;
    let (model, total_utr_length) = utrs(
        &turnover_bed,
        reference,
        output_dir,
        params.read_length,
        params.snp_rate,
        rng,
    )?;
    debug_assert_eq!(model, artifacts.model);
    Ok(PreparedAnnotation {
        artifacts,
        total_utr_length,
    })
}

/// Fix the read count and the simulation seed of one sample.
pub fn describe_sample(
    name: String,
    time_point: u32,
    replicate: u32,
    chase: u32,
    total_utr_length: u64,
    params: &ReadParams,
    rng: &mut impl Rng,
) -> SampleDescriptor {
    let read_count = target_read_count(
        total_utr_length,
        params.read_length,
        params.coverage,
        params.read_number,
        rng,
    );
    SampleDescriptor {
        name,
        time_point,
        replicate,
        pulse: time_point,
        chase,
        read_count,
        seq_error: params.seq_error,
        conversion_rate: params.conversion_rate,
        seed: rng.next_u64(),
    }
}

pub fn run_sample(
    models: &[UtrModel],
    descriptor: &SampleDescriptor,
    read_length: u32,
    output_dir: &Path,
    reporter: &Reporter,
) -> Result<SampleOutcome> {
    let artifacts = SampleArtifacts::derive(output_dir, &descriptor.name);
    simulate_sample(models, descriptor, read_length, &artifacts, reporter)
}

/// The `reads` command: one sample from the model files sitting next to `turnover_bed`.
#[allow(clippy::too_many_arguments)]
pub fn reads(
    turnover_bed: &Path,
    output_dir: &Path,
    sample_name: &str,
    params: &ReadParams,
    pulse: u32,
    chase: u32,
    rng: &mut impl Rng,
    reporter: &Reporter,
) -> Result<SampleOutcome> {
    info!("Simulating read sample: {sample_name}");
    let model = ModelArtifacts::beside(turnover_bed);
    let total = total_utr_length(&model.bed12)?;
    let models = load_utr_models(&model)?;
    let descriptor = describe_sample(
        sample_name.to_string(),
        pulse,
        1,
        chase,
        total,
        params,
        rng,
    );
    run_sample(&models, &descriptor, params.read_length, output_dir, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::seeded_rng;
    use std::fs;

    const REFERENCE: &str = ">chr1\nACGTTTGACCATGGTTACGATTGCATTAGCCATGATTACAGGTTTACGAT\n";

    fn params() -> AnnotationParams {
        AnnotationParams {
            read_length: 10,
            snp_rate: 0.0,
            half_lives: HalfLifeBounds::new(30, 720).unwrap(),
        }
    }

    #[test]
    fn shared_annotation_writes_the_naming_chain() {
        let dir = tempfile::tempdir().unwrap();
        let annotation = dir.path().join("foo.bed");
        let reference = dir.path().join("ref.fa");
        fs::write(&reference, REFERENCE).unwrap();
        fs::write(
            &annotation,
            "chr1\t0\t30\tlong\t0\t+\nchr1\t30\t38\tshort\t0\t-\nchr1\t20\t50\tother\t0\t-\n",
        )
        .unwrap();
        let out = dir.path().join("out");

        let prepared =
            prepare_shared_annotation(&annotation, &reference, &out, &params(), &mut seeded_rng(4))
                .unwrap();
        assert_eq!(prepared.total_utr_length, 60);
        for path in [
            out.join("foo_original.bed"),
            out.join("foo_original_utrs.bed"),
            out.join("foo_original_utrs.bed12"),
            out.join("foo_original_utrs.fa"),
            out.join("foo_original_utrs.eplv"),
            out.join("foo_original_utrs.vcf"),
        ] {
            assert!(path.exists(), "missing {}", path.display());
        }
        assert_eq!(prepared.artifacts.model.bed12, out.join("foo_original_utrs.bed12"));
    }

    #[test]
    fn described_samples_use_explicit_count_and_pulse() {
        let read_params = ReadParams {
            read_length: 50,
            read_number: 500,
            coverage: 20,
            seq_error: 0.01,
            conversion_rate: 0.03,
        };
        let descriptor = describe_sample(
            "s".to_string(),
            60,
            2,
            0,
            100_000,
            &read_params,
            &mut seeded_rng(1),
        );
        assert_eq!(descriptor.read_count, 500);
        assert_eq!(descriptor.pulse, 60);
        assert_eq!(descriptor.replicate, 2);

        let again = describe_sample(
            "s".to_string(),
            60,
            2,
            0,
            100_000,
            &read_params,
            &mut seeded_rng(1),
        );
        assert_eq!(descriptor, again);
    }

    #[test]
    fn reads_finds_models_next_to_turnover_bed() {
        let dir = tempfile::tempdir().unwrap();
        let annotation = dir.path().join("foo.bed");
        let reference = dir.path().join("ref.fa");
        fs::write(&reference, REFERENCE).unwrap();
        fs::write(&annotation, "chr1\t0\t40\tu1\t0\t+\n").unwrap();
        let prepared = prepare_shared_annotation(
            &annotation,
            &reference,
            dir.path(),
            &params(),
            &mut seeded_rng(4),
        )
        .unwrap();

        let read_params = ReadParams {
            read_length: 10,
            read_number: 0,
            coverage: 5,
            seq_error: 0.0,
            conversion_rate: 0.03,
        };
        let samples = dir.path().join("samples");
        let outcome = reads(
            &prepared.artifacts.model.turnover_bed,
            &samples,
            "single",
            &read_params,
            60,
            0,
            &mut seeded_rng(8),
            &Reporter::hidden(),
        )
        .unwrap();
        // 40 bp / 10 bp * 5x = 20 reads, jittered by at most 20%.
        assert!((16..=24).contains(&outcome.reads));
        assert!(samples.join("single_reads.bam").exists());
        assert!(samples.join("single_utrsummary.csv").exists());
    }
}
