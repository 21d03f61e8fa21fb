//! The `all` workflow: one shared annotation, many samples.

use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::artifacts::{MANIFEST_NAME, PARAMETERS_NAME, SampleArtifacts, ensure_dir};
use crate::config::{HalfLifeBounds, seeded_rng};
use crate::error::{CustomError, Result};
use crate::executor::execute;
use crate::model::SampleDescriptor;
use crate::output::write_manifest;
use crate::pipeline::{
    AnnotationParams, ReadParams, describe_sample, prepare_shared_annotation, run_sample,
};
use crate::progress::Reporter;
use crate::reader::model::load_utr_models;

pub const LABEL_TYPE: &str = "pulse";

/// Every parameter of a sweep; serialised to `simulation.json` so a run can be repeated.
#[derive(Debug, Clone, Serialize)]
pub struct SweepConfig {
    pub reference: PathBuf,
    pub annotation: PathBuf,
    pub output_dir: PathBuf,
    pub time_points: Vec<u32>,
    pub replicates: u32,
    pub read_length: u32,
    pub coverage: u32,
    pub seq_error: f64,
    pub snp_rate: f64,
    pub conversion_rate: f64,
    pub half_lives: HalfLifeBounds,
    pub workers: usize,
    pub seed: u64,
}

impl SweepConfig {
    fn annotation_params(&self) -> AnnotationParams {
        AnnotationParams {
            read_length: self.read_length,
            snp_rate: self.snp_rate,
            half_lives: self.half_lives,
        }
    }

    fn read_params(&self) -> ReadParams {
        ReadParams {
            read_length: self.read_length,
            read_number: 0,
            coverage: self.coverage,
            seq_error: self.seq_error,
            conversion_rate: self.conversion_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    pub bam: PathBuf,
    pub sample_name: String,
    pub label: &'static str,
    pub time_point: u32,
}

pub fn sample_name(number: usize, time_point: u32, replicate: u32) -> String {
    format!("sample_{number}_{time_point}min_rep{replicate}")
}

/// One descriptor per (time point, replicate), time points outermost.
///
/// Sample `n` (1-based) draws its read count and simulation seed from a
/// generator seeded with `seed + n`, so a plan never depends on worker count.
pub fn plan_samples(config: &SweepConfig, total_utr_length: u64) -> Vec<SampleDescriptor> {
    let read_params = config.read_params();
    config
        .time_points
        .iter()
        .cartesian_product(1..=config.replicates)
        .enumerate()
        .map(|(idx, (&time_point, replicate))| {
            let number = idx + 1;
            let mut rng = seeded_rng(config.seed.wrapping_add(number as u64));
            describe_sample(
                sample_name(number, time_point, replicate),
                time_point,
                replicate,
                0,
                total_utr_length,
                &read_params,
                &mut rng,
            )
        })
        .collect()
}

pub fn manifest_rows(output_dir: &Path, plan: &[SampleDescriptor]) -> Vec<ManifestRow> {
    plan.iter()
        .map(|descriptor| ManifestRow {
            bam: SampleArtifacts::derive(output_dir, &descriptor.name).bam,
            sample_name: descriptor.name.clone(),
            label: LABEL_TYPE,
            time_point: descriptor.time_point,
        })
        .collect()
}

fn write_parameters(path: &Path, config: &SweepConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).map_err(|e| CustomError::Write {
        source: e.into(),
        path: path.to_path_buf(),
    })?;
    std::fs::write(path, json + "\n").map_err(|e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    })
}

/// Run the whole sweep. `samples.tsv` is only written once every sample has
/// finished, so each row it lists refers to a complete BAM.
pub fn run_sweep(config: &SweepConfig, reporter: &Reporter) -> Result<Vec<ManifestRow>> {
    let out = config.output_dir.as_path();
    ensure_dir(out)?;
    write_parameters(&out.join(PARAMETERS_NAME), config)?;
    info!(
        "Sweeping time points [{}] x {} replicates into {}",
        config.time_points.iter().join(", "),
        config.replicates,
        out.display()
    );

    let mut rng = seeded_rng(config.seed);
    let prepared = prepare_shared_annotation(
        &config.annotation,
        &config.reference,
        out,
        &config.annotation_params(),
        &mut rng,
    )?;
    debug!(
        "Shared annotation {} filtered into {}",
        prepared.artifacts.annotation.display(),
        prepared.artifacts.filtered_bed.display()
    );
    let models = load_utr_models(&prepared.artifacts.model)?;

    let plan = plan_samples(config, prepared.total_utr_length);
    let rows = manifest_rows(out, &plan);

    let pb = reporter.bar(plan.len() as u64, "samples");
    // Per-read bars would interleave across workers.
    let quiet = Reporter::hidden();
    let outcomes = execute(&plan, config.workers, |descriptor| {
        let outcome = run_sample(&models, descriptor, config.read_length, out, &quiet);
        pb.inc(1);
        outcome
    });
    pb.finish_and_clear();
    let outcomes = outcomes?;

    write_manifest(&out.join(MANIFEST_NAME), &rows)?;
    let total_reads: u64 = outcomes.iter().map(|o| o.reads).sum();
    info!(
        "Simulated {} samples ({total_reads} reads), manifest in {}",
        outcomes.len(),
        out.join(MANIFEST_NAME).display()
    );
    Ok(rows)
}
