mod alignment;
mod artifacts;
mod cli;
mod config;
mod conversion_rate;
mod error;
mod executor;
mod model;
mod output;
mod pipeline;
mod progress;
mod read_count;
mod reader;
mod simulate;
mod sweep;

use crate::config::{
    DEFAULT_CONVERSION_RATE, DEFAULT_COVERAGE, DEFAULT_MAX_HALF_LIFE, DEFAULT_MIN_HALF_LIFE,
    DEFAULT_SEQ_ERROR, DEFAULT_SNP_RATE,
};
use crate::error::Result;
use crate::progress::Reporter;
use chrono::Local;
use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use std::path::PathBuf;

/// Simulate SLAM-seq metabolic labeling datasets with ground-truth half-lives.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and hide progress bars.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Seed for every random draw; a random seed is logged when omitted.
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prepare a UTR BED file: drop features not longer than the read length.
    #[command(name = "preparebed")]
    PrepareBed {
        /// BED file.
        #[arg(short, long)]
        bed: PathBuf,

        /// All UTRs not longer than the read length are removed.
        #[arg(short = 'l', long)]
        read_length: u32,

        /// Output directory.
        #[arg(short, long, alias = "outputDir", value_hint = clap::ValueHint::DirPath, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Assign every UTR a half-life.
    Turnover {
        /// Prepared BED file.
        #[arg(short, long)]
        bed: PathBuf,

        /// Lower bound for the simulated half-lives in minutes.
        #[arg(long = "min-halflife", alias = "minhl", default_value_t = DEFAULT_MIN_HALF_LIFE)]
        min_half_life: u32,

        /// Upper bound for the simulated half-lives in minutes.
        #[arg(long = "max-halflife", alias = "maxhl", default_value_t = DEFAULT_MAX_HALF_LIFE)]
        max_half_life: u32,

        /// Output directory.
        #[arg(short, long, alias = "outputDir", value_hint = clap::ValueHint::DirPath, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Model UTR sequences, expression levels and SNPs.
    Utrs {
        /// Reference FASTA file.
        #[arg(short, long)]
        reference: PathBuf,

        /// BED file with half-lives, as written by `turnover`.
        #[arg(short, long)]
        bed: PathBuf,

        /// Read length.
        #[arg(short = 'l', long)]
        read_length: u32,

        /// SNP rate in UTRs.
        #[arg(short, long, default_value_t = DEFAULT_SNP_RATE)]
        snp_rate: f64,

        /// Output directory.
        #[arg(short, long, alias = "outputDir", value_hint = clap::ValueHint::DirPath, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Simulate one SLAM-seq read sample.
    Reads {
        /// BED file with half-lives; the UTR model files are expected next to it.
        #[arg(short, long)]
        bed: PathBuf,

        /// Name of the sample.
        #[arg(long)]
        sample_name: String,

        /// Read length.
        #[arg(short = 'l', long)]
        read_length: u32,

        /// Number of reads to simulate; 0 derives it from the coverage.
        #[arg(short = 'n', long, default_value_t = 0)]
        read_number: u64,

        /// Read coverage, used when no read number is given.
        #[arg(long = "read-coverage", alias = "cov", default_value_t = DEFAULT_COVERAGE)]
        coverage: u32,

        /// Per-base sequencing error rate.
        #[arg(short = 'e', long = "sequencing-error", default_value_t = DEFAULT_SEQ_ERROR)]
        seq_error: f64,

        /// Pulse in minutes.
        #[arg(short, long)]
        pulse: u32,

        /// Chase in minutes.
        #[arg(short, long, default_value_t = 0)]
        chase: u32,

        /// T>C conversion rate.
        #[arg(long = "tc-rate", alias = "tc", default_value_t = DEFAULT_CONVERSION_RATE)]
        conversion_rate: f64,

        /// Output directory.
        #[arg(short, long, alias = "outputDir", value_hint = clap::ValueHint::DirPath, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Simulate a full time course: every time point times every replicate.
    All {
        /// Reference FASTA file.
        #[arg(short, long)]
        reference: PathBuf,

        /// Raw UTR annotation (BED).
        #[arg(short, long)]
        bed: PathBuf,

        /// Output directory.
        #[arg(
            short,
            long,
            alias = "outputDir",
            value_hint = clap::ValueHint::DirPath,
            default_value_t = format!("splash_output_{}", Local::now().format("%Y%m%d_%H%M%S"))
        )]
        output_dir: String,

        /// Labeling time points (pulse) in minutes.
        #[arg(short, long, default_value = "0,15,30,60,180,360,720,1440")]
        time_points: String,

        /// Replicates per time point.
        #[arg(long, default_value_t = 3)]
        replicates: u32,

        /// Read length.
        #[arg(short = 'l', long, default_value_t = 50)]
        read_length: u32,

        /// Read coverage.
        #[arg(long = "read-coverage", alias = "cov", default_value_t = 200)]
        coverage: u32,

        /// Per-base sequencing error rate.
        #[arg(short = 'e', long = "sequencing-error", default_value_t = 0.01)]
        seq_error: f64,

        /// SNP rate in UTRs.
        #[arg(short, long, default_value_t = DEFAULT_SNP_RATE)]
        snp_rate: f64,

        /// T>C conversion rate.
        #[arg(long = "tc-rate", alias = "tc", default_value_t = DEFAULT_CONVERSION_RATE)]
        conversion_rate: f64,

        /// Lower bound for the simulated half-lives in minutes.
        #[arg(long = "min-halflife", alias = "minhl", default_value_t = DEFAULT_MIN_HALF_LIFE)]
        min_half_life: u32,

        /// Upper bound for the simulated half-lives in minutes.
        #[arg(long = "max-halflife", alias = "maxhl", default_value_t = DEFAULT_MAX_HALF_LIFE)]
        max_half_life: u32,

        /// Samples simulated in parallel.
        #[arg(short = 'j', long, default_value_t = 12)]
        workers: usize,
    },

    /// Report the conversion rate of mapped BAM files in a region.
    #[command(name = "util.conversionrate")]
    ConversionRate {
        /// BAM file(s).
        #[arg(required = true)]
        bams: Vec<PathBuf>,

        /// Reference FASTA file.
        #[arg(short, long)]
        reference: PathBuf,

        /// Region as chr:start-end, 1-based and inclusive.
        #[arg(long)]
        region: String,

        /// Analyse the minus strand (A>G on reverse reads).
        #[arg(long)]
        rev: bool,
    },
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(args.verbose, args.quiet)),
    )
    .init();

    let reporter = Reporter::new(!args.quiet);
    cli::run(args.command, args.seed, &reporter)
        .inspect_err(|e| log::debug!("Aborting on {:?} error", e.kind()))
}

fn main() -> miette::Result<()> {
    try_main().into_diagnostic()
}
