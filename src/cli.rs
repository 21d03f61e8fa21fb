use crate::Command;
use crate::config::{
    HalfLifeBounds, check_rate, check_read_length, check_threads, parse_time_points,
    resolve_seed, seeded_rng,
};
use crate::conversion_rate::{Region, conversion_rate_from_bam};
use crate::error::{CustomError, Result};
use crate::model::Strand;
use crate::pipeline::{ReadParams, prepare_bed, reads, turnover, utrs};
use crate::progress::Reporter;
use crate::reader::reference::IndexedReference;
use crate::sweep::{SweepConfig, run_sweep};
use log::info;
use std::path::PathBuf;

/// Dispatch one command. Every argument is validated before the first file is touched.
pub fn run(command: Command, seed: Option<u64>, reporter: &Reporter) -> Result<()> {
    match command {
        Command::PrepareBed {
            bed,
            read_length,
            output_dir,
        } => {
            let read_length = check_read_length(read_length)?;
            let filtered = prepare_bed(&bed, &output_dir, read_length)?;
            info!("Prepared annotation: {}", filtered.display());
        }

        Command::Turnover {
            bed,
            min_half_life,
            max_half_life,
            output_dir,
        } => {
            let bounds = HalfLifeBounds::new(min_half_life, max_half_life)?;
            let mut rng = seeded_rng(resolve_seed(seed));
            turnover(&bed, &output_dir, bounds, &mut rng)?;
        }

        Command::Utrs {
            reference,
            bed,
            read_length,
            snp_rate,
            output_dir,
        } => {
            let read_length = check_read_length(read_length)?;
            let snp_rate = check_rate("SNP rate", snp_rate)?;
            let mut rng = seeded_rng(resolve_seed(seed));
            let (artifacts, total) =
                utrs(&bed, &reference, &output_dir, read_length, snp_rate, &mut rng)?;
            info!(
                "Total UTR length {total} bp, models in {}",
                artifacts.bed12.display()
            );
        }

        Command::Reads {
            bed,
            sample_name,
            read_length,
            read_number,
            coverage,
            seq_error,
            pulse,
            chase,
            conversion_rate,
            output_dir,
        } => {
            let params = ReadParams {
                read_length: check_read_length(read_length)?,
                read_number,
                coverage,
                seq_error: check_rate("sequencing error", seq_error)?,
                conversion_rate: check_rate("conversion rate", conversion_rate)?,
            };
            let mut rng = seeded_rng(resolve_seed(seed));
            let outcome = reads(
                &bed,
                &output_dir,
                &sample_name,
                &params,
                pulse,
                chase,
                &mut rng,
                reporter,
            )?;
            info!(
                "Wrote {} reads ({} conversions) to {}, summary in {}",
                outcome.reads,
                outcome.conversions,
                outcome.bam.display(),
                outcome.summary.display()
            );
        }

        Command::All {
            reference,
            bed,
            output_dir,
            time_points,
            replicates,
            read_length,
            coverage,
            seq_error,
            snp_rate,
            conversion_rate,
            min_half_life,
            max_half_life,
            workers,
        } => {
            if replicates == 0 {
                return Err(CustomError::Replicates { replicates });
            }
            let config = SweepConfig {
                reference,
                annotation: bed,
                output_dir: PathBuf::from(output_dir),
                time_points: parse_time_points(&time_points)?,
                replicates,
                read_length: check_read_length(read_length)?,
                coverage,
                seq_error: check_rate("sequencing error", seq_error)?,
                snp_rate: check_rate("SNP rate", snp_rate)?,
                conversion_rate: check_rate("conversion rate", conversion_rate)?,
                half_lives: HalfLifeBounds::new(min_half_life, max_half_life)?,
                workers: check_threads(workers)?,
                seed: resolve_seed(seed),
            };
            run_sweep(&config, reporter)?;
        }

        Command::ConversionRate {
            bams,
            reference,
            region,
            rev,
        } => {
            let region = Region::parse(&region)?;
            let strand = if rev { Strand::Minus } else { Strand::Plus };
            let mut reference = IndexedReference::open(&reference)?;
            for bam in &bams {
                let counts = conversion_rate_from_bam(bam, &mut reference, &region, strand)?;
                println!(
                    "{}\t{region}\t{strand}\t{}\t{}\t{}",
                    bam.display(),
                    counts.t_count,
                    counts.conversions,
                    counts.rate()
                );
            }
        }
    }
    Ok(())
}
