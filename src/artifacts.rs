//! File layout shared by the pipeline stages.
//!
//! Every name is derived once from the annotation's base name and handed
//! between stages as a typed value, so no stage re-derives another's paths.
//! The chain for `foo.bed` is `foo_original.bed` (filtered), then
//! `foo_original_utrs.bed` (half-lives), then
//! `foo_original_utrs.{bed12,fa,eplv,vcf}` (UTR models).

use crate::error::{CustomError, Result};
use log::info;
use std::path::{Path, PathBuf};

pub const MANIFEST_NAME: &str = "samples.tsv";
pub const PARAMETERS_NAME: &str = "simulation.json";

const ORIGINAL_SUFFIX: &str = "_original";
const UTRS_SUFFIX: &str = "_utrs";

/// `dir/foo.bed` + ("_utrs", "bed") -> `foo_utrs.bed`. Only the last extension is replaced.
pub fn replace_extension(path: &Path, suffix: &str, extension: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{suffix}.{extension}")
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    info!("Creating output directory: {}", dir.display());
    std::fs::create_dir_all(dir).map_err(|e| CustomError::OutputDir {
        source: e,
        path: dir.to_path_buf(),
    })
}

/// Output of PrepareAnnotation for a raw annotation.
pub fn filtered_bed_path(annotation: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(replace_extension(annotation, ORIGINAL_SUFFIX, "bed"))
}

/// Output of SimulateTurnover for a filtered annotation.
pub fn turnover_bed_path(filtered_bed: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(replace_extension(filtered_bed, UTRS_SUFFIX, "bed"))
}

/// The four co-indexed UTR model files plus the half-life BED they were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    pub turnover_bed: PathBuf,
    pub bed12: PathBuf,
    pub fasta: PathBuf,
    pub expression: PathBuf,
    pub variants: PathBuf,
}

impl ModelArtifacts {
    /// Model files named after `turnover_bed`, placed in `dir`.
    pub fn alongside(turnover_bed: &Path, dir: &Path) -> Self {
        Self {
            turnover_bed: turnover_bed.to_path_buf(),
            bed12: dir.join(replace_extension(turnover_bed, "", "bed12")),
            fasta: dir.join(replace_extension(turnover_bed, "", "fa")),
            expression: dir.join(replace_extension(turnover_bed, "", "eplv")),
            variants: dir.join(replace_extension(turnover_bed, "", "vcf")),
        }
    }

    /// Model files sitting next to `turnover_bed`, as written by the `utrs` stage.
    pub fn beside(turnover_bed: &Path) -> Self {
        let dir = turnover_bed.parent().unwrap_or_else(|| Path::new(""));
        Self::alongside(turnover_bed, dir)
    }
}

/// Every file the shared annotation pipeline produces for one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationArtifacts {
    pub annotation: PathBuf,
    pub filtered_bed: PathBuf,
    pub model: ModelArtifacts,
}

impl AnnotationArtifacts {
    pub fn derive(annotation: &Path, output_dir: &Path) -> Self {
        let filtered_bed = filtered_bed_path(annotation, output_dir);
        let turnover_bed = turnover_bed_path(&filtered_bed, output_dir);
        Self {
            annotation: annotation.to_path_buf(),
            filtered_bed,
            model: ModelArtifacts::alongside(&turnover_bed, output_dir),
        }
    }
}

/// Temporary and final files of one simulated sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleArtifacts {
    pub reads_bed: PathBuf,
    pub reads_fasta: PathBuf,
    pub bam: PathBuf,
    pub summary: PathBuf,
}

impl SampleArtifacts {
    pub fn derive(output_dir: &Path, sample_name: &str) -> Self {
        Self {
            reads_bed: output_dir.join(format!("{sample_name}_reads_tmp.bed")),
            reads_fasta: output_dir.join(format!("{sample_name}_reads_tmp.fa")),
            bam: output_dir.join(format!("{sample_name}_reads.bam")),
            summary: output_dir.join(format!("{sample_name}_utrsummary.csv")),
        }
    }

    pub fn temporaries(&self) -> [&Path; 2] {
        [&self.reads_bed, &self.reads_fasta]
    }
}
