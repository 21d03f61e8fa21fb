use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of failures, mirrored in exit diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InputFormat,
    ReferenceMismatch,
    Io,
}

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("could not read {path}")]
    ReadWithPath {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("could not write to {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("could not create output directory {path}")]
    OutputDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("could not remove temporary file {path}")]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("could not read table {path}")]
    CsvRead {
        #[source]
        source: csv::Error,
        path: PathBuf,
    },

    #[error("could not write table {path}")]
    CsvWrite {
        #[source]
        source: csv::Error,
        path: PathBuf,
    },

    #[error("could not encode alignments to {path}")]
    Bam {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("could not build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("minimum half-life ({min} min) must be positive and not exceed maximum ({max} min)")]
    HalfLifeBounds { min: u32, max: u32 },

    #[error("{name} must lie in [0, 1] (got {value})")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("read length must be positive")]
    ReadLength,

    #[error("need at least 1 worker (got {threads})")]
    Threads { threads: usize },

    #[error("need at least 1 replicate (got {replicates})")]
    Replicates { replicates: u32 },

    #[error("need at least 1 time point")]
    TimePoints,

    #[error("could not parse time point \"{arg}\"")]
    TimePoint {
        #[source]
        source: std::num::ParseIntError,
        arg: String,
    },

    #[error("region \"{region}\" is not of the form chr:start-end")]
    Region { region: String },

    #[error("expected at least {expected} fields (got {n_fields}) in line {line_num} of {path}")]
    BedFields {
        path: PathBuf,
        line_num: usize,
        n_fields: usize,
        expected: usize,
    },

    #[error("invalid coordinates \"{start}\"-\"{end}\" in line {line_num} of {path}")]
    BedCoordinate {
        path: PathBuf,
        line_num: usize,
        start: String,
        end: String,
    },

    #[error("invalid strand \"{strand}\" in line {line_num} of {path}")]
    BedStrand {
        path: PathBuf,
        line_num: usize,
        strand: String,
    },

    #[error("score column \"{score}\" in line {line_num} of {path} is not a half-life in minutes")]
    BedHalfLife {
        path: PathBuf,
        line_num: usize,
        score: String,
    },

    #[error("feature name \"{name}\" in line {line_num} of {path} already used in line {first_line}")]
    DuplicateName {
        path: PathBuf,
        line_num: usize,
        first_line: usize,
        name: String,
    },

    #[error("malformed record {line_num} in expression table {path}")]
    ExpressionTable { path: PathBuf, line_num: usize },

    #[error("UTR \"{name}\" has no entry in {path}")]
    MissingModelEntry { path: PathBuf, name: String },

    #[error("read \"{read}\" in {path} does not name a modelled UTR")]
    ReadOrigin { path: PathBuf, read: String },

    #[error("interval {chrom}:{start}-{end} lies outside the reference sequence (length {len})")]
    ReferenceMismatch {
        chrom: String,
        start: u64,
        end: u64,
        len: u64,
    },

    #[error("sequence \"{chrom}\" not found in reference")]
    UnknownSequence { chrom: String },
}

impl CustomError {
    pub fn kind(&self) -> ErrorKind {
        use CustomError::*;
        match self {
            HalfLifeBounds { .. }
            | RateOutOfRange { .. }
            | ReadLength
            | Threads { .. }
            | Replicates { .. }
            | TimePoints
            | TimePoint { .. }
            | Region { .. } => ErrorKind::Configuration,
            BedFields { .. }
            | BedCoordinate { .. }
            | BedStrand { .. }
            | BedHalfLife { .. }
            | DuplicateName { .. }
            | ExpressionTable { .. }
            | MissingModelEntry { .. }
            | ReadOrigin { .. } => ErrorKind::InputFormat,
            ReferenceMismatch { .. } | UnknownSequence { .. } => ErrorKind::ReferenceMismatch,
            ReadWithPath { .. }
            | Write { .. }
            | OutputDir { .. }
            | Remove { .. }
            | CsvRead { .. }
            | CsvWrite { .. }
            | Bam { .. }
            | ThreadPool(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, CustomError>;
