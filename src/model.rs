use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// One annotated feature (UTR) with 0-based, half-open coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
    pub score: String,
    pub strand: Strand,
}

impl BedRecord {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }
}

/// A feature with its ground-truth half-life in minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnoverRecord {
    pub bed: BedRecord,
    pub half_life: u32,
}

impl TurnoverRecord {
    /// Fraction of transcripts carrying label after `pulse` minutes of labeling
    /// followed by `chase` minutes without it.
    pub fn labeled_fraction(&self, pulse: u32, chase: u32) -> f64 {
        let hl = self.half_life as f64;
        let synthesized = 1.0 - (-(pulse as f64) / hl).exp2();
        synthesized * (-(chase as f64) / hl).exp2()
    }
}

/// Substitution injected into a UTR, in genomic coordinates (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub pos: u64,
    pub reference: u8,
    pub alternate: u8,
}

/// A modelled UTR: sequence in transcript orientation plus its expression level.
#[derive(Debug, Clone)]
pub struct UtrModel {
    pub turnover: TurnoverRecord,
    pub sequence: Vec<u8>,
    pub expression: f64,
    pub variants: Vec<Variant>,
}

impl UtrModel {
    pub fn name(&self) -> &str {
        &self.turnover.bed.name
    }
}

/// Everything needed to simulate one sample. Fixed once scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDescriptor {
    pub name: String,
    pub time_point: u32,
    pub replicate: u32,
    pub pulse: u32,
    pub chase: u32,
    pub read_count: u64,
    pub seq_error: f64,
    pub conversion_rate: f64,
    pub seed: u64,
}
