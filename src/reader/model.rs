use bio::io::fasta;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::artifacts::ModelArtifacts;
use crate::error::{CustomError, Result};
use crate::model::UtrModel;
use crate::reader::bed::read_turnover_bed;

pub(crate) const EXPRESSION_HEADER: [&str; 2] = ["name", "expression"];

pub fn read_expression_table(path: &impl AsRef<Path>) -> Result<HashMap<String, f64>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .map_err(|source| CustomError::CsvRead {
            source,
            path: path.to_path_buf(),
        })?;

    let mut levels = HashMap::new();
    for (record_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|source| CustomError::CsvRead {
            source,
            path: path.to_path_buf(),
        })?;
        // +2: 1-based, after the header line
        let malformed = || CustomError::ExpressionTable {
            path: path.to_path_buf(),
            line_num: record_idx + 2,
        };
        if record.len() != EXPRESSION_HEADER.len() {
            return Err(malformed());
        }
        let level: f64 = record[1].trim().parse().map_err(|_| malformed())?;
        if !level.is_finite() || level < 0.0 {
            return Err(malformed());
        }
        levels.insert(record[0].trim().to_string(), level);
    }
    Ok(levels)
}

pub fn read_sequences(path: &impl AsRef<Path>) -> Result<HashMap<String, Vec<u8>>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: path.to_path_buf(),
    })?;
    let mut sequences = HashMap::new();
    for result in fasta::Reader::new(f).records() {
        let record = result.map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.to_path_buf(),
        })?;
        sequences.insert(record.id().to_string(), record.seq().to_vec());
    }
    Ok(sequences)
}

/// Join the BED12, FASTA and expression table written by the UTR stage, keyed by UTR name.
pub fn load_utr_models(artifacts: &ModelArtifacts) -> Result<Vec<UtrModel>> {
    let records = read_turnover_bed(&artifacts.bed12)?;
    let mut sequences = read_sequences(&artifacts.fasta)?;
    let levels = read_expression_table(&artifacts.expression)?;

    records
        .into_iter()
        .map(|turnover| {
            let name = turnover.bed.name.clone();
            let sequence = sequences
                .remove(&name)
                .ok_or_else(|| CustomError::MissingModelEntry {
                    path: artifacts.fasta.clone(),
                    name: name.clone(),
                })?;
            let expression =
                levels
                    .get(&name)
                    .copied()
                    .ok_or_else(|| CustomError::MissingModelEntry {
                        path: artifacts.expression.clone(),
                        name,
                    })?;
            Ok(UtrModel {
                turnover,
                sequence,
                expression,
                variants: Vec::new(),
            })
        })
        .collect()
}
