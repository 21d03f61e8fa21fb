use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{CustomError, Result};
use crate::model::{BedRecord, Strand, TurnoverRecord};

pub(crate) const BED_FIELDS: usize = 6;

/// A parsed BED record together with the exact line it came from.
pub struct BedLine {
    pub record: BedRecord,
    pub line: String,
    pub line_num: usize,
}

/// Streams BED6+ records, skipping blank, comment, `track` and `browser` lines.
pub struct BedReader {
    reader: BufReader<File>,
    path: PathBuf,
    line_num: usize,
    done: bool,
}

impl BedReader {
    pub fn open(path: &impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path).map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.as_ref().to_path_buf(),
        })?;
        Ok(Self {
            reader: BufReader::new(f),
            path: path.as_ref().to_path_buf(),
            line_num: 0,
            done: false,
        })
    }
}

impl Iterator for BedReader {
    type Item = Result<BedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_num += 1;
                    let trimmed = line.trim_end_matches(['\n', '\r']);
                    if is_header(trimmed) {
                        continue;
                    }
                    let parsed = parse_bed_line(trimmed, &self.path, self.line_num);
                    if parsed.is_err() {
                        // Poison iterator to prevent further reads
                        self.done = true;
                    }
                    let line_num = self.line_num;
                    return Some(parsed.map(|record| BedLine {
                        record,
                        line: trimmed.to_string(),
                        line_num,
                    }));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(CustomError::ReadWithPath {
                        source: e,
                        path: self.path.clone(),
                    }));
                }
            }
        }
        None
    }
}

fn is_header(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

pub(crate) fn parse_bed_line(line: &str, path: &Path, line_num: usize) -> Result<BedRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < BED_FIELDS {
        return Err(CustomError::BedFields {
            path: path.to_path_buf(),
            line_num,
            n_fields: fields.len(),
            expected: BED_FIELDS,
        });
    }
    let coordinate_error = || CustomError::BedCoordinate {
        path: path.to_path_buf(),
        line_num,
        start: fields[1].to_string(),
        end: fields[2].to_string(),
    };
    let start: u64 = fields[1].parse().map_err(|_| coordinate_error())?;
    let end: u64 = fields[2].parse().map_err(|_| coordinate_error())?;
    if end < start {
        return Err(coordinate_error());
    }
    let strand = Strand::parse(fields[5]).ok_or_else(|| CustomError::BedStrand {
        path: path.to_path_buf(),
        line_num,
        strand: fields[5].to_string(),
    })?;
    Ok(BedRecord {
        chrom: fields[0].to_string(),
        start,
        end,
        name: fields[3].to_string(),
        score: fields[4].to_string(),
        strand,
    })
}

pub fn read_bed(path: &impl AsRef<Path>) -> Result<Vec<BedRecord>> {
    BedReader::open(path)?
        .map(|line| line.map(|l| l.record))
        .collect()
}

/// Read a BED (or BED12) whose score column holds each feature's half-life.
pub fn read_turnover_bed(path: &impl AsRef<Path>) -> Result<Vec<TurnoverRecord>> {
    let mut records = Vec::new();
    for line in BedReader::open(path)? {
        let BedLine {
            record: bed,
            line_num,
            ..
        } = line?;
        let half_life: u32 = bed.score.parse().map_err(|_| CustomError::BedHalfLife {
            path: path.as_ref().to_path_buf(),
            line_num,
            score: bed.score.clone(),
        })?;
        if half_life == 0 {
            return Err(CustomError::BedHalfLife {
                path: path.as_ref().to_path_buf(),
                line_num,
                score: bed.score,
            });
        }
        records.push(TurnoverRecord { bed, half_life });
    }
    Ok(records)
}

/// Summed length of all features in a BED/BED12 file.
pub fn total_utr_length(path: &impl AsRef<Path>) -> Result<u64> {
    let mut total = 0;
    for line in BedReader::open(path)? {
        total += line?.record.len();
    }
    Ok(total)
}
