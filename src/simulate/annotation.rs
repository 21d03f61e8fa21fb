use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use crate::artifacts::ensure_dir;
use crate::error::{CustomError, Result};
use crate::output::write_bed_lines;
use crate::reader::bed::{BedLine, BedReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareStats {
    pub kept: usize,
    pub dropped: usize,
}

/// Feature names key the model files written downstream, so each may occur once.
fn check_unique_names(path: &Path, lines: &[BedLine]) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(lines.len());
    for line in lines {
        if let Some(&first_line) = seen.get(line.record.name.as_str()) {
            return Err(CustomError::DuplicateName {
                path: path.to_path_buf(),
                line_num: line.line_num,
                first_line,
                name: line.record.name.clone(),
            });
        }
        seen.insert(&line.record.name, line.line_num);
    }
    Ok(())
}

/// Copy every feature longer than `read_length` from `input` to `output`, unchanged.
///
/// The whole input is validated before anything is written, so a malformed record
/// leaves no partial output behind.
pub fn prepare_annotation(input: &Path, output: &Path, read_length: u32) -> Result<PrepareStats> {
    let lines = BedReader::open(&input)?.collect::<Result<Vec<_>>>()?;
    check_unique_names(input, &lines)?;
    let total = lines.len();
    let kept: Vec<&str> = lines
        .iter()
        .filter(|l| l.record.len() > read_length as u64)
        .map(|l| l.line.as_str())
        .collect();

    if let Some(dir) = output.parent() {
        ensure_dir(dir)?;
    }
    write_bed_lines(output, kept.iter().copied())?;

    let stats = PrepareStats {
        kept: kept.len(),
        dropped: total - kept.len(),
    };
    debug!("Dropped {} features not longer than {read_length} bp", stats.dropped);
    info!(
        "Wrote {} of {total} features to {}",
        stats.kept,
        output.display()
    );
    Ok(stats)
}
