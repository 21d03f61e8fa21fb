use log::info;
use rand::Rng;
use std::path::Path;

use crate::artifacts::ensure_dir;
use crate::config::HalfLifeBounds;
use crate::error::Result;
use crate::model::{BedRecord, TurnoverRecord};
use crate::output::write_turnover_bed;
use crate::reader::bed::read_bed;

/// Draw one half-life per record, independently and uniformly from the bounds (inclusive).
pub fn assign_half_lives(
    records: Vec<BedRecord>,
    bounds: HalfLifeBounds,
    rng: &mut impl Rng,
) -> Vec<TurnoverRecord> {
    records
        .into_iter()
        .map(|bed| TurnoverRecord {
            bed,
            half_life: rng.gen_range(bounds.min()..=bounds.max()),
        })
        .collect()
}

pub fn simulate_turnover(
    input: &Path,
    output: &Path,
    bounds: HalfLifeBounds,
    rng: &mut impl Rng,
) -> Result<Vec<TurnoverRecord>> {
    let records = read_bed(&input)?;
    let turnover = assign_half_lives(records, bounds, rng);
    if let Some(dir) = output.parent() {
        ensure_dir(dir)?;
    }
    write_turnover_bed(output, &turnover)?;
    info!(
        "Assigned half-lives in [{}, {}] min to {} features in {}",
        bounds.min(),
        bounds.max(),
        turnover.len(),
        output.display()
    );
    Ok(turnover)
}
