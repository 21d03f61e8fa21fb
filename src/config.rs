use crate::error::{CustomError, Result};
use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

pub const DEFAULT_SNP_RATE: f64 = 0.001;
pub const DEFAULT_COVERAGE: u32 = 20;
pub const DEFAULT_SEQ_ERROR: f64 = 0.05;
pub const DEFAULT_CONVERSION_RATE: f64 = 0.03;
pub const DEFAULT_MIN_HALF_LIFE: u32 = 30;
pub const DEFAULT_MAX_HALF_LIFE: u32 = 720;

pub type SimRng = Xoshiro256PlusPlus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HalfLifeBounds {
    min: u32,
    max: u32,
}

impl HalfLifeBounds {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min == 0 || min > max {
            return Err(CustomError::HalfLifeBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

pub fn check_rate(name: &'static str, value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CustomError::RateOutOfRange { name, value });
    }
    Ok(value)
}

pub fn check_read_length(read_length: u32) -> Result<u32> {
    if read_length == 0 {
        return Err(CustomError::ReadLength);
    }
    Ok(read_length)
}

pub fn check_threads(threads: usize) -> Result<usize> {
    if threads == 0 {
        return Err(CustomError::Threads { threads });
    }
    Ok(threads)
}

/// Parse a comma-separated list of labeling time points in minutes, e.g. "0,15,30".
pub fn parse_time_points(spec: &str) -> Result<Vec<u32>> {
    let mut time_points = Vec::new();
    for raw in spec.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let minutes: u32 = raw.parse().map_err(|e| CustomError::TimePoint {
            source: e,
            arg: raw.to_string(),
        })?;
        time_points.push(minutes);
    }
    if time_points.is_empty() {
        return Err(CustomError::TimePoints);
    }
    Ok(time_points)
}

/// Pick the run seed; an unseeded run draws one and logs it so it can be replayed.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!("No --seed given, using {seed}");
            seed
        }
    }
}

pub fn seeded_rng(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}
