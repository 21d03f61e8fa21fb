use log::debug;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::config::check_threads;
use crate::error::Result;

/// Run `run` over every job on a pool of at most `workers` threads.
///
/// Results come back in job order. Jobs share no state beyond what `run`
/// borrows read-only. The first failure observed is returned; jobs already
/// running are left to finish and nothing is retried.
pub fn execute<J, T, F>(jobs: &[J], workers: usize, run: F) -> Result<Vec<T>>
where
    J: Sync,
    T: Send,
    F: Fn(&J) -> Result<T> + Sync + Send,
{
    let workers = check_threads(workers)?;
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    debug!("Running {} jobs on {workers} workers", jobs.len());
    pool.install(|| jobs.par_iter().map(&run).collect())
}
