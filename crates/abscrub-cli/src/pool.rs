use abscrub_core::error::AbscrubError;
use rayon::prelude::*;

const DEFAULT_MAX_JOBS: usize = 8;

/// Worker count when `--jobs` is not given.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_MAX_JOBS)
        .min(DEFAULT_MAX_JOBS)
        .max(1)
}

/// Apply `f` to every item on a pool of `jobs` threads. Results keep item order.
pub fn run<T, R, F>(items: &[T], jobs: usize, f: F) -> Result<Vec<R>, AbscrubError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| AbscrubError::WorkerPool(e.to_string()))?;
    Ok(pool.install(|| items.par_iter().map(&f).collect()))
}
