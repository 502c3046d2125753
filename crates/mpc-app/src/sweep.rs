//! Independent runs executed in parallel.

use rayon::prelude::*;

use crate::error::AppResult;

/// Run every scenario on the rayon pool and collect the outcomes in order.
///
/// `run` must build its own emulator and controller from the scenario so
/// that nothing is shared between runs; a failure in one scenario does not
/// affect the others.
pub fn sweep<T, R, F>(scenarios: Vec<T>, run: F) -> Vec<AppResult<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> AppResult<R> + Send + Sync,
{
    scenarios.into_par_iter().map(run).collect()
}
