// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use log::*;

#[cfg(feature = "fuse-parallel")]
use rayon::iter::PanicFuse;
use rayon::{current_num_threads, iter::ParallelIterator, ThreadPoolBuilder};

use crate::errors::{Result, SlimError};

/// Configure the global worker pool.  Can only succeed once per process.
pub fn init_accel_pool(n_threads: usize) -> Result<()> {
    debug!(
        "initializing accelerator thread pool with {} threads",
        n_threads
    );
    ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .map_err(|e| SlimError::Configuration(format!("Rayon initialization error: {}", e)))
}

pub fn thread_count() -> usize {
    current_num_threads()
}

/// Run a computation on a dedicated pool of `threads` workers, or on the
/// global pool if no count is given.
pub fn with_pool<R, F>(threads: Option<usize>, op: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match threads {
        None => Ok(op()),
        Some(n) => {
            debug!("running on a scoped pool of {} threads", n);
            let pool = ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| {
                    SlimError::Configuration(format!("Rayon initialization error: {}", e))
                })?;
            Ok(pool.install(op))
        }
    }
}

#[cfg(not(feature = "fuse-parallel"))]
pub fn maybe_fuse<I: ParallelIterator>(iter: I) -> I {
    iter
}

#[cfg(feature = "fuse-parallel")]
pub fn maybe_fuse<I: ParallelIterator>(iter: I) -> PanicFuse<I> {
    iter.panic_fuse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_pool_has_requested_threads() {
        let n = with_pool(Some(2), thread_count).expect("pool");
        assert_eq!(n, 2);
    }

    #[test]
    fn global_pool_passthrough() {
        let n = with_pool(None, || 7).expect("pool");
        assert_eq!(n, 7);
    }
}
