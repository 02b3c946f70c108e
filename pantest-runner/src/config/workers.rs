// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::LazyLock;
use tracing::warn;

/// The number of logical CPUs kept free for the harness itself.
pub const RESERVED_CPUS: usize = 2;

/// Gets the number of available CPUs and caches the value.
#[inline]
pub fn get_num_cpus() -> usize {
    static NUM_CPUS: LazyLock<usize> =
        LazyLock::new(|| match std::thread::available_parallelism() {
            Ok(count) => count.into(),
            Err(err) => {
                warn!("unable to determine num-cpus ({err}), assuming 1 logical CPU");
                1
            }
        });

    *NUM_CPUS
}

/// Computes the number of child processes that may run at the same time.
///
/// This is the configured maximum, capped at the number of logical CPUs minus
/// [`RESERVED_CPUS`], and never less than 1.
pub fn decide_max_workers(max_workers: usize) -> usize {
    compute_workers(max_workers, get_num_cpus())
}

fn compute_workers(max_workers: usize, num_cpus: usize) -> usize {
    max_workers
        .min(num_cpus.saturating_sub(RESERVED_CPUS))
        .max(1)
}
