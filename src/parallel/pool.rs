//! Rayon thread pool configuration for battle workloads.
//!
//! Use [WorkerPool::install] to run the parallel aggregators with a fixed
//! number of threads, or rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

/// Configures how many worker threads the parallel aggregators use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the global Rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Runs `f` on a pool with this worker count. A dedicated pool that fails to
    /// build falls back to the global pool; results never depend on thread count.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                tracing::warn!(
                    workers = self.workers,
                    error = %err,
                    "falling back to the global rayon pool"
                );
                f()
            }
        }
    }

    /// Threads available inside [install](WorkerPool::install).
    pub fn thread_count(&self) -> usize {
        self.install(rayon::current_num_threads)
    }
}
