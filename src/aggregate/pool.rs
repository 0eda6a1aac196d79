use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Executes independent tasks and returns their results in task order.
///
/// Implementations may run tasks in any order and on any thread. The first
/// task error is returned and the remaining results are discarded.
pub trait WorkerPool {
    /// Number of tasks that can run at once
    fn workers(&self) -> usize;

    /// Apply `f` to every task
    ///
    /// # Errors
    ///
    /// Returns an error produced by `f` if any task fails.
    fn try_map<T, R, E, F>(&self, tasks: Vec<T>, f: F) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Sync + Send;
}

/// Work-stealing pool backed by rayon
pub struct RayonPool {
    pool: ThreadPool,
}

impl RayonPool {
    /// Build a pool with `threads` workers; `0` uses every logical processor
    ///
    /// # Errors
    ///
    /// Returns `ThreadPoolBuildError` if the threads cannot be spawned.
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mpra-count-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }
}

impl WorkerPool for RayonPool {
    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn try_map<T, R, E, F>(&self, tasks: Vec<T>, f: F) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Sync + Send,
    {
        self.pool
            .install(|| tasks.into_par_iter().map(f).collect::<Result<Vec<R>, E>>())
    }
}

/// Runs every task on the calling thread, in order
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialPool;

impl WorkerPool for SequentialPool {
    fn workers(&self) -> usize {
        1
    }

    fn try_map<T, R, E, F>(&self, tasks: Vec<T>, f: F) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Sync + Send,
    {
        tasks.into_iter().map(f).collect()
    }
}
