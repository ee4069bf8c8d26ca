//! Parallel execution of independent EventLoop scenarios
//!
//! Each scenario is built, run and summarised on a rayon worker. Results come
//! back in scenario order whatever the thread count, so a batch is
//! reproducible as long as the builder derives all randomness from the
//! scenario id.
//!
//! A panic inside one scenario is caught and returned as `Err(String)`; the
//! rest of the batch keeps running.
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! # use des::{Agent, EventLoop};
//! # struct Idle;
//! # impl Agent<u8, usize> for Idle {
//! #     fn stats(&self) -> usize { 0 }
//! # }
//!
//! let results = ParallelRunner::new(8, |_scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Idle)];
//!     EventLoop::new(vec![(0, 1)], agents)
//! })
//! .num_threads(2)
//! .run(100)
//! .unwrap();
//!
//! assert_eq!(results.len(), 8);
//! ```

use crate::EventLoop;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Outcome of one scenario: stats of every agent, or the panic message
pub type ScenarioResult<S> = Result<Vec<S>, String>;

/// Executes multiple EventLoop scenarios in parallel
///
/// `F` builds a fresh loop for a scenario id and must be callable from any
/// worker thread.
pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    _marker: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _marker: PhantomData,
        }
    }

    /// Use a dedicated pool of `n` threads instead of rayon's global pool
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Run every scenario up to `run_until` and return results in scenario order
    ///
    /// Fails only if a dedicated thread pool was requested and could not be built.
    pub fn run(
        self,
        run_until: usize,
    ) -> Result<Vec<ScenarioResult<S>>, rayon::ThreadPoolBuildError> {
        let completed = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let mut event_loop = (self.builder)(scenario_id);
                        event_loop.run(run_until);
                        event_loop.stats()
                    }));

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(done, self.num_scenarios);
                    }

                    result.map_err(|panic| {
                        if let Some(s) = panic.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "unknown panic".to_string()
                        }
                    })
                })
                .collect()
        };

        match self.num_threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                Ok(pool.install(execute))
            }
            None => Ok(execute()),
        }
    }
}

/// Progress callback that logs every `interval` completed scenarios
pub fn log_progress(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            log::info!("completed {}/{} scenarios", completed, total);
        }
    }
}
