//! Run independent event loops side by side on a rayon pool.
//!
//! Each scenario gets a fresh `EventLoop` from a builder closure keyed by
//! `scenario_id`. Results come back in `scenario_id` order regardless of
//! which thread finished first. A scenario whose builder fails, that panics
//! or that hits a `DesError` is reported as `Err(String)`; the rest of the
//! batch carries on.
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use des::parallel::{ParallelRunner, simple_progress_reporter};
//! # use des::{Agent, EventLoop};
//! # struct Idle;
//! # impl Agent<u8, usize> for Idle {
//! #     fn stats(&self) -> usize { 0 }
//! # }
//!
//! let results = ParallelRunner::new(20, |scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Idle)];
//!     Ok::<_, Infallible>(EventLoop::new(vec![(scenario_id as f64, 1)], agents))
//! })
//! .progress(simple_progress_reporter(10))
//! .num_threads(4)
//! .run(100.0);
//!
//! assert_eq!(results.len(), 20);
//! ```
//!
//! Determinism is the builder's job: derive every agent seed from
//! `scenario_id` and share no mutable state between scenarios.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::{EventLoop, SimTime};

/// Stats of every live agent at the end of a scenario, or why it failed.
pub type ScenarioResult<S> = Result<Vec<S>, String>;

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub struct ParallelRunner<T, S, E, F>
where
    F: Fn(usize) -> Result<EventLoop<T, S>, E> + Send + Sync,
    S: Send,
    E: Display,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    _scenario: PhantomData<fn() -> (T, S, E)>,
}

impl<T, S, E, F> ParallelRunner<T, S, E, F>
where
    F: Fn(usize) -> Result<EventLoop<T, S>, E> + Send + Sync,
    S: Send,
    E: Display,
{
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _scenario: PhantomData,
        }
    }

    /// Use a dedicated pool of `n` threads instead of rayon's global pool.
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Called with `(completed, total)` each time a scenario finishes.
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn run_one(&self, scenario_id: usize, run_until: SimTime) -> ScenarioResult<S> {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut event_loop = (self.builder)(scenario_id).map_err(|e| e.to_string())?;
            event_loop
                .run(run_until)
                .map(|()| event_loop.stats())
                .map_err(|e| e.to_string())
        }));

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }),
        }
    }

    pub fn run(self, run_until: SimTime) -> Vec<ScenarioResult<S>> {
        let completed = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = self.run_one(scenario_id, run_until);
                    if let Err(e) = &result {
                        tracing::warn!(scenario_id, error = %e, "scenario failed");
                    }
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = &self.progress_callback {
                        callback(done, self.num_scenarios);
                    }
                    result
                })
                .collect()
        };

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .inspect_err(|e| {
                    tracing::warn!(error = %e, "falling back to the global rayon pool")
                })
                .ok()
        });

        match pool {
            Some(pool) => pool.install(execute),
            None => execute(),
        }
    }
}

/// True every `interval` scenarios and on the last one.
pub fn progress_due(completed: usize, total: usize, interval: usize) -> bool {
    completed % interval.max(1) == 0 || completed == total
}

/// Logs progress whenever [`progress_due`] says so.
pub fn simple_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    move |completed, total| {
        if progress_due(completed, total, interval) {
            tracing::info!("completed {}/{} scenarios", completed, total);
        }
    }
}
