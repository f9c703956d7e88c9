//! # Job System
//!
//! A small thread-pool for the CPU-bound sub-jobs spawned by generation tasks
//! (landscape fills, light propagation, per-batch meshing, model packaging).
//!
//! ## Architecture Overview
//!
//! - `JobPool`: owns the worker threads and dispatches submitted closures
//! - `JobHandle`: the caller's end of a completed-work channel
//!
//! Each worker thread is fed through its own mpsc channel and executes jobs in
//! submission order. A submitted closure returns its value through a dedicated
//! result channel wrapped in a `JobHandle`; completion is observed by polling the
//! handle (`try_take`), never by joining a thread, so the driver thread that steps
//! generation workers is never stalled by an unfinished mesh.
//!
//! ## Dispatch
//!
//! Jobs go to the least-loaded channel (per-channel in-flight counters, decremented
//! by the job itself on completion). With equally loaded channels this degrades to
//! picking the first, which is fine: job granularity is one chunk-stage, large
//! enough that imbalance evens out within a tick.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::info;

type Job = Box<dyn FnOnce() + Send>;

/// One worker thread plus the channel that feeds it.
struct JobChannel {
    job_sender: Sender<Job>,
    jobs_in_flight: Arc<AtomicUsize>,
    _worker: JoinHandle<()>,
}

/// A pool of worker threads executing generation sub-jobs.
///
/// The pool is created once at startup and shared by reference with every
/// generation task. Dropping the pool closes the job channels, which lets the
/// worker threads run to completion of their current job and exit.
pub struct JobPool {
    channels: Vec<JobChannel>,
}

impl JobPool {
    /// Creates a pool with `num_workers` dedicated threads.
    ///
    /// # Panics
    /// Panics if `num_workers` is zero or a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> Self {
        assert!(num_workers > 0, "a job pool needs at least one worker");

        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (job_sender, job_receiver) = channel::<Job>();

            let worker = thread::Builder::new()
                .name(format!("generation-job-{index}"))
                .spawn(move || {
                    while let Ok(job) = job_receiver.recv() {
                        job();
                    }
                })
                .expect("failed to spawn a job pool worker thread");

            channels.push(JobChannel {
                job_sender,
                jobs_in_flight: Arc::new(AtomicUsize::new(0)),
                _worker: worker,
            });
        }

        info!("Job pool started with {} worker threads", num_workers);

        JobPool { channels }
    }

    /// Submits a closure for execution on the least-loaded worker thread.
    ///
    /// The returned handle yields the closure's result exactly once.
    ///
    /// # Panics
    /// Panics if the selected worker thread has died; a dead pool thread means a
    /// previous job crashed the process invariants and nothing downstream can be
    /// trusted.
    pub fn submit<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let channel_index = self.least_loaded_channel();
        let channel = &self.channels[channel_index];

        let jobs_in_flight = channel.jobs_in_flight.clone();
        jobs_in_flight.fetch_add(1, Ordering::Relaxed);

        let (result_sender, result_receiver) = std::sync::mpsc::channel::<T>();

        let wrapped: Job = Box::new(move || {
            let result = job();
            jobs_in_flight.fetch_sub(1, Ordering::Relaxed);
            // The handle may have been dropped by a caller that no longer cares.
            let _ = result_sender.send(result);
        });

        if channel.job_sender.send(wrapped).is_err() {
            panic!("job pool worker {} is no longer running", channel_index);
        }

        JobHandle { result_receiver }
    }

    fn least_loaded_channel(&self) -> usize {
        self.channels
            .iter()
            .enumerate()
            .min_by_key(|(_, channel)| channel.jobs_in_flight.load(Ordering::Relaxed))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}

/// The receiving end of one submitted job.
///
/// A handle is consumed by exactly one of `try_take` (repeated until it yields the
/// result) or `wait_take` (blocking).
pub struct JobHandle<T> {
    result_receiver: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Non-blocking check for the job's result.
    ///
    /// Returns `None` while the job is still running.
    ///
    /// # Panics
    /// Panics if the job's worker thread disconnected without sending a result.
    pub fn try_take(&mut self) -> Option<T> {
        match self.result_receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                panic!("a generation job disappeared without reporting its result")
            }
        }
    }

    /// Blocks until the job finishes and returns its result.
    ///
    /// # Panics
    /// Panics if the job's worker thread disconnected without sending a result.
    pub fn wait_take(self) -> T {
        match self.result_receiver.recv() {
            Ok(result) => result,
            Err(_) => panic!("a generation job disappeared without reporting its result"),
        }
    }
}
