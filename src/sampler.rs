//! The sampling loop.
//!
//! A `Sampler` runs every collector once per cycle, each on its own thread,
//! and waits for all of them before looking at the results. Only a complete
//! cycle, one where every collector had something to say and every counter
//! could be differenced, reaches the sinks.

use collector::{self, CollectResult, Collector};
use delta::DeltaEngine;
use metric::Point;
use sink::Sink;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Outcome of one sampling cycle.
#[derive(Debug, PartialEq)]
pub enum Cycle {
    /// Every collector reported and every point is usable.
    Complete(Vec<Point>),
    /// Something is missing. The partial batch has been dropped.
    Incomplete,
}

/// While collectors keep coming back empty, only every this many
/// consecutive cycles is logged.
pub const QUIET_LOG_EVERY: usize = 1000;

fn should_log_quiet(streak: usize) -> bool {
    streak == 1 || streak % QUIET_LOG_EVERY == 0
}

/// Drives collectors and hands complete batches to sinks.
pub struct Sampler {
    collectors: Vec<Arc<Collector>>,
    engine: Arc<DeltaEngine>,
    sinks: Vec<Box<Sink>>,
    interval: Duration,
    daemon: bool,
    quiet_streak: AtomicUsize,
}

fn panic_message(payload: &(Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_collector(collector: &Arc<Collector>, engine: &DeltaEngine) -> CollectResult {
    match panic::catch_unwind(AssertUnwindSafe(|| collector.collect(engine))) {
        Ok(res) => res,
        Err(payload) => Err(collector::Error::Panicked(panic_message(&*payload))),
    }
}

impl Sampler {
    /// Create a new `Sampler`. In daemon mode `run` never returns.
    pub fn new(
        collectors: Vec<Arc<Collector>>,
        engine: Arc<DeltaEngine>,
        sinks: Vec<Box<Sink>>,
        interval: Duration,
        daemon: bool,
    ) -> Sampler {
        Sampler {
            collectors: collectors,
            engine: engine,
            sinks: sinks,
            interval: interval,
            daemon: daemon,
            quiet_streak: AtomicUsize::new(0),
        }
    }

    /// Run every collector once and gather their results.
    ///
    /// Blocks until each collector has delivered. A collector that never
    /// returns stalls the cycle.
    pub fn cycle(&self) -> Cycle {
        let total = self.collectors.len();
        let (snd, rcv) = mpsc::sync_channel(total);

        for collector in &self.collectors {
            let name = collector.name();
            let worker_collector = Arc::clone(collector);
            let worker_engine = Arc::clone(&self.engine);
            let worker_snd = snd.clone();
            let spawned = thread::Builder::new()
                .name(format!("collect-{}", name))
                .spawn(move || {
                    let res = run_collector(&worker_collector, &worker_engine);
                    let _ = worker_snd.send((name, res));
                });
            if let Err(e) = spawned {
                let _ = snd.send((name, Err(collector::Error::Io(e))));
            }
        }
        drop(snd);

        let mut complete = true;
        let mut quiet = Vec::new();
        let mut batch = Vec::new();
        for _ in 0..total {
            let (name, res) = match rcv.recv() {
                Ok(received) => received,
                Err(_) => {
                    error!("collector result channel closed early");
                    return Cycle::Incomplete;
                }
            };
            match res {
                Err(e) => error!("collector {} failed: {}", name, e),
                Ok(ref points) if points.is_empty() => {
                    quiet.push(name);
                    complete = false;
                }
                Ok(points) => for point in points {
                    match point {
                        None => complete = false,
                        Some(point) => match point.validate() {
                            Ok(()) => batch.push(point),
                            Err(e) => error!("dropping point from {}: {}", name, e),
                        },
                    }
                },
            }
        }

        if quiet.is_empty() {
            self.quiet_streak.store(0, Ordering::Relaxed);
        } else {
            let streak = self.quiet_streak.fetch_add(1, Ordering::Relaxed) + 1;
            if should_log_quiet(streak) {
                quiet.sort();
                debug!(
                    "nothing to report yet from {} ({} cycles in a row)",
                    quiet.join(", "),
                    streak
                );
            }
        }

        if complete {
            Cycle::Complete(batch)
        } else {
            trace!("incomplete cycle, dropping {} points", batch.len());
            Cycle::Incomplete
        }
    }

    /// Deliver a complete batch to every sink, in order. Failures are logged
    /// and the batch is not retried.
    pub fn flush(&mut self, batch: &[Point]) {
        for sink in &mut self.sinks {
            match sink.deliver(batch) {
                Ok(()) => trace!("{} accepted {} points", sink.name(), batch.len()),
                Err(e) => error!("{} failed to deliver {} points: {}", sink.name(), batch.len(), e),
            }
        }
    }

    /// Run one cycle, flush it if complete, and say how long to pause
    /// before the next one. `None` means sampling is over.
    ///
    /// In daemon mode an incomplete cycle is retried without a pause and a
    /// complete one is followed by `interval`. Otherwise incomplete cycles
    /// are retried after `interval` and the first complete one ends the run.
    pub fn step(&mut self) -> Option<Duration> {
        match self.cycle() {
            Cycle::Complete(batch) => {
                self.flush(&batch);
                if self.daemon {
                    Some(self.interval)
                } else {
                    None
                }
            }
            Cycle::Incomplete => if self.daemon {
                Some(Duration::from_secs(0))
            } else {
                Some(self.interval)
            },
        }
    }

    /// Sample until `step` says to stop. In daemon mode this never returns.
    pub fn run(&mut self) {
        while let Some(pause) = self.step() {
            if pause > Duration::from_secs(0) {
                thread::sleep(pause);
            }
        }
    }
}
