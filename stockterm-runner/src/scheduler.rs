//! Timer thread driving the simulation.
//!
//! Three independent periodic timers (price tick, synthetic news, external
//! news refresh) are multiplexed on one thread. Each firing is wrapped into
//! the consumer's task type and pushed onto its queue; the scheduler never
//! touches simulation state itself.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::SimConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    PriceTick,
    News,
    ExternalNews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub price: Duration,
    pub news: Duration,
    pub external_news: Duration,
}

impl Intervals {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            price: config.price_interval(),
            news: config.news_interval(),
            external_news: config.real_news_interval(),
        }
    }
}

/// Handle to the running timer thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct Scheduler {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the timer thread. Firings are converted with `wrap` and sent on
    /// `queue`; the thread exits once the queue's receiver is gone.
    pub fn spawn<T, F>(intervals: Intervals, queue: Sender<T>, wrap: F) -> std::io::Result<Self>
    where
        T: Send + 'static,
        F: Fn(Timer) -> T + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("stockterm-scheduler".into())
            .spawn(move || {
                let start = Instant::now();
                let mut timers = [
                    (Timer::PriceTick, intervals.price, start + intervals.price),
                    (Timer::News, intervals.news, start + intervals.news),
                    (
                        Timer::ExternalNews,
                        intervals.external_news,
                        start + intervals.external_news,
                    ),
                ];
                loop {
                    let next = timers.iter().map(|t| t.2).min().unwrap_or(start);
                    let wait = next.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let now = Instant::now();
                    for (timer, every, due) in timers.iter_mut() {
                        if *due > now {
                            continue;
                        }
                        if queue.send(wrap(*timer)).is_err() {
                            debug!("task queue closed; scheduler exiting");
                            return;
                        }
                        *due += *every;
                        // Fell behind (e.g. suspended): skip missed firings.
                        if *due <= now {
                            *due = now + *every;
                        }
                    }
                }
                debug!("scheduler stopped");
            })?;
        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the timer thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
