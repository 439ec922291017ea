//! Background heartbeat service.
//!
//! A dedicated ticker thread that reports server liveness while listeners
//! are up. It runs outside the worker runtime so it can be acquired before
//! the workers start and released after the listeners are gone.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::ReleaseError;
use crate::lifecycle::resources::Disposable;
use crate::observability::metrics::UPTIME_SECONDS;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic liveness ticker, owned by the resource stack.
pub struct Heartbeat {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Spawn the ticker thread.
    pub fn start() -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("slipway-heartbeat".into())
            .spawn(move || run(stopped))?;
        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }
}

fn run(stopped: mpsc::Receiver<()>) {
    let started = Instant::now();
    loop {
        match stopped.recv_timeout(HEARTBEAT_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let uptime = started.elapsed().as_secs_f64();
                metrics::gauge!(UPTIME_SECONDS).set(uptime);
                tracing::trace!(uptime_secs = uptime, "heartbeat");
            }
        }
    }
}

impl Disposable for Heartbeat {
    fn name(&self) -> &'static str {
        "heartbeat"
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        // Dropping the sender disconnects the channel and wakes the ticker.
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| ReleaseError {
                resource: "heartbeat",
                message: "ticker thread panicked".into(),
            })?;
        }
        Ok(())
    }
}
