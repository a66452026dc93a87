//! Fixed-period task runner on a dedicated thread.
//!
//! Ticks are scheduled against absolute deadlines so the period does not
//! drift with the time the task itself takes. When the task overruns, missed
//! ticks are skipped rather than run back to back.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Handle to a running periodic task.
pub struct PeriodicTask {
    name: String,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `task` on a named thread, running it once per `period`. The
    /// first run happens one period after spawning.
    pub fn spawn<F>(name: &str, period: Duration, mut task: F) -> AppResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return Err(AppError::Validation("task period must be positive".to_string()));
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let mut deadline = Instant::now() + period;
            loop {
                let wait = deadline.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                task();
                deadline += period;
                let now = Instant::now();
                if deadline <= now {
                    let behind = now.duration_since(deadline);
                    let skipped = (behind.as_nanos() / period.as_nanos()) as u32 + 1;
                    debug!(task = %thread_name, skipped, "overran period, skipping ticks");
                    deadline += period * skipped;
                }
            }
        })?;
        Ok(Self {
            name: name.to_string(),
            stop_tx,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the task after its current run and wait for the thread.
    pub fn stop(self) -> AppResult<()> {
        // The thread may already have exited; a closed channel is fine.
        let _ = self.stop_tx.send(());
        self.handle
            .join()
            .map_err(|_| AppError::WorkerPanicked { name: self.name })
    }
}
