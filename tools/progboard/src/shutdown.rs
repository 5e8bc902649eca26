use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// One shared stop flag for the three background loops. `wait` doubles as
/// the ticker's interval sleep so a trigger wakes every loop within one
/// timeout period.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let mut stopped = self.stopped.lock().expect("stop signal lock poisoned");
        *stopped = true;
        self.condvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.stopped.lock().expect("stop signal lock poisoned")
    }

    /// Blocks until triggered or the timeout elapses. Returns true when the
    /// signal fired.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock().expect("stop signal lock poisoned");
        loop {
            if *stopped {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _result) = self
                .condvar
                .wait_timeout(stopped, deadline - now)
                .expect("stop signal lock poisoned");
            stopped = guard;
        }
    }
}
