use std::time::Instant;

use crate::layout::Region;

pub type WorkerId = u32;

/// Per-worker mutable state. Created once at registration; the record and
/// its region persist for the dashboard's lifetime.
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub region: Region,
    started_at: Instant,
    status: String,
    total_steps: f64,
    value: f64,
}

impl WorkerRecord {
    pub fn new(
        id: WorkerId,
        region: Region,
        status: impl Into<String>,
        total_steps: f64,
        value: f64,
    ) -> Self {
        let total_steps = total_steps.max(0.0);
        Self {
            id,
            region,
            started_at: Instant::now(),
            status: status.into(),
            total_steps,
            value: value.clamp(0.0, total_steps),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn total_steps(&self) -> f64 {
        self.total_steps
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Stored verbatim; truncation happens at render time.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(0.0, self.total_steps);
    }

    pub fn increment(&mut self, amount: f64) {
        self.set_value(self.value + amount);
    }

    /// Lowering the total below the current value re-clamps the value down
    /// rather than rejecting the update (estimates change mid-run).
    pub fn set_steps(&mut self, steps: f64) {
        self.total_steps = steps.max(0.0);
        self.value = self.value.clamp(0.0, self.total_steps);
    }

    pub fn reset_start(&mut self) {
        self.started_at = Instant::now();
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id,
            region: self.region,
            status: self.status.clone(),
            total_steps: self.total_steps,
            value: self.value,
            elapsed_secs: self.elapsed_secs(),
        }
    }
}

/// Point-in-time view of a record, taken under the state lock so rendering
/// can happen outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub region: Region,
    pub status: String,
    pub total_steps: f64,
    pub value: f64,
    pub elapsed_secs: f64,
}

/// Application-level progress shown in the footer. The bar only renders once
/// a total has been supplied.
#[derive(Debug, Clone, Default)]
pub struct AggregateProgress {
    total_steps: Option<f64>,
    value: f64,
}

impl AggregateProgress {
    pub fn new(total_steps: Option<f64>) -> Self {
        Self {
            total_steps: total_steps.map(|steps| steps.max(0.0)),
            value: 0.0,
        }
    }

    pub fn total_steps(&self) -> Option<f64> {
        self.total_steps
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_steps(&mut self, steps: f64) {
        let steps = steps.max(0.0);
        self.total_steps = Some(steps);
        self.value = self.value.clamp(0.0, steps);
    }

    pub fn increment(&mut self, amount: f64) {
        self.set_value(self.value + amount);
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = match self.total_steps {
            Some(total) => value.clamp(0.0, total),
            None => value.max(0.0),
        };
    }

    /// `(value, total)` when the bar is active.
    pub fn bar(&self) -> Option<(f64, f64)> {
        self.total_steps.map(|total| (self.value, total))
    }
}
