use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crate::command::{Command, WireWriter};
use crate::errors::BoardError;

/// Demo worker process: reports one status, one worker increment and one
/// aggregate increment per step on stdout, with a jittered delay between
/// steps so concurrent workers drift apart visibly.
pub fn run_simulated_worker(steps: u32, step_delay_ms: u64) -> Result<(), BoardError> {
    let stdout = io::stdout();
    emit_worker_steps(stdout.lock(), std::process::id(), steps, step_delay_ms)
}

pub(crate) fn emit_worker_steps<W: Write>(
    out: W,
    pid: u32,
    steps: u32,
    step_delay_ms: u64,
) -> Result<(), BoardError> {
    let mut wire = WireWriter::new(out);
    let mut jitter = Jitter::new(u64::from(pid) | 1);
    for step in 1..=steps {
        if step_delay_ms > 0 {
            thread::sleep(Duration::from_millis(jitter.delay(step_delay_ms)));
        }
        wire.send(&Command::SetStatus {
            id: pid,
            status: format!("Iteration #{step}"),
        })?;
        wire.send(&Command::IncrementWorker {
            id: pid,
            amount: 1.0,
        })?;
        wire.send(&Command::IncrementApp { amount: 1.0 })?;
    }
    wire.send(&Command::SetStatus {
        id: pid,
        status: "Done".to_string(),
    })
}

/// Splitmix-style generator, plenty for demo pacing.
struct Jitter(u64);

impl Jitter {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Delay in `[base/2, 3*base/2)`.
    fn delay(&mut self, base_ms: u64) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        let half = base_ms / 2;
        half + z % base_ms.max(1)
    }
}
