use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::command::Command;
use crate::dashboard::BoardState;
use crate::logging::{log_event, JsonlLogger};
use crate::render;
use crate::shutdown::StopSignal;
use crate::surface::Surface;
use crate::worker::{AggregateProgress, WorkerId, WorkerRecord};

/// Bounded block on the channel so the stop signal is observed promptly.
pub const ROUTER_POLL: Duration = Duration::from_millis(250);

/// The single consumer of the command channel. Commands apply strictly in
/// arrival order; each one redraws only the box (or footer) it touched.
pub fn run_update_router(
    rx: Receiver<Command>,
    state: Arc<Mutex<BoardState>>,
    surface: Arc<dyn Surface>,
    stop: Arc<StopSignal>,
    logger: Option<JsonlLogger>,
) {
    while !stop.is_set() {
        match rx.recv_timeout(ROUTER_POLL) {
            Ok(command) => apply_command(command, &state, surface.as_ref(), logger.as_ref()),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

pub fn apply_command(
    command: Command,
    state: &Mutex<BoardState>,
    surface: &dyn Surface,
    logger: Option<&JsonlLogger>,
) {
    match command {
        Command::IncrementWorker { id, amount } => {
            mutate_worker(id, state, surface, logger, |record| record.increment(amount));
        }
        Command::SetStatus { id, status } => {
            mutate_worker(id, state, surface, logger, move |record| {
                record.set_status(status);
            });
        }
        Command::SetSteps { id, steps } => {
            mutate_worker(id, state, surface, logger, |record| record.set_steps(steps));
        }
        Command::SetValue { id, value } => {
            mutate_worker(id, state, surface, logger, |record| record.set_value(value));
        }
        Command::ResetStart { id } => {
            mutate_worker(id, state, surface, logger, |record| record.reset_start());
        }
        Command::IncrementApp { amount } => {
            mutate_app(state, surface, |app| app.increment(amount));
        }
        Command::SetAppSteps { steps } => {
            mutate_app(state, surface, |app| app.set_steps(steps));
        }
    }
}

/// Mutation happens under the state lock; rendering and drawing happen
/// outside it. Draw failures during steady-state updates are swallowed.
fn mutate_worker(
    id: WorkerId,
    state: &Mutex<BoardState>,
    surface: &dyn Surface,
    logger: Option<&JsonlLogger>,
    mutate: impl FnOnce(&mut WorkerRecord),
) {
    let snapshot = {
        let mut state = state.lock().expect("board state lock poisoned");
        let Some(record) = state.workers.get_mut(&id) else {
            drop(state);
            // Registration precedes reporting; a miss here is a producer bug
            // but must not take the dashboard down.
            log_event(logger, "warning", "router.unknown_target", json!({ "id": id }));
            return;
        };
        mutate(record);
        record.snapshot()
    };

    let rows = render::render_worker_box(
        snapshot.id,
        &snapshot.status,
        snapshot.value,
        snapshot.total_steps,
        snapshot.elapsed_secs,
        snapshot.region.width,
        snapshot.region.height,
    );
    let _ = surface.draw_box(snapshot.region, &rows);
}

fn mutate_app(
    state: &Mutex<BoardState>,
    surface: &dyn Surface,
    mutate: impl FnOnce(&mut AggregateProgress),
) {
    let footer = {
        let mut state = state.lock().expect("board state lock poisoned");
        mutate(&mut state.app);
        state.footer_view()
    };
    let rows = render::footer_lines(&footer, &crate::hotkeys::controls_legend());
    let _ = surface.draw_footer(&rows);
}
