use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::dashboard::BoardState;
use crate::hotkeys::{self, ViewportAction};
use crate::layout::ScrollOutcome;
use crate::shutdown::StopSignal;
use crate::surface::Surface;

/// Key listener: a bounded poll so shutdown is observed, two recognized
/// scroll commands, everything else ignored.
pub fn run_viewport_listener(
    state: Arc<Mutex<BoardState>>,
    surface: Arc<dyn Surface>,
    stop: Arc<StopSignal>,
    poll_timeout: Duration,
) {
    while !stop.is_set() {
        let key = match surface.poll_key(poll_timeout) {
            Ok(Some(key)) => key,
            Ok(None) | Err(_) => continue,
        };
        let Some(action) = hotkeys::action_for_key(key) else {
            continue;
        };
        apply_scroll(action, &state, surface.as_ref());
    }
}

/// Scrolling past either bound is a no-op plus a bell, never an error. An
/// accepted scroll re-projects the canvas at the new offset.
pub fn apply_scroll(action: ViewportAction, state: &Mutex<BoardState>, surface: &dyn Surface) {
    let outcome = {
        let mut state = state.lock().expect("board state lock poisoned");
        match action {
            ViewportAction::ScrollDown => state.layout.scroll_down(),
            ViewportAction::ScrollUp => state.layout.scroll_up(),
        }
    };
    match outcome {
        ScrollOutcome::Moved(offset) => {
            let _ = surface.refresh(offset);
        }
        ScrollOutcome::AtBound(_) => surface.bell(),
    }
}
