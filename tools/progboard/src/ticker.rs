use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::dashboard::BoardState;
use crate::hotkeys;
use crate::render;
use crate::shutdown::StopSignal;
use crate::surface::Surface;

/// Periodic repaint, independent of the update router: refreshes the clock,
/// every worker's elapsed column and the footer, then re-projects the canvas
/// at the current scroll offset. Exits within one interval of the stop
/// signal firing.
pub fn run_repaint_ticker(
    state: Arc<Mutex<BoardState>>,
    surface: Arc<dyn Surface>,
    stop: Arc<StopSignal>,
    interval: Duration,
    title: String,
    time_format: String,
) {
    while !stop.wait(interval) {
        tick_once(&state, surface.as_ref(), &title, &time_format);
    }
}

/// One repaint pass. The state lock is held only to take the snapshot; all
/// rendering and drawing happen outside it, and surface errors during
/// steady-state redraw are swallowed.
pub fn tick_once(
    state: &Mutex<BoardState>,
    surface: &dyn Surface,
    title: &str,
    time_format: &str,
) {
    let snapshot = {
        state
            .lock()
            .expect("board state lock poisoned")
            .snapshot()
    };

    let clock = render::current_clock(time_format);
    let _ = surface.draw_header(&render::header_lines(title, &clock, snapshot.screen_width));
    let _ = surface.draw_footer(&render::footer_lines(
        &snapshot.footer_view(),
        &hotkeys::controls_legend(),
    ));

    for worker in &snapshot.workers {
        let rows = render::render_worker_box(
            worker.id,
            &worker.status,
            worker.value,
            worker.total_steps,
            worker.elapsed_secs,
            worker.region.width,
            worker.region.height,
        );
        let _ = surface.draw_box(worker.region, &rows);
    }

    let _ = surface.refresh(snapshot.scroll_offset);
}

#[cfg(test)]
mod tests {
    use super::tick_once;
    use crate::dashboard::BoardState;
    use crate::layout::CanvasLayout;
    use crate::surface::FakeSurface;
    use crate::worker::WorkerRecord;
    use std::sync::Mutex;

    #[test]
    fn a_tick_redraws_chrome_every_box_and_the_canvas() {
        let surface = FakeSurface::new(80, 20);
        let mut state = BoardState::new(CanvasLayout::new(80, 16));
        for (index, id) in [3u32, 5, 8].iter().enumerate() {
            let region = state.layout.place_next(index).expect("place");
            state
                .workers
                .insert(*id, WorkerRecord::new(*id, region, "working", 10.0, 2.0));
            state.order.push(*id);
        }
        let state = Mutex::new(state);

        tick_once(&state, &surface, "demo", "%H:%M:%S");

        assert_eq!(surface.headers().len(), 1);
        assert_eq!(surface.footers().len(), 1);
        assert_eq!(surface.box_draws().len(), 3);
        assert_eq!(surface.refreshes(), vec![0]);
        assert!(surface.footers()[0][1].contains("3 Processes"));
    }

    #[test]
    fn ticks_project_the_current_scroll_offset() {
        let surface = FakeSurface::new(80, 20);
        let mut state = BoardState::new(CanvasLayout::new(80, 16));
        for index in 0..10 {
            let id = index as u32 + 1;
            let region = state.layout.place_next(index).expect("place");
            state
                .workers
                .insert(id, WorkerRecord::new(id, region, "working", 10.0, 0.0));
            state.order.push(id);
        }
        state.layout.scroll_down();
        let state = Mutex::new(state);

        tick_once(&state, &surface, "demo", "%H:%M:%S");
        assert_eq!(surface.refreshes(), vec![4]);
    }
}
