use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use progboard::config::BoardConfig;
use progboard::dashboard::Dashboard;
use progboard::surface::{FakeSurface, KeyInput, Surface};

fn test_config() -> BoardConfig {
    let mut cfg = BoardConfig::default();
    cfg.ui.tick_interval_ms = 60_000;
    cfg.input.poll_timeout_ms = 1;
    cfg
}

fn wait_until(deadline_message: &str, predicate: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !predicate() {
        assert!(Instant::now() < deadline, "timed out: {deadline_message}");
        thread::sleep(Duration::from_millis(5));
    }
}

// Ten workers on a viewport four box-rows tall: one overflow row of boxes,
// so exactly one scroll step is available in each direction.
#[test]
fn scroll_keys_move_the_viewport_and_bound_scrolls_ring_the_bell() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");
    for id in 1..=10 {
        dashboard
            .register_worker(id, "Starting", 10.0, 0.0)
            .expect("register");
    }
    dashboard.start().expect("start");

    for _ in 0..3 {
        surface.push_key(KeyInput::Char('s'));
    }
    for _ in 0..10 {
        surface.push_key(KeyInput::Char('w'));
    }

    // 1 accepted scroll down + 2 at the bottom bound, then 1 accepted
    // scroll up + 9 at the top bound.
    wait_until("bells", || surface.bell_count() == 11);
    wait_until("keys drained", || surface.pending_keys() == 0);

    assert_eq!(dashboard.snapshot().scroll_offset, 0);
    let refreshes = surface.refreshes();
    // Initial paint at offset 0, then the two accepted scrolls.
    assert_eq!(refreshes, vec![0, 4, 0]);

    dashboard.stop().expect("stop");
}

#[test]
fn unrecognized_keys_are_ignored() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");
    for id in 1..=10 {
        dashboard
            .register_worker(id, "Starting", 10.0, 0.0)
            .expect("register");
    }
    dashboard.start().expect("start");

    surface.push_key(KeyInput::Char('q'));
    surface.push_key(KeyInput::Other);
    surface.push_key(KeyInput::Char('s'));

    wait_until("keys drained", || surface.pending_keys() == 0);
    wait_until("scroll applied", || {
        dashboard.snapshot().scroll_offset == 4
    });

    assert_eq!(surface.bell_count(), 0);
    dashboard.stop().expect("stop");
}

#[test]
fn arrow_keys_mirror_the_character_bindings() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");
    for id in 1..=10 {
        dashboard
            .register_worker(id, "Starting", 10.0, 0.0)
            .expect("register");
    }
    dashboard.start().expect("start");

    surface.push_key(KeyInput::Down);
    wait_until("scrolled down", || dashboard.snapshot().scroll_offset == 4);
    surface.push_key(KeyInput::Up);
    wait_until("scrolled up", || dashboard.snapshot().scroll_offset == 0);

    dashboard.stop().expect("stop");
}
