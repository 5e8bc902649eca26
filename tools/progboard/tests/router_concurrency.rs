use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use progboard::config::BoardConfig;
use progboard::dashboard::{BoardSnapshot, Dashboard};
use progboard::surface::{FakeSurface, Surface};

fn test_config() -> BoardConfig {
    let mut cfg = BoardConfig::default();
    cfg.ui.tick_interval_ms = 60_000;
    cfg.input.poll_timeout_ms = 1;
    cfg
}

fn wait_for(dashboard: &Dashboard, predicate: impl Fn(&BoardSnapshot) -> bool) -> BoardSnapshot {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let snapshot = dashboard.snapshot();
        if predicate(&snapshot) {
            return snapshot;
        }
        assert!(
            Instant::now() < deadline,
            "router did not converge: {snapshot:?}"
        );
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn concurrent_producers_lose_no_increments() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");

    const PRODUCERS: u32 = 4;
    const INCREMENTS: u32 = 50;
    for id in 1..=PRODUCERS {
        dashboard
            .register_worker(id, "Starting", f64::from(INCREMENTS) + 10.0, 0.0)
            .expect("register");
    }
    dashboard.start().expect("start");

    let producers = (1..=PRODUCERS)
        .map(|id| {
            let sender = dashboard.sender();
            thread::spawn(move || {
                for _ in 0..INCREMENTS {
                    sender.increment(id, 1.0).expect("send");
                }
            })
        })
        .collect::<Vec<_>>();
    for producer in producers {
        producer.join().expect("join producer");
    }

    let snapshot = wait_for(&dashboard, |snapshot| {
        snapshot
            .workers
            .iter()
            .all(|worker| worker.value == f64::from(INCREMENTS))
    });
    for worker in &snapshot.workers {
        assert_eq!(worker.value, f64::from(INCREMENTS));
    }

    dashboard.stop().expect("stop");
}

#[test]
fn increments_past_the_total_clamp_instead_of_overflowing() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");

    let handle = dashboard
        .register_worker(77, "Starting", 10.0, 0.0)
        .expect("register");
    dashboard.start().expect("start");

    handle.increment(7.0).expect("send");
    handle.increment(7.0).expect("send");

    let snapshot = wait_for(&dashboard, |snapshot| snapshot.workers[0].value >= 10.0);
    assert_eq!(snapshot.workers[0].value, 10.0);

    dashboard.stop().expect("stop");
}

#[test]
fn interleaved_app_increments_linearize() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");
    dashboard.start().expect("start");

    dashboard.set_app_steps(50.0).expect("send");
    let first = dashboard.sender();
    let second = dashboard.sender();
    let one = thread::spawn(move || {
        for _ in 0..2 {
            first.increment_app(1.0).expect("send");
        }
    });
    let two = thread::spawn(move || {
        for _ in 0..3 {
            second.increment_app(1.0).expect("send");
        }
    });
    one.join().expect("join");
    two.join().expect("join");

    let snapshot = wait_for(&dashboard, |snapshot| snapshot.app == Some((5.0, 50.0)));
    assert_eq!(snapshot.app, Some((5.0, 50.0)));

    dashboard.stop().expect("stop");
}

#[test]
fn steps_updates_apply_in_arrival_order() {
    let surface = Arc::new(FakeSurface::new(80, 20));
    let mut dashboard =
        Dashboard::with_surface(test_config(), Arc::clone(&surface) as Arc<dyn Surface>, None)
            .expect("dashboard");

    let handle = dashboard
        .register_worker(9, "Starting", 100.0, 0.0)
        .expect("register");
    dashboard.start().expect("start");

    handle.set_value(80.0).expect("send");
    handle.set_steps(50.0).expect("send");

    let snapshot = wait_for(&dashboard, |snapshot| {
        snapshot.workers[0].total_steps == 50.0
    });
    // The later, lower total re-clamped the earlier value.
    assert_eq!(snapshot.workers[0].value, 50.0);

    dashboard.stop().expect("stop");
}
