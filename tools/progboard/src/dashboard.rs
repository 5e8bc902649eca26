use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::command::{parse_wire_line, Command, CommandSender};
use crate::config::BoardConfig;
use crate::errors::BoardError;
use crate::hotkeys;
use crate::layout::CanvasLayout;
use crate::logging::{log_event, JsonlLogger};
use crate::render::{self, FooterView};
use crate::router;
use crate::shutdown::StopSignal;
use crate::surface::{CrosstermSurface, Surface};
use crate::ticker;
use crate::viewport;
use crate::worker::{AggregateProgress, WorkerId, WorkerRecord, WorkerSnapshot};

/// Everything the three background loops share, behind one mutex. Critical
/// sections are limited to read-modify-write of the fields; drawing happens
/// outside.
pub struct BoardState {
    pub workers: HashMap<WorkerId, WorkerRecord>,
    pub order: Vec<WorkerId>,
    pub app: AggregateProgress,
    pub layout: CanvasLayout,
    pub started_at: Instant,
}

impl BoardState {
    pub fn new(layout: CanvasLayout) -> Self {
        Self {
            workers: HashMap::new(),
            order: Vec::new(),
            app: AggregateProgress::default(),
            layout,
            started_at: Instant::now(),
        }
    }

    pub fn footer_view(&self) -> FooterView {
        FooterView {
            process_count: self.order.len(),
            app: self.app.bar(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
            width: self.layout.screen_width(),
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let workers = self
            .order
            .iter()
            .filter_map(|id| self.workers.get(id))
            .map(WorkerRecord::snapshot)
            .collect();
        BoardSnapshot {
            workers,
            process_count: self.order.len(),
            app: self.app.bar(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
            scroll_offset: self.layout.scroll_offset(),
            screen_width: self.layout.screen_width(),
        }
    }
}

/// Read-only view taken under the state lock, in registration order.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub workers: Vec<WorkerSnapshot>,
    pub process_count: usize,
    pub app: Option<(f64, f64)>,
    pub elapsed_secs: f64,
    pub scroll_offset: u16,
    pub screen_width: u16,
}

impl BoardSnapshot {
    pub fn footer_view(&self) -> FooterView {
        FooterView {
            process_count: self.process_count,
            app: self.app,
            elapsed_secs: self.elapsed_secs,
            width: self.screen_width,
        }
    }
}

/// Handle returned by registration: the worker's id plus a channel clone, so
/// same-process callers can report without holding the dashboard.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    id: WorkerId,
    sender: CommandSender,
}

impl WorkerHandle {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn increment(&self, amount: f64) -> Result<(), BoardError> {
        self.sender.increment(self.id, amount)
    }

    pub fn set_status(&self, status: impl Into<String>) -> Result<(), BoardError> {
        self.sender.set_status(self.id, status)
    }

    pub fn set_steps(&self, steps: f64) -> Result<(), BoardError> {
        self.sender.set_steps(self.id, steps)
    }

    pub fn set_value(&self, value: f64) -> Result<(), BoardError> {
        self.sender.set_value(self.id, value)
    }

    pub fn reset_start(&self) -> Result<(), BoardError> {
        self.sender.reset_start(self.id)
    }
}

/// Owns the surface, the worker table, the aggregate counters and the three
/// background loops. Workers produce onto the channel; only the loops touch
/// the surface.
pub struct Dashboard {
    config: BoardConfig,
    surface: Arc<dyn Surface>,
    state: Arc<Mutex<BoardState>>,
    tx: Sender<Command>,
    rx: Option<Receiver<Command>>,
    stop: Arc<StopSignal>,
    loops: Vec<JoinHandle<()>>,
    logger: Option<JsonlLogger>,
    running: bool,
}

impl Dashboard {
    pub fn new(config: BoardConfig, logger: Option<JsonlLogger>) -> Result<Self, BoardError> {
        let surface = Arc::new(CrosstermSurface::new()?);
        Self::with_surface(config, surface, logger)
    }

    pub fn with_surface(
        config: BoardConfig,
        surface: Arc<dyn Surface>,
        logger: Option<JsonlLogger>,
    ) -> Result<Self, BoardError> {
        let (width, _) = surface.size();
        let layout = CanvasLayout::new(width, surface.viewport_rows());
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            config,
            surface,
            state: Arc::new(Mutex::new(BoardState::new(layout))),
            tx,
            rx: Some(rx),
            stop: Arc::new(StopSignal::new()),
            loops: Vec::new(),
            logger,
            running: false,
        })
    }

    /// Initializes the surface and paints once before any background loop
    /// starts reading from it.
    pub fn start(&mut self) -> Result<(), BoardError> {
        let rx = self
            .rx
            .take()
            .ok_or_else(|| BoardError::Terminal("dashboard already started".to_string()))?;
        self.surface.init()?;
        ticker::tick_once(
            &self.state,
            self.surface.as_ref(),
            &self.config.ui.title,
            &self.config.ui.time_format,
        );
        log_event(
            self.logger.as_ref(),
            "info",
            "dashboard.start",
            json!({ "title": self.config.ui.title }),
        );

        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.surface);
        let stop = Arc::clone(&self.stop);
        let logger = self.logger.clone();
        self.loops.push(thread::spawn(move || {
            router::run_update_router(rx, state, surface, stop, logger);
        }));

        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.surface);
        let stop = Arc::clone(&self.stop);
        let interval = Duration::from_millis(self.config.ui.tick_interval_ms);
        let title = self.config.ui.title.clone();
        let time_format = self.config.ui.time_format.clone();
        self.loops.push(thread::spawn(move || {
            ticker::run_repaint_ticker(state, surface, stop, interval, title, time_format);
        }));

        let state = Arc::clone(&self.state);
        let surface = Arc::clone(&self.surface);
        let stop = Arc::clone(&self.stop);
        let poll_timeout = Duration::from_millis(self.config.input.poll_timeout_ms);
        self.loops.push(thread::spawn(move || {
            viewport::run_viewport_listener(state, surface, stop, poll_timeout);
        }));

        self.running = true;
        Ok(())
    }

    /// Quiesces every background loop before the surface is torn down; a
    /// still-running loop drawing to a restored terminal is the hazard this
    /// ordering exists to prevent. Restore failure is the one propagated
    /// shutdown error.
    pub fn stop(&mut self) -> Result<(), BoardError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        self.stop.trigger();
        for handle in self.loops.drain(..) {
            let _ = handle.join();
        }
        log_event(self.logger.as_ref(), "info", "dashboard.stop", json!({}));
        self.surface.restore()
    }

    /// Allocates a region, creates the record and draws the box for the
    /// first time. An allocation failure is fatal to this registration, not
    /// to the dashboard.
    pub fn register_worker(
        &self,
        id: WorkerId,
        status: impl Into<String>,
        total_steps: f64,
        value: f64,
    ) -> Result<WorkerHandle, BoardError> {
        let (snapshot, footer) = {
            let mut state = self.state.lock().expect("board state lock poisoned");
            if state.workers.contains_key(&id) {
                return Err(BoardError::Allocation(format!(
                    "worker {id} already registered"
                )));
            }
            let index = state.order.len();
            let region = state.layout.place_next(index)?;
            self.surface.grow_canvas(state.layout.canvas_rows())?;
            let record = WorkerRecord::new(id, region, status, total_steps, value);
            let snapshot = record.snapshot();
            state.workers.insert(id, record);
            state.order.push(id);
            (snapshot, state.footer_view())
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
        self.surface.draw_box(snapshot.region, &rows)?;
        let _ = self
            .surface
            .draw_footer(&render::footer_lines(&footer, &hotkeys::controls_legend()));

        log_event(
            self.logger.as_ref(),
            "info",
            "worker.register",
            json!({ "id": id }),
        );
        Ok(WorkerHandle {
            id,
            sender: CommandSender::new(self.tx.clone()),
        })
    }

    /// Spawns the worker with piped stdout, registers it under the child's
    /// pid, and only then starts forwarding its wire lines — so the router
    /// never sees a command for a not-yet-registered spawned worker.
    pub fn spawn_and_register_worker(
        &self,
        command: &mut ProcessCommand,
        status: impl Into<String>,
        total_steps: f64,
        value: f64,
    ) -> Result<Child, BoardError> {
        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| BoardError::Process(error.to_string()))?;
        let id = child.id();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BoardError::Process("child stdout not captured".to_string()))?;

        if let Err(error) = self.register_worker(id, status, total_steps, value) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(error);
        }

        let tx = self.tx.clone();
        let logger = self.logger.clone();
        // Detached on purpose: the bridge ends at child EOF or when the
        // router goes away, whichever comes first.
        thread::spawn(move || forward_wire_lines(stdout, tx, logger));

        log_event(
            self.logger.as_ref(),
            "info",
            "worker.spawn",
            json!({ "id": id }),
        );
        Ok(child)
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender::new(self.tx.clone())
    }

    pub fn increment_app(&self, amount: f64) -> Result<(), BoardError> {
        self.sender().increment_app(amount)
    }

    pub fn set_app_steps(&self, steps: f64) -> Result<(), BoardError> {
        self.sender().set_app_steps(steps)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.state
            .lock()
            .expect("board state lock poisoned")
            .snapshot()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn forward_wire_lines(stdout: ChildStdout, tx: Sender<Command>, logger: Option<JsonlLogger>) {
    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_wire_line(&line) {
            Ok(command) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            Err(error) => log_event(
                logger.as_ref(),
                "warning",
                "bridge.malformed_command",
                json!({ "error": error.to_string() }),
            ),
        }
    }
}
