use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use crate::errors::BoardError;
use crate::layout::{Region, FOOTER_HEIGHT, HEADER_HEIGHT};

/// Terminal-neutral key event. Only scroll keys are meaningful; everything
/// else collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Up,
    Down,
    Other,
}

/// The screen capability the dashboard draws through: fixed two-row header
/// and footer chrome, a virtual canvas taller than the viewport, and timed
/// key reads. All physical writes go through one implementation so the
/// terminal has a single logical writer.
pub trait Surface: Send + Sync {
    fn init(&self) -> Result<(), BoardError>;
    /// Failures here are the one fatal shutdown error: a broken terminal is
    /// user-visible.
    fn restore(&self) -> Result<(), BoardError>;
    fn size(&self) -> (u16, u16);
    fn viewport_rows(&self) -> u16 {
        let (_, rows) = self.size();
        rows.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT)
    }
    fn grow_canvas(&self, rows: u16) -> Result<(), BoardError>;
    fn canvas_rows(&self) -> u16;
    /// Writes into the canvas; visible at the next `refresh`.
    fn draw_box(&self, region: Region, rows: &[String]) -> Result<(), BoardError>;
    fn draw_header(&self, rows: &[String]) -> Result<(), BoardError>;
    fn draw_footer(&self, rows: &[String]) -> Result<(), BoardError>;
    /// Projects the canvas slice at `scroll_offset` between header and
    /// footer.
    fn refresh(&self, scroll_offset: u16) -> Result<(), BoardError>;
    fn poll_key(&self, timeout: Duration) -> Result<Option<KeyInput>, BoardError>;
    fn bell(&self);
}

struct CanvasBuf {
    width: u16,
    rows: Vec<Vec<char>>,
}

impl CanvasBuf {
    fn new(width: u16, rows: u16) -> Self {
        Self {
            width,
            rows: vec![vec![' '; usize::from(width)]; usize::from(rows)],
        }
    }

    fn grow(&mut self, rows: u16) {
        while self.rows.len() < usize::from(rows) {
            self.rows.push(vec![' '; usize::from(self.width)]);
        }
    }

    fn blit(&mut self, region: Region, rows: &[String]) -> Result<(), BoardError> {
        if region.x + region.width > self.width
            || usize::from(region.y) + usize::from(region.height) > self.rows.len()
        {
            return Err(BoardError::Allocation(format!(
                "region ({},{}) {}x{} outside canvas {}x{}",
                region.x,
                region.y,
                region.width,
                region.height,
                self.width,
                self.rows.len()
            )));
        }
        for (offset, row) in rows.iter().take(usize::from(region.height)).enumerate() {
            let canvas_row = &mut self.rows[usize::from(region.y) + offset];
            for (column, ch) in row.chars().take(usize::from(region.width)).enumerate() {
                canvas_row[usize::from(region.x) + column] = ch;
            }
        }
        Ok(())
    }

    fn line(&self, row: usize) -> String {
        self.rows
            .get(row)
            .map(|cells| cells.iter().collect())
            .unwrap_or_else(|| " ".repeat(usize::from(self.width)))
    }
}

/// Production surface: raw mode + alternate screen via crossterm, canvas
/// kept in memory and projected on refresh. The internal lock serializes
/// both canvas mutation and stdout writes.
pub struct CrosstermSurface {
    size: (u16, u16),
    canvas: Mutex<CanvasBuf>,
}

impl CrosstermSurface {
    pub fn new() -> Result<Self, BoardError> {
        let size = crossterm::terminal::size().map_err(terminal_error)?;
        let viewport = size.1.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT);
        Ok(Self {
            size,
            canvas: Mutex::new(CanvasBuf::new(size.0, viewport)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CanvasBuf> {
        self.canvas.lock().expect("surface lock poisoned")
    }
}

impl Surface for CrosstermSurface {
    fn init(&self) -> Result<(), BoardError> {
        enable_raw_mode().map_err(terminal_error)?;
        execute!(io::stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))
            .map_err(terminal_error)
    }

    fn restore(&self) -> Result<(), BoardError> {
        disable_raw_mode().map_err(terminal_error)?;
        execute!(io::stdout(), LeaveAlternateScreen, Show).map_err(terminal_error)
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn grow_canvas(&self, rows: u16) -> Result<(), BoardError> {
        self.lock().grow(rows);
        Ok(())
    }

    fn canvas_rows(&self) -> u16 {
        self.lock().rows.len() as u16
    }

    fn draw_box(&self, region: Region, rows: &[String]) -> Result<(), BoardError> {
        self.lock().blit(region, rows)
    }

    fn draw_header(&self, rows: &[String]) -> Result<(), BoardError> {
        let _guard = self.lock();
        write_rows_at(0, rows)
    }

    fn draw_footer(&self, rows: &[String]) -> Result<(), BoardError> {
        let _guard = self.lock();
        let top = self.size.1.saturating_sub(FOOTER_HEIGHT);
        write_rows_at(top, rows)
    }

    fn refresh(&self, scroll_offset: u16) -> Result<(), BoardError> {
        let canvas = self.lock();
        let mut out = io::stdout();
        for visible_row in 0..self.viewport_rows() {
            let line = canvas.line(usize::from(scroll_offset) + usize::from(visible_row));
            queue!(out, MoveTo(0, HEADER_HEIGHT + visible_row), Print(line))
                .map_err(terminal_error)?;
        }
        out.flush().map_err(terminal_error)
    }

    fn poll_key(&self, timeout: Duration) -> Result<Option<KeyInput>, BoardError> {
        if !event::poll(timeout).map_err(terminal_error)? {
            return Ok(None);
        }
        match event::read().map_err(terminal_error)? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(match key.code {
                KeyCode::Char(c) => KeyInput::Char(c),
                KeyCode::Up => KeyInput::Up,
                KeyCode::Down => KeyInput::Down,
                _ => KeyInput::Other,
            })),
            _ => Ok(None),
        }
    }

    fn bell(&self) {
        let _guard = self.lock();
        let mut out = io::stdout();
        let _ = write!(out, "\x07");
        let _ = out.flush();
    }
}

fn write_rows_at(top: u16, rows: &[String]) -> Result<(), BoardError> {
    let mut out = io::stdout();
    for (offset, row) in rows.iter().enumerate() {
        queue!(out, MoveTo(0, top + offset as u16), Print(row)).map_err(terminal_error)?;
    }
    out.flush().map_err(terminal_error)
}

fn terminal_error(error: io::Error) -> BoardError {
    BoardError::Terminal(error.to_string())
}

/// Recording surface for tests: captures draws, replays scripted keys.
#[derive(Default)]
pub struct FakeSurface {
    size: (u16, u16),
    canvas: Mutex<Vec<Vec<char>>>,
    keys: Mutex<VecDeque<KeyInput>>,
    headers: Mutex<Vec<Vec<String>>>,
    footers: Mutex<Vec<Vec<String>>>,
    box_draws: Mutex<Vec<(Region, Vec<String>)>>,
    refreshes: Mutex<Vec<u16>>,
    bells: Mutex<usize>,
    inited: Mutex<bool>,
    restored: Mutex<bool>,
}

impl FakeSurface {
    pub fn new(width: u16, height: u16) -> Self {
        let viewport = height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT);
        Self {
            size: (width, height),
            canvas: Mutex::new(vec![
                vec![' '; usize::from(width)];
                usize::from(viewport)
            ]),
            ..Self::default()
        }
    }

    pub fn push_key(&self, key: KeyInput) {
        self.keys.lock().expect("keys lock").push_back(key);
    }

    pub fn pending_keys(&self) -> usize {
        self.keys.lock().expect("keys lock").len()
    }

    pub fn refreshes(&self) -> Vec<u16> {
        self.refreshes.lock().expect("refreshes lock").clone()
    }

    pub fn bell_count(&self) -> usize {
        *self.bells.lock().expect("bells lock")
    }

    pub fn box_draws(&self) -> Vec<(Region, Vec<String>)> {
        self.box_draws.lock().expect("box draws lock").clone()
    }

    pub fn footers(&self) -> Vec<Vec<String>> {
        self.footers.lock().expect("footers lock").clone()
    }

    pub fn headers(&self) -> Vec<Vec<String>> {
        self.headers.lock().expect("headers lock").clone()
    }

    pub fn inited(&self) -> bool {
        *self.inited.lock().expect("init lock")
    }

    pub fn restored(&self) -> bool {
        *self.restored.lock().expect("restore lock")
    }

    pub fn canvas_text(&self) -> String {
        self.canvas
            .lock()
            .expect("canvas lock")
            .iter()
            .map(|cells| cells.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Surface for FakeSurface {
    fn init(&self) -> Result<(), BoardError> {
        *self.inited.lock().expect("init lock") = true;
        Ok(())
    }

    fn restore(&self) -> Result<(), BoardError> {
        *self.restored.lock().expect("restore lock") = true;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn grow_canvas(&self, rows: u16) -> Result<(), BoardError> {
        let mut canvas = self.canvas.lock().expect("canvas lock");
        while canvas.len() < usize::from(rows) {
            canvas.push(vec![' '; usize::from(self.size.0)]);
        }
        Ok(())
    }

    fn canvas_rows(&self) -> u16 {
        self.canvas.lock().expect("canvas lock").len() as u16
    }

    fn draw_box(&self, region: Region, rows: &[String]) -> Result<(), BoardError> {
        {
            let canvas = self.canvas.lock().expect("canvas lock");
            if region.x + region.width > self.size.0
                || usize::from(region.y) + usize::from(region.height) > canvas.len()
            {
                return Err(BoardError::Allocation(format!(
                    "region ({},{}) outside canvas",
                    region.x, region.y
                )));
            }
        }
        let mut canvas = self.canvas.lock().expect("canvas lock");
        for (offset, row) in rows.iter().take(usize::from(region.height)).enumerate() {
            let canvas_row = &mut canvas[usize::from(region.y) + offset];
            for (column, ch) in row.chars().take(usize::from(region.width)).enumerate() {
                canvas_row[usize::from(region.x) + column] = ch;
            }
        }
        drop(canvas);
        self.box_draws
            .lock()
            .expect("box draws lock")
            .push((region, rows.to_vec()));
        Ok(())
    }

    fn draw_header(&self, rows: &[String]) -> Result<(), BoardError> {
        self.headers
            .lock()
            .expect("headers lock")
            .push(rows.to_vec());
        Ok(())
    }

    fn draw_footer(&self, rows: &[String]) -> Result<(), BoardError> {
        self.footers
            .lock()
            .expect("footers lock")
            .push(rows.to_vec());
        Ok(())
    }

    fn refresh(&self, scroll_offset: u16) -> Result<(), BoardError> {
        self.refreshes
            .lock()
            .expect("refreshes lock")
            .push(scroll_offset);
        Ok(())
    }

    fn poll_key(&self, timeout: Duration) -> Result<Option<KeyInput>, BoardError> {
        let next = self.keys.lock().expect("keys lock").pop_front();
        if next.is_none() {
            thread::sleep(timeout);
        }
        Ok(next)
    }

    fn bell(&self) {
        *self.bells.lock().expect("bells lock") += 1;
    }
}
