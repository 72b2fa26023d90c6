use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use log::info;

use cubestory::{Cube, ScrollLock, SetIndex};

use crate::graphics::{draw_frame, Canvas, FaceGeometry};
use crate::vertex::Projection;

/// Redraw interval while idle
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Terminal rows are about twice as tall as columns are wide
const ROW_ASPECT: f64 = 2.0;

/// A drag sample older than this no longer counts towards release velocity
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Holds the mouse wheel while the cube turns.
///
/// The wheel is the terminal's stand-in for page scrolling: it steps through
/// stories unless a drag or a transition is in progress.
#[derive(Debug, Clone, Default)]
pub struct WheelLock(Rc<Cell<bool>>);

impl WheelLock {
    pub fn is_locked(&self) -> bool {
        self.0.get()
    }
}

impl ScrollLock for WheelLock {
    fn lock(&mut self) {
        self.0.set(true);
    }

    fn unlock(&mut self) {
        self.0.set(false);
    }
}

/// Placement of the cube inside the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u16,
    pub rows: u16,
}

impl Layout {
    pub fn new(cols: u16, rows: u16) -> Self {
        Layout {
            cols: cols.max(8),
            rows: rows.max(4),
        }
    }

    /// Rows available to the cube; the last row is the status line
    pub fn canvas_rows(&self) -> u16 {
        self.rows - 1
    }

    /// Portrait pane size in column units for a fresh cube
    pub fn pane_size(&self) -> (f64, f64) {
        let height = f64::from(self.canvas_rows()) * ROW_ASPECT * 0.8;
        let width = (f64::from(self.cols) / 3.0).min(height * 0.6).max(4.0);
        (width, height)
    }

    pub fn projection(&self, geometry: FaceGeometry, perspective: f64) -> Projection {
        Projection {
            center: [
                f64::from(self.cols) / 2.0,
                f64::from(self.canvas_rows()) / 2.0,
            ],
            perspective,
            depth_offset: geometry.width / 2.0,
            scale: 1.0,
            row_aspect: ROW_ASPECT,
        }
    }
}

/// Pointer travel since the button went down, in pane units
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragTracker {
    origin: (u16, u16),
    dx: f64,
    dy: f64,
    /// Horizontal speed in columns per millisecond
    velocity: f64,
    sampled_at: Instant,
}

impl DragTracker {
    fn new(column: u16, row: u16, now: Instant) -> Self {
        DragTracker {
            origin: (column, row),
            dx: 0.0,
            dy: 0.0,
            velocity: 0.0,
            sampled_at: now,
        }
    }

    fn update(&mut self, column: u16, row: u16, now: Instant) {
        let dx = f64::from(column) - f64::from(self.origin.0);
        let dy = (f64::from(row) - f64::from(self.origin.1)) * ROW_ASPECT;
        let elapsed = now.saturating_duration_since(self.sampled_at).as_secs_f64() * 1000.0;
        if elapsed > 0.0 {
            self.velocity = (dx - self.dx) / elapsed;
        }
        self.dx = dx;
        self.dy = dy;
        self.sampled_at = now;
    }

    fn release_velocity(&self, now: Instant) -> f64 {
        if now.saturating_duration_since(self.sampled_at) > VELOCITY_WINDOW {
            0.0
        } else {
            self.velocity
        }
    }
}

/// Restores the terminal however the widget exits
struct TerminalGuard;

impl TerminalGuard {
    fn enter(stdout: &mut io::Stdout) -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Terminal front-end: feeds input into the cube and applies its commits
pub struct CubeWidget {
    cube: Cube<String>,
    layout: Layout,
    canvas: Canvas,
    wheel: WheelLock,
    drag: Option<DragTracker>,
    home: i64,
    debug: bool,
    quit: bool,
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl CubeWidget {
    pub fn new(cube: Cube<String>, layout: Layout, wheel: WheelLock, debug: bool) -> Self {
        let home = cube.index();
        CubeWidget {
            cube,
            canvas: Canvas::new(usize::from(layout.cols), usize::from(layout.canvas_rows())),
            layout,
            wheel,
            drag: None,
            home,
            debug,
            quit: false,
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        let _guard = TerminalGuard::enter(&mut stdout)?;
        execute!(stdout, Clear(ClearType::All))?;

        while !self.quit {
            if event::poll(FRAME_INTERVAL)? {
                self.handle_event(event::read()?, Instant::now());
                while event::poll(Duration::ZERO)? {
                    self.handle_event(event::read()?, Instant::now());
                }
            }
            self.apply_commits();
            self.paint(&mut stdout)?;
        }
        Ok(())
    }

    /// Acts as the owner of the active index: every commit is accepted.
    fn apply_commits(&mut self) {
        for commit in self.cube.take_commits() {
            self.cube.set_index(commit.to);
        }
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(cols, rows) => {
                self.layout = Layout::new(cols, rows);
                self.canvas.resize(
                    usize::from(self.layout.cols),
                    usize::from(self.layout.canvas_rows()),
                );
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('d') | KeyCode::Char('D') => self.debug = !self.debug,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                self.cube.request_next();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.cube.request_previous();
            }
            KeyCode::Home | KeyCode::Char('g') => {
                info!("jumping back to story {}", self.home);
                self.cube.set_index(SetIndex::immediate(self.home));
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag = Some(DragTracker::new(mouse.column, mouse.row, now));
                self.cube.drag_start();
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.update(mouse.column, mouse.row, now);
                    self.cube.drag_move(drag.dx, drag.dy);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(drag) = self.drag.take() {
                    self.cube.drag_end(drag.dx, drag.release_velocity(now));
                }
            }
            MouseEventKind::ScrollDown | MouseEventKind::ScrollRight => {
                if !self.wheel.is_locked() {
                    self.cube.request_next();
                }
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollLeft => {
                if !self.wheel.is_locked() {
                    self.cube.request_previous();
                }
            }
            _ => {}
        }
    }

    fn paint(&mut self, stdout: &mut io::Stdout) -> io::Result<()> {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let frame = self.cube.on_frame_at(now);
        let config = self.cube.config();
        let geometry = FaceGeometry {
            width: config.width,
            height: config.height,
        };
        let projection = self.layout.projection(geometry, config.perspective);
        draw_frame(&mut self.canvas, &frame, geometry, &projection);

        if self.debug {
            let lines = [
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                format!("Rotation: {:.2}", frame.rotation),
                format!("Scale: {:.3}", frame.scale),
                format!("Phase: {:?}", frame.phase),
                format!("Wheel locked: {}", self.wheel.is_locked()),
                format!("FPS: {:.2}", self.fps),
            ];
            for (row, line) in lines.iter().enumerate() {
                self.canvas.draw_text(1, row as isize, line);
            }
        }

        for (row, line) in self.canvas.rows().enumerate() {
            queue!(stdout, MoveTo(0, row as u16), Print(line))?;
        }
        let status = format!(
            " story {}  <-/-> or drag to turn, g home, d debug, q quit",
            self.cube.index()
        );
        let status: String = status
            .chars()
            .chain(std::iter::repeat(' '))
            .take(usize::from(self.layout.cols))
            .collect();
        queue!(stdout, MoveTo(0, self.layout.canvas_rows()), Print(status))?;
        stdout.flush()
    }
}
