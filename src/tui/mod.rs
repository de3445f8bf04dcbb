use std::io;

use anyhow::Context;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use ratatui::{Frame, layout::Position};

use crate::dispatch::Command;
use crate::dispatch::producers::InputSource;
use crate::error::{Result, ViewError};
use crate::pixels::Image;
use crate::render::{BlockRenderer, GlyphStyle};
use crate::viewport::{Direction, Effect, Viewport};

/// Everything the consumer loop owns: the decoded frames, which one is on
/// screen, and the viewport over them.
#[derive(Debug)]
pub struct ViewerState {
    frames: Vec<Image>,
    current: usize,
    viewport: Viewport,
    style: GlyphStyle,
    marker: bool,
}

impl ViewerState {
    pub fn new(frames: Vec<Image>, style: GlyphStyle, console: (u16, u16)) -> Result<Self> {
        let first = frames.first().ok_or(ViewError::EmptyImage)?;
        let viewport = Viewport::new(first.width(), first.height(), console.0, console.1);
        Ok(Self {
            frames,
            current: 0,
            viewport,
            style,
            marker: false,
        })
    }

    pub fn handle(&mut self, command: Command) -> Effect {
        match command {
            Command::Resize { w, h } => self.viewport.on_resize(w, h),
            Command::Pan(direction) => match self.viewport.move_cursor(direction) {
                // The marker follows the cursor, so it needs a repaint.
                Effect::MoveCursor { .. } if self.marker => Effect::Refresh,
                effect => effect,
            },
            Command::ZoomIn => self.viewport.zoom_in(),
            Command::ZoomOut => self.viewport.zoom_out(),
            Command::ToggleMarker => {
                self.marker = !self.marker;
                Effect::Refresh
            }
            Command::Render { frame } => {
                self.current = frame % self.frames.len();
                Effect::Refresh
            }
        }
    }

    pub fn current_frame(&self) -> &Image {
        &self.frames[self.current]
    }

    pub fn frame_index(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn marker_visible(&self) -> bool {
        self.marker
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Space,
    Quit,
}

impl KeyInput {
    /// The queued command for this key. Quit has none; it is signalled
    /// directly.
    pub fn command(self) -> Option<Command> {
        match self {
            KeyInput::Up => Some(Command::Pan(Direction::Up)),
            KeyInput::Down => Some(Command::Pan(Direction::Down)),
            KeyInput::Left => Some(Command::Pan(Direction::Left)),
            KeyInput::Right => Some(Command::Pan(Direction::Right)),
            KeyInput::Enter => Some(Command::ZoomIn),
            KeyInput::Esc => Some(Command::ZoomOut),
            KeyInput::Space => Some(Command::ToggleMarker),
            KeyInput::Quit => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyInput),
    Resize(u16, u16),
}

pub fn map_key(key: KeyEvent) -> Option<KeyInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyInput::Quit);
    }
    match key.code {
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Char(' ') => Some(KeyInput::Space),
        KeyCode::Char('q') => Some(KeyInput::Quit),
        _ => None,
    }
}

pub fn map_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => map_key(key).map(InputEvent::Key),
        Event::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        _ => None,
    }
}

/// Blocking reads from the crossterm event stream.
pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn next_event(&mut self) -> io::Result<Option<InputEvent>> {
        Ok(map_event(event::read()?))
    }
}

pub fn view(frame: &mut Frame, state: &ViewerState) {
    let renderer = BlockRenderer::new(state.current_frame(), &state.viewport, state.style)
        .with_marker(state.marker);
    frame.render_widget(renderer, frame.area());
    // Park the native cursor so the terminal's own tracking never drifts.
    frame.set_cursor_position(Position { x: 0, y: 0 });
}

/// Undo raw mode and the alternate screen. Both steps always run; the first
/// failure is reported.
pub fn restore_terminal() -> anyhow::Result<()> {
    restore(
        || io::stdout().execute(LeaveAlternateScreen).map(|_| ()),
        disable_raw_mode,
    )
}

fn restore(
    leave_screen: impl FnOnce() -> io::Result<()>,
    disable_raw: impl FnOnce() -> io::Result<()>,
) -> anyhow::Result<()> {
    let left = leave_screen().context("leave alternate screen");
    let raw = disable_raw().context("disable raw mode");
    left.and(raw)
}
