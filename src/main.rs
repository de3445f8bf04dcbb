use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::EnvFilter;

use glyphview::cli::Args;
use glyphview::dispatch::{self, QUEUE_CAPACITY, Shutdown, producers};
use glyphview::error::ViewError;
use glyphview::pixels::{self, Image};
use glyphview::tui::{self, CrosstermInput, ViewerState};
use glyphview::viewport::Effect;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let frames = pixels::load(&args.path)
        .with_context(|| format!("load image {}", args.path.display()))?;

    enable_raw_mode()
        .map_err(ViewError::TerminalInit)
        .context("enable raw mode")?;
    if let Err(err) = std::io::stdout().execute(EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(ViewError::TerminalInit(err)).context("enter alternate screen");
    }

    let result = run_app(frames, &args);
    let restored = tui::restore_terminal();
    // A failure inside the viewer outranks one while restoring the terminal.
    result.and(restored)
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let Some(path) = args.log_file.as_ref() else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run_app(frames: Vec<Image>, args: &Args) -> anyhow::Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(ViewError::TerminalInit)
        .context("create terminal")?;

    let console = crossterm::terminal::size().context("query terminal size")?;
    let mut state = ViewerState::new(frames, args.glyph_style(), console)?;
    tracing::info!(
        path = %args.path.display(),
        frames = state.frame_count(),
        ?console,
        "viewer started"
    );
    dispatch::apply(Effect::Redraw, &state, &mut terminal)?;

    let (sender, receiver) = dispatch::queue(QUEUE_CAPACITY);
    receiver.record_console(console.0, console.1);
    let shutdown = Shutdown::default();

    // Never joined: the input thread may be parked in a blocking read.
    producers::spawn_input(CrosstermInput, sender.clone(), shutdown.clone());
    producers::spawn_resize_poller(
        sender.clone(),
        shutdown.clone(),
        args.resize_poll(),
        crossterm::terminal::size,
    );
    producers::spawn_animation(
        sender,
        shutdown.clone(),
        state.frame_count(),
        args.frame_interval(),
    );

    let result = dispatch::run(&mut state, &mut terminal, &receiver, &shutdown);
    shutdown.trigger();
    result
}
