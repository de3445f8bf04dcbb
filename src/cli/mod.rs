use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::render::{DrawMode, GlyphStyle};

#[derive(Debug, Parser)]
#[command(name = "glyphview", about = "Terminal image viewer with zoom and pan")]
#[command(version)]
#[command(after_help = "KEYS:
    arrows   move the cursor (zoomed out) or pan (zoomed in)
    enter    zoom in at the cursor
    esc      zoom out
    space    toggle the cursor marker
    q, ^C    quit")]
pub struct Args {
    /// Image to display (PNG, JPEG, BMP, or animated GIF)
    pub path: PathBuf,

    /// Character drawn in every cell
    #[arg(short, long, default_value_t = '$')]
    pub symbol: char,

    /// Color the symbol instead of the cell background
    #[arg(long)]
    pub fg: bool,

    /// Delay between animation frames, in milliseconds
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    pub frame_interval_ms: u64,

    /// How often the terminal size is polled, in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub resize_poll_ms: u64,

    /// Write logs to this file (the terminal itself is busy drawing)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn glyph_style(&self) -> GlyphStyle {
        GlyphStyle {
            symbol: self.symbol,
            mode: if self.fg {
                DrawMode::Foreground
            } else {
                DrawMode::Background
            },
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn resize_poll(&self) -> Duration {
        Duration::from_millis(self.resize_poll_ms)
    }
}
