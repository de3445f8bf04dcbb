pub mod cli;
pub mod dispatch;
pub mod error;
pub mod pixels;
pub mod render;
pub mod tui;
pub mod viewport;
