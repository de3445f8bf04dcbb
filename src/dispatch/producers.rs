//! Producer threads feeding the command queue.
//!
//! Each producer owns nothing but its sender and a clone of the shutdown
//! flag. Input is enqueued with blocking sends; resize and animation ticks are
//! offered and may be dropped when the queue is full.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{Command, CommandSender, Offer, Shutdown};
use crate::tui::{InputEvent, KeyInput};

/// A blocking source of terminal input.
pub trait InputSource: Send + 'static {
    /// Wait for the next event; `None` for events with no binding.
    fn next_event(&mut self) -> io::Result<Option<InputEvent>>;
}

/// Forward key presses until quit. Quit bypasses the queue and flips the
/// shutdown flag directly.
pub fn spawn_input<I: InputSource>(
    mut source: I,
    sender: CommandSender,
    shutdown: Shutdown,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::debug!("input producer started");
        loop {
            if shutdown.is_triggered() {
                break;
            }
            match source.next_event() {
                Ok(Some(InputEvent::Key(KeyInput::Quit))) => {
                    tracing::debug!("quit requested");
                    shutdown.trigger();
                    break;
                }
                Ok(Some(InputEvent::Key(key))) => {
                    if let Some(command) = key.command() {
                        if !sender.send(command) {
                            break;
                        }
                    }
                }
                Ok(Some(InputEvent::Resize(w, h))) => {
                    if sender.offer_resize(w, h) == Offer::Disconnected {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%err, "reading terminal input failed, shutting down");
                    shutdown.trigger();
                    break;
                }
            }
        }
    })
}

/// Poll the console size every `interval` and offer a resize when it differs
/// from the size the consumer last applied. Resizes reported by the input
/// stream count too, so the same size is never applied twice.
pub fn spawn_resize_poller<F>(
    sender: CommandSender,
    shutdown: Shutdown,
    interval: Duration,
    mut size: F,
) -> JoinHandle<()>
where
    F: FnMut() -> io::Result<(u16, u16)> + Send + 'static,
{
    thread::spawn(move || {
        loop {
            thread::sleep(interval);
            if shutdown.is_triggered() {
                break;
            }
            let current = match size() {
                Ok(current) => current,
                Err(err) => {
                    tracing::warn!(%err, "querying terminal size failed");
                    continue;
                }
            };
            let applied = sender.applied_console();
            if current == applied {
                continue;
            }
            match sender.offer_resize(current.0, current.1) {
                Offer::Queued => tracing::debug!(?applied, ?current, "terminal resized"),
                // A resize is already waiting, or the queue is full; the next
                // tick compares against whatever the consumer applied by then.
                Offer::Dropped => {}
                Offer::Disconnected => break,
            }
        }
    })
}

/// Loop over the frames forever, one render tick per `interval`. A single
/// frame gets exactly one render.
pub fn spawn_animation(
    sender: CommandSender,
    shutdown: Shutdown,
    frame_count: usize,
    interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if frame_count <= 1 {
            sender.send(Command::Render { frame: 0 });
            return;
        }
        tracing::debug!(frame_count, ?interval, "animation started");
        let mut dropped: u64 = 0;
        for frame in (0..frame_count).cycle() {
            if shutdown.is_triggered() {
                break;
            }
            match sender.offer(Command::Render { frame }) {
                Offer::Queued => {}
                Offer::Dropped => dropped += 1,
                Offer::Disconnected => break,
            }
            thread::sleep(interval);
        }
        tracing::debug!(dropped, "animation stopped");
    })
}
