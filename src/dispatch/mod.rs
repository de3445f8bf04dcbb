//! Single-consumer command queue.
//!
//! Producers (input, resize poller, animation ticker) run on their own threads
//! and only ever enqueue [`Command`]s. The consumer loop in [`run`] is the one
//! place where viewer state changes and where the terminal is drawn, one
//! command at a time in enqueue order.

pub mod producers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use anyhow::Context;
use ratatui::{Terminal, backend::Backend, layout::Position};

use crate::tui::{self, ViewerState};
use crate::viewport::{Direction, Effect};

pub const QUEUE_CAPACITY: usize = 64;

/// How often an idle consumer wakes up to check for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Resize { w: u16, h: u16 },
    Pan(Direction),
    ZoomIn,
    ZoomOut,
    ToggleMarker,
    Render { frame: usize },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Offer {
    Queued,
    Dropped,
    Disconnected,
}

/// Producer side of the queue. Cheap to clone, one per producer.
#[derive(Clone)]
pub struct CommandSender {
    tx: SyncSender<Command>,
    resize_pending: Arc<AtomicBool>,
    console: Arc<AtomicU32>,
}

pub struct CommandReceiver {
    rx: Receiver<Command>,
    resize_pending: Arc<AtomicBool>,
    console: Arc<AtomicU32>,
}

pub fn queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    let resize_pending = Arc::new(AtomicBool::new(false));
    let console = Arc::new(AtomicU32::new(0));
    (
        CommandSender {
            tx,
            resize_pending: resize_pending.clone(),
            console: console.clone(),
        },
        CommandReceiver {
            rx,
            resize_pending,
            console,
        },
    )
}

fn pack(w: u16, h: u16) -> u32 {
    (u32::from(w) << 16) | u32::from(h)
}

fn unpack(packed: u32) -> (u16, u16) {
    ((packed >> 16) as u16, (packed & 0xffff) as u16)
}

impl CommandSender {
    /// Enqueue, waiting for room. Returns `false` once the consumer is gone.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Enqueue without waiting; a full queue drops the command.
    pub fn offer(&self, command: Command) -> Offer {
        match self.tx.try_send(command) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(dropped)) => {
                tracing::trace!(?dropped, "queue full, dropping command");
                Offer::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Offer::Disconnected,
        }
    }

    /// Like [`offer`](Self::offer), but also drops the resize while an earlier
    /// one is still waiting in the queue.
    pub fn offer_resize(&self, w: u16, h: u16) -> Offer {
        if self.resize_pending.swap(true, Ordering::AcqRel) {
            return Offer::Dropped;
        }
        let offer = self.offer(Command::Resize { w, h });
        if offer != Offer::Queued {
            self.resize_pending.store(false, Ordering::Release);
        }
        offer
    }

    /// The console size of the last resize the consumer took off the queue,
    /// whichever producer sent it.
    pub fn applied_console(&self) -> (u16, u16) {
        unpack(self.console.load(Ordering::Acquire))
    }
}

impl CommandReceiver {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Command, RecvTimeoutError> {
        let command = self.rx.recv_timeout(timeout)?;
        if let Command::Resize { w, h } = command {
            self.record_console(w, h);
            self.resize_pending.store(false, Ordering::Release);
        }
        Ok(command)
    }

    /// Seed the applied console size before any resize has been queued.
    pub fn record_console(&self, w: u16, h: u16) {
        self.console.store(pack(w, h), Ordering::Release);
    }
}

/// Process-wide quit flag, set by the input producer and observed by the
/// consumer before every command.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Where frames end up. Implemented for any ratatui [`Terminal`].
pub trait Surface {
    fn draw(&mut self, state: &ViewerState) -> anyhow::Result<()>;
    fn clear(&mut self) -> anyhow::Result<()>;
    fn place_cursor(&mut self, x: u16, y: u16) -> anyhow::Result<()>;
}

impl<B> Surface for Terminal<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    fn draw(&mut self, state: &ViewerState) -> anyhow::Result<()> {
        Terminal::draw(self, |frame| tui::view(frame, state)).context("draw frame")?;
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        Terminal::clear(self).context("clear terminal")
    }

    fn place_cursor(&mut self, x: u16, y: u16) -> anyhow::Result<()> {
        self.set_cursor_position(Position { x, y }).context("move cursor")?;
        self.show_cursor().context("show cursor")
    }
}

/// Carry out what a handled command asked of the surface.
pub fn apply<S: Surface>(
    effect: Effect,
    state: &ViewerState,
    surface: &mut S,
) -> anyhow::Result<()> {
    match effect {
        Effect::None => Ok(()),
        Effect::MoveCursor { x, y } => surface.place_cursor(x, y),
        Effect::Refresh => surface.draw(state),
        Effect::Redraw => {
            surface.clear()?;
            surface.draw(state)
        }
    }
}

/// The consumer loop. Returns when shutdown is triggered, when every producer
/// has hung up, or when the surface fails.
pub fn run<S: Surface>(
    state: &mut ViewerState,
    surface: &mut S,
    commands: &CommandReceiver,
    shutdown: &Shutdown,
) -> anyhow::Result<()> {
    let mut handled: u64 = 0;
    loop {
        if shutdown.is_triggered() {
            tracing::debug!(handled, "shutdown requested");
            break;
        }
        let command = match commands.recv_timeout(SHUTDOWN_POLL) {
            Ok(command) => command,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!(handled, "all producers hung up");
                break;
            }
        };
        if shutdown.is_triggered() {
            break;
        }
        tracing::trace!(?command, "dispatch");
        let effect = state.handle(command);
        apply(effect, state, surface)?;
        handled += 1;
    }
    Ok(())
}
