//! Event bus for ocrfix.
//!
//! All user input, timer ticks, and gateway replies are normalised into
//! a single `AppEvent` enum and sent over a tokio unbounded MPSC channel. The
//! main loop receives from this channel and dispatches accordingly.
//!
//! Two independent intervals drive the render and logic cycles: the render interval
//! (33 ms, about 30 FPS) triggers a `terminal.draw()` call and the tick interval
//! (250 ms) advances the busy spinner and the automatic fetch retry.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use ocrfix_core::GatewayReply;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`] to avoid
    /// double-firing on Windows, which synthesises both press and release for
    /// every keystroke.
    Key(KeyEvent),
    /// A mouse event from the terminal (click, scroll, move).
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Logic tick for state updates (4 Hz / 250 ms).
    Tick,
    /// Render tick: triggers a `terminal.draw()` call.
    Render,
    /// Outcome of a gateway command, forwarded by the gateway worker.
    Gateway(Box<GatewayReply>),
    /// Quit signal.
    Quit,
}

/// Wraps gateway replies into [`AppEvent::Gateway`] for the worker's delivery callback.
pub fn gateway_sink(tx: mpsc::UnboundedSender<AppEvent>) -> impl Fn(GatewayReply) + Send + 'static {
    move |reply| {
        let _ = tx.send(AppEvent::Gateway(Box::new(reply)));
    }
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and distributed to background tasks;
/// the receiver (`rx`) is owned by the main event loop.
pub struct EventHandler {
    /// Send half; clone this for each background task that produces events.
    pub tx: mpsc::UnboundedSender<AppEvent>,
    /// Receive half, owned by the main loop. Call `.recv().await` to block
    /// until the next event.
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    /// Creates a new `EventHandler` with a fresh unbounded channel.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background tokio task that drives the unified event channel.
///
/// The task runs until the `tx` sender is dropped (i.e., the `EventHandler` is
/// dropped). Two fully independent `tokio::time::interval` timers drive the
/// render and logic cycles; crossterm input is polled via `EventStream`.
///
/// `reader.next().fuse()` keeps `tokio::select!` from polling a finished stream.
/// Once the receiver is gone every send fails and the task stops.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    if tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                }
                _ = render_tick => {
                    if tx.send(AppEvent::Render).is_err() {
                        break;
                    }
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => {
                            if key.kind == KeyEventKind::Press {
                                let _ = tx.send(AppEvent::Key(key));
                            }
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
