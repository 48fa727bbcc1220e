//! Event handling for the console

use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use super::components::toast::ToastMessage;

/// Everything the main loop reacts to arrives as one of these
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Raw terminal input (keys, mouse, resize)
    Input(Event),
    /// Periodic wake-up used to drain page mailboxes and expire toasts
    Tick,
    /// A scheduled timer fired; the payload is its generation
    Timer(u64),
    /// Show a toast
    Notify(ToastMessage),
}

/// Posts toasts to the main loop from pages and background tasks
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<AppEvent>,
}

impl Notifier {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn notify(&self, message: ToastMessage) {
        if self.tx.send(AppEvent::Notify(message)).is_err() {
            debug!("Event loop is gone, dropping toast");
        }
    }
}

/// Read terminal input on a dedicated thread and forward it to the loop.
///
/// A `Tick` is sent every `tick_rate` whether or not input keeps arriving.
/// The thread stops once the receiving side is dropped.
pub fn spawn_input_reader(
    tx: UnboundedSender<AppEvent>,
    tick_rate: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            if tx.is_closed() {
                break;
            }
            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            match event::poll(timeout) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.send(AppEvent::Input(ev)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to poll terminal events: {}", e);
                    break;
                }
            }
            if last_tick.elapsed() >= tick_rate {
                if tx.send(AppEvent::Tick).is_err() {
                    break;
                }
                last_tick = Instant::now();
            }
        }
    })
}
