//! Per-page reply channels for background backend calls

use std::future::Future;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Collects the results of tasks a page spawned.
///
/// Pages drain their mailbox on every tick. `reset` swaps in a fresh channel,
/// so anything still in flight from before the reset is dropped on arrival.
pub struct Mailbox<M> {
    tx: UnboundedSender<M>,
    rx: UnboundedReceiver<M>,
}

impl<M: Send + 'static> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> Mailbox<M> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Run `task` in the background and deliver its output here
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = M> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let reply = task.await;
            if tx.send(reply).is_err() {
                debug!("Dropping reply for a page that is no longer mounted");
            }
        });
    }

    /// Forget everything in flight
    pub fn reset(&mut self) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tx = tx;
        self.rx = rx;
    }

    /// Replies that arrived since the last drain, in arrival order
    pub fn drain(&mut self) -> Vec<M> {
        let mut replies = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(reply) => replies.push(reply),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        replies
    }
}
