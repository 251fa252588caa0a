use std::thread::JoinHandle;

use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::{Event, Platform};

/// Creates the single cancellation signal of a visible session.
pub(crate) fn cancellation() -> (Canceller, CancelSignal) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (Canceller { _tx: tx }, CancelSignal { rx })
}

/// Sending half of a session's cancellation signal.
///
/// Cancelling consumes it, so a session broadcasts exactly once.
pub(crate) struct Canceller {
    _tx: Sender<()>,
}

impl Canceller {
    pub(crate) fn cancel(self) {
        drop(self);
    }
}

/// Listening half; cloned once per loop.
#[derive(Clone)]
pub(crate) struct CancelSignal {
    rx: Receiver<()>,
}

impl CancelSignal {
    /// True once the [`Canceller`] has been consumed or dropped.
    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Running loops of one visible session.
pub(crate) struct Session {
    canceller: Canceller,
    update: JoinHandle<u64>,
    draw: JoinHandle<Result<u64>>,
}

impl Session {
    pub(crate) fn new(
        canceller: Canceller,
        update: JoinHandle<u64>,
        draw: JoinHandle<Result<u64>>,
    ) -> Self {
        Self { canceller, update, draw }
    }

    /// Broadcasts cancellation and joins both loops.
    ///
    /// Returns the first loop failure (draw error or panic) after both joined.
    pub(crate) fn end(self) -> Result<()> {
        let Session { canceller, update, draw } = self;
        canceller.cancel();

        let update = update.join();
        let draw = draw.join();

        let updates = update.map_err(|_| anyhow!("update loop panicked"))?;
        let frames = draw.map_err(|_| anyhow!("draw loop panicked"))??;

        log::debug!("session ended after {updates} updates and {frames} frames");
        Ok(())
    }
}

/// Posts [`Event::Hidden`] if the owning loop thread unwinds, so a panic in
/// user code still closes the window through the normal teardown.
pub(crate) struct HideOnUnwind<'a, P: Platform> {
    platform: &'a P,
    task: &'static str,
}

impl<'a, P: Platform> HideOnUnwind<'a, P> {
    pub(crate) fn new(platform: &'a P, task: &'static str) -> Self {
        Self { platform, task }
    }
}

impl<P: Platform> Drop for HideOnUnwind<'_, P> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            log::error!("{} loop panicked; closing window", self.task);
            self.platform.post(Event::Hidden);
        }
    }
}
