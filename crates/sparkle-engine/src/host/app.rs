use crate::device::Gpu;

use super::{Context, Graphics};

/// Application contract implemented by host users.
///
/// `start` and `stop` run on the dispatcher thread, once per visible session.
/// `update` runs on the update thread, repeatedly, between them.
pub trait App<G: Graphics = Gpu>: Send + 'static {
    /// Called after the graphics context is available, before any update or
    /// draw iteration.
    fn start(&mut self, ctx: &Context<G>) {
        let _ = ctx;
    }

    /// Called after both loops stopped, while the graphics context is still set.
    fn stop(&mut self, ctx: &Context<G>) {
        let _ = ctx;
    }

    /// Called as often as the update pacing allows.
    fn update(&mut self, ctx: &Context<G>);
}

/// [`App`] built from three closures.
pub struct Callbacks<S, T, U> {
    start: S,
    stop: T,
    update: U,
}

impl<S, T, U> Callbacks<S, T, U> {
    pub fn new(start: S, stop: T, update: U) -> Self {
        Self { start, stop, update }
    }
}

impl<G, S, T, U> App<G> for Callbacks<S, T, U>
where
    G: Graphics,
    S: FnMut(&Context<G>) + Send + 'static,
    T: FnMut(&Context<G>) + Send + 'static,
    U: FnMut(&Context<G>) + Send + 'static,
{
    fn start(&mut self, ctx: &Context<G>) {
        (self.start)(ctx)
    }

    fn stop(&mut self, ctx: &Context<G>) {
        (self.stop)(ctx)
    }

    fn update(&mut self, ctx: &Context<G>) {
        (self.update)(ctx)
    }
}
