use std::sync::Arc;

use parking_lot::Mutex;

use crate::time::{FramePacer, FramePacing};

use super::session::{CancelSignal, HideOnUnwind};
use super::{App, Context, Platform};

/// Calls [`App::update`] until `cancel` fires. Returns the iteration count.
///
/// The app lock is uncontended here: `start` runs before this loop is spawned
/// and `stop` after it is joined.
pub(crate) fn run_update_loop<P, A>(
    ctx: Arc<Context<P::Graphics>>,
    platform: Arc<P>,
    app: Arc<Mutex<A>>,
    cancel: CancelSignal,
    pacing: FramePacing,
) -> u64
where
    P: Platform,
    A: App<P::Graphics>,
{
    let _guard = HideOnUnwind::new(&*platform, "update");
    let mut pacer = FramePacer::new(pacing);
    let mut iterations = 0u64;

    while !cancel.is_cancelled() {
        app.lock().update(&ctx);
        iterations += 1;
        pacer.wait();
    }

    log::trace!("update loop observed cancellation");
    iterations
}
