use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Context, Graphics};

/// Per-frame rendering callback.
pub type Drawer<G> = dyn Fn(&Context<G>) + Send + Sync;

/// Handle returned by [`Drawers::register`]. Never reused within a run.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DrawerId(u64);

impl DrawerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DrawerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drawer#{}", self.0)
    }
}

/// Concurrency-safe drawer registry.
///
/// The map lock is held only while inserting, removing, or copying the map
/// into a frame snapshot; drawers run with no lock held, so they may register
/// or remove drawers themselves.
pub struct Drawers<G: Graphics> {
    next: AtomicU64,
    entries: RwLock<BTreeMap<DrawerId, Arc<Drawer<G>>>>,
}

impl<G: Graphics> Drawers<G> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn register<F>(&self, drawer: F) -> DrawerId
    where
        F: Fn(&Context<G>) + Send + Sync + 'static,
    {
        let id = DrawerId(self.next.fetch_add(1, Ordering::Relaxed));
        self.entries.write().insert(id, Arc::new(drawer));
        log::debug!("registered {id}");
        id
    }

    /// Removes `id`. Unknown or already removed handles are ignored; returns
    /// whether a drawer was removed.
    pub fn unregister(&self, id: DrawerId) -> bool {
        let removed = self.entries.write().remove(&id).is_some();
        if removed {
            log::debug!("removed {id}");
        } else {
            log::trace!("{id} not registered; nothing to remove");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copies the current registrations in handle order.
    pub fn snapshot(&self) -> Vec<(DrawerId, Arc<Drawer<G>>)> {
        self.entries
            .read()
            .iter()
            .map(|(id, d)| (*id, d.clone()))
            .collect()
    }

    /// Invokes every drawer registered at the time of the call. Returns the
    /// number invoked.
    pub(crate) fn draw_all(&self, ctx: &Context<G>) -> usize {
        let frame = self.snapshot();
        for (_, drawer) in &frame {
            drawer(ctx);
        }
        frame.len()
    }
}

impl<G: Graphics> Default for Drawers<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::buffer::PixelBuffer;
    use crate::coords::Size;
    use crate::host::headless::HeadlessGraphics;

    fn ctx() -> Arc<Context<HeadlessGraphics>> {
        let size = Size::new(8, 8);
        Arc::new(Context::new(size, PixelBuffer::try_new(size).unwrap()))
    }

    #[test]
    fn handles_are_monotonic_and_unique() {
        let ctx = ctx();
        let a = ctx.add_drawer(|_| {});
        let b = ctx.add_drawer(|_| {});
        ctx.remove_drawer(b);
        let c = ctx.add_drawer(|_| {});
        assert!(a < b && b < c);
        assert_eq!(ctx.drawers().len(), 2);
    }

    #[test]
    fn removing_twice_is_a_no_op() {
        let ctx = ctx();
        let id = ctx.add_drawer(|_| {});
        assert!(ctx.remove_drawer(id));
        assert!(!ctx.remove_drawer(id));
        assert!(ctx.drawers().is_empty());
    }

    #[test]
    fn removed_drawer_is_not_invoked_again() {
        let ctx = ctx();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = ctx.add_drawer(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(ctx.drawers().draw_all(&ctx), 1);
        ctx.remove_drawer(id);
        assert_eq!(ctx.drawers().draw_all(&ctx), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drawer_may_register_and_remove_during_a_frame() {
        let ctx = ctx();
        let added = Arc::new(AtomicUsize::new(0));
        let a = added.clone();
        let first = ctx.add_drawer(move |ctx| {
            if a.fetch_add(1, Ordering::SeqCst) == 0 {
                ctx.add_drawer(|_| {});
            }
        });

        // The drawer added mid-frame joins from the next snapshot.
        assert_eq!(ctx.drawers().draw_all(&ctx), 1);
        assert_eq!(ctx.drawers().len(), 2);

        let second = ctx.add_drawer(move |ctx| {
            ctx.remove_drawer(first);
        });
        assert_eq!(ctx.drawers().draw_all(&ctx), 3);
        assert_eq!(ctx.drawers().len(), 2);
        assert!(ctx.remove_drawer(second));
    }

    #[test]
    fn snapshot_is_in_handle_order() {
        let ctx = ctx();
        let ids: Vec<_> = (0..4).map(|_| ctx.add_drawer(|_| {})).collect();
        ctx.remove_drawer(ids[1]);
        let order: Vec<_> = ctx.drawers().snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3]]);
    }
}
