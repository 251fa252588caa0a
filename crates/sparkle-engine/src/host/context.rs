use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::buffer::PixelBuffer;
use crate::coords::{Point, Size};
use crate::device::Gpu;
use crate::diagnostics::Diagnostics;

use super::{DrawerId, Drawers, Graphics};

/// Shared render context, passed by reference to every callback.
///
/// Field ownership:
/// - `graphics`, `size` and the pointer are written by the dispatcher only;
///   the loops read whatever value is current and tolerate one frame of lag
///   after a resize.
/// - the back buffer belongs to the draw loop for the duration of a frame;
///   drawers (and `update`) reach it through [`Context::buffer`], which locks it
///   for as long as the returned guard lives. The dispatcher never locks it: a
///   buffer allocated on resize is staged and installed by the draw loop at the
///   start of its next frame.
/// - the drawer map is locked only while it is mutated or copied.
pub struct Context<G: Graphics = Gpu> {
    graphics: RwLock<Option<G>>,
    size: RwLock<Size>,
    pointer: RwLock<Point>,
    buffer: Mutex<PixelBuffer>,
    staged: Mutex<Option<PixelBuffer>>,
    drawers: Drawers<G>,
    overlay: Mutex<Option<Diagnostics>>,
}

impl<G: Graphics> Context<G> {
    pub(crate) fn new(size: Size, buffer: PixelBuffer) -> Self {
        debug_assert_eq!(buffer.size(), size);
        Self {
            graphics: RwLock::new(None),
            size: RwLock::new(size),
            pointer: RwLock::new(size.center()),
            buffer: Mutex::new(buffer),
            staged: Mutex::new(None),
            drawers: Drawers::new(),
            overlay: Mutex::new(None),
        }
    }

    /// Graphics context handle; `None` outside the visible stage.
    pub fn graphics(&self) -> Option<G> {
        self.graphics.read().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.graphics.read().is_some()
    }

    /// Current window size in physical pixels.
    pub fn size(&self) -> Size {
        *self.size.read()
    }

    /// Last known pointer position. Reset to the window centre on resize.
    pub fn pointer(&self) -> Point {
        *self.pointer.read()
    }

    pub fn pointer_x(&self) -> f32 {
        self.pointer().x
    }

    pub fn pointer_y(&self) -> f32 {
        self.pointer().y
    }

    /// Locks the writable back buffer.
    ///
    /// Keep the guard short-lived: the draw loop needs the buffer to upload the
    /// frame, and the dispatcher needs it to apply a resize.
    pub fn buffer(&self) -> MutexGuard<'_, PixelBuffer> {
        self.buffer.lock()
    }

    pub fn drawers(&self) -> &Drawers<G> {
        &self.drawers
    }

    /// Registers a per-frame drawer. Safe to call from inside a drawer.
    pub fn add_drawer<F>(&self, drawer: F) -> DrawerId
    where
        F: Fn(&Context<G>) + Send + Sync + 'static,
    {
        self.drawers.register(drawer)
    }

    /// Removes a drawer; unknown handles are accepted silently.
    pub fn remove_drawer(&self, id: DrawerId) -> bool {
        self.drawers.unregister(id)
    }

    pub(crate) fn set_graphics(&self, graphics: Option<G>) -> Option<G> {
        std::mem::replace(&mut *self.graphics.write(), graphics)
    }

    pub(crate) fn set_pointer(&self, pointer: Point) {
        *self.pointer.write() = pointer;
    }

    /// Stages a buffer allocated for `size`, records the size, and resets the
    /// pointer to the new centre.
    ///
    /// Does not touch the live buffer, so it never waits on a running drawer.
    pub(crate) fn apply_resize(&self, size: Size, buffer: PixelBuffer) {
        debug_assert_eq!(buffer.size(), size);
        *self.staged.lock() = Some(buffer);
        *self.size.write() = size;
        self.set_pointer(size.center());
    }

    /// Takes the buffer staged by the last resize, if any.
    pub(crate) fn take_staged(&self) -> Option<PixelBuffer> {
        self.staged.lock().take()
    }

    pub(crate) fn replace_buffer(&self, buffer: PixelBuffer) {
        *self.buffer.lock() = buffer;
    }

    pub(crate) fn overlay(&self) -> MutexGuard<'_, Option<Diagnostics>> {
        self.overlay.lock()
    }
}
