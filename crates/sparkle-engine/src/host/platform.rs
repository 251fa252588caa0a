use anyhow::Result;

use crate::buffer::{AllocError, PixelBuffer, Rgba};
use crate::coords::{Rect, Size};

use super::Event;

/// Texture slot a buffer is uploaded into.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Layer {
    /// The frame drawers rendered into.
    Frame,
    /// The diagnostics overlay.
    Overlay,
}

impl Layer {
    pub(crate) const COUNT: usize = 2;

    pub(crate) fn index(self) -> usize {
        match self {
            Layer::Frame => 0,
            Layer::Overlay => 1,
        }
    }
}

/// How an uploaded layer is combined with the window contents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Blend {
    /// Composite over what is already there (premultiplied alpha).
    Over,
    /// Replace what is already there.
    Src,
}

/// Graphics context handle for one visible session.
///
/// Calls for a frame arrive in order from the draw loop:
/// `clear`, `upload`/`composite` pairs, then `publish`.
pub trait Graphics: Clone + Send + Sync + 'static {
    /// Begins a frame of `size` and clears it to `color`.
    fn clear(&self, size: Size, color: Rgba) -> Result<()>;

    /// Copies `buffer` into the texture backing `layer`.
    fn upload(&self, layer: Layer, buffer: &PixelBuffer) -> Result<()>;

    /// Scales `layer` onto the window rectangle `dst`.
    fn composite(&self, layer: Layer, dst: Rect, blend: Blend) -> Result<()>;

    /// Presents the frame.
    fn publish(&self) -> Result<()>;
}

/// Window system services the host consumes.
pub trait Platform: Send + Sync + 'static {
    type Graphics: Graphics;

    /// Allocates a back buffer the graphics context can upload.
    fn allocate(&self, size: Size) -> Result<PixelBuffer, AllocError>;

    /// Queues `event` for the dispatcher. Events posted after the dispatcher
    /// stopped are dropped.
    fn post(&self, event: Event<Self::Graphics>);
}
