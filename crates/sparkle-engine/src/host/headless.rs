//! Off-screen platform: a crossbeam event queue and a software compositor.
//!
//! Drives the same dispatcher and loops as the windowed host, which makes it
//! the harness for lifecycle tests and for runs without a display.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::buffer::{AllocError, PixelBuffer, Rgba};
use crate::coords::{Rect, Size};

use super::{Blend, Event, Graphics, Layer, Platform};

/// Queue-backed [`Platform`].
pub struct HeadlessPlatform {
    tx: Sender<Event<HeadlessGraphics>>,
    max_dimension: AtomicU32,
}

impl HeadlessPlatform {
    /// Creates the platform together with the receiving end of its queue.
    pub fn new() -> (Self, Receiver<Event<HeadlessGraphics>>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let platform = Self { tx, max_dimension: AtomicU32::new(u32::MAX) };
        (platform, rx)
    }

    /// Sender for feeding events from outside the host.
    pub fn sender(&self) -> Sender<Event<HeadlessGraphics>> {
        self.tx.clone()
    }

    /// Rejects later allocations wider or taller than `limit`.
    pub fn set_max_dimension(&self, limit: u32) {
        self.max_dimension.store(limit, Ordering::Relaxed);
    }
}

impl Platform for HeadlessPlatform {
    type Graphics = HeadlessGraphics;

    fn allocate(&self, size: Size) -> Result<PixelBuffer, AllocError> {
        let limit = self.max_dimension.load(Ordering::Relaxed);
        if size.width > limit || size.height > limit {
            return Err(AllocError::TooLarge { size, limit });
        }
        PixelBuffer::try_new(size)
    }

    fn post(&self, event: Event<HeadlessGraphics>) {
        if self.tx.send(event).is_err() {
            log::trace!("event posted after the queue closed");
        }
    }
}

#[derive(Default)]
struct Target {
    frame: Option<PixelBuffer>,
    layers: [Option<PixelBuffer>; Layer::COUNT],
    first_uploads: [Option<Size>; Layer::COUNT],
    last_frame: Option<PixelBuffer>,
    clears: u64,
    composites: u64,
}

/// Software [`Graphics`] handle that records what the host asked of it.
///
/// Clones share state, so a test keeps one clone and hands another to the
/// dispatcher.
#[derive(Clone, Default)]
pub struct HeadlessGraphics {
    target: Arc<Mutex<Target>>,
    frames: Arc<AtomicU64>,
    fail_uploads: Arc<AtomicBool>,
}

impl HeadlessGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames published so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> u64 {
        self.target.lock().clears
    }

    pub fn composites(&self) -> u64 {
        self.target.lock().composites
    }

    /// Size of the first buffer uploaded into `layer`.
    pub fn first_upload_size(&self, layer: Layer) -> Option<Size> {
        self.target.lock().first_uploads[layer.index()]
    }

    /// Contents of the most recently published frame.
    pub fn last_frame(&self) -> Option<PixelBuffer> {
        self.target.lock().last_frame.clone()
    }

    /// Makes every later upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

impl Graphics for HeadlessGraphics {
    fn clear(&self, size: Size, color: Rgba) -> Result<()> {
        let mut frame = PixelBuffer::try_new(size)?;
        frame.fill(color);

        let mut target = self.target.lock();
        target.frame = Some(frame);
        target.clears += 1;
        Ok(())
    }

    fn upload(&self, layer: Layer, buffer: &PixelBuffer) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            bail!("{layer:?} upload rejected");
        }

        let mut target = self.target.lock();
        let slot = layer.index();
        target.first_uploads[slot].get_or_insert(buffer.size());

        match &mut target.layers[slot] {
            Some(texture) if texture.size() == buffer.size() => {
                texture.pixels_mut().copy_from_slice(buffer.pixels());
            }
            texture => *texture = Some(buffer.clone()),
        }
        Ok(())
    }

    fn composite(&self, layer: Layer, dst: Rect, blend: Blend) -> Result<()> {
        let mut guard = self.target.lock();
        let target = &mut *guard;

        let src = target.layers[layer.index()]
            .as_ref()
            .ok_or_else(|| anyhow!("{layer:?} composited before upload"))?;
        let frame = target
            .frame
            .as_mut()
            .ok_or_else(|| anyhow!("composite outside a frame"))?;

        scale_onto(frame, src, dst, blend);
        target.composites += 1;
        Ok(())
    }

    fn publish(&self) -> Result<()> {
        let mut target = self.target.lock();
        let frame = target.frame.take().ok_or_else(|| anyhow!("publish without clear"))?;
        target.last_frame = Some(frame);
        drop(target);

        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Nearest-neighbour scale of `src` into `dst`, clipped to `frame`.
fn scale_onto(frame: &mut PixelBuffer, src: &PixelBuffer, dst: Rect, blend: Blend) {
    if dst.is_empty() {
        return;
    }
    let Some(clip) = dst.intersect(&frame.bounds()) else { return };

    for y in clip.y..clip.y + clip.height as i32 {
        let sy = ((y - dst.y) as u64 * src.height() as u64 / dst.height as u64) as i32;
        for x in clip.x..clip.x + clip.width as i32 {
            let sx = ((x - dst.x) as u64 * src.width() as u64 / dst.width as u64) as i32;
            let Some(p) = src.get(sx, sy) else { continue };
            match blend {
                Blend::Over => frame.blend(x, y, p),
                Blend::Src => frame.set(x, y, p),
            }
        }
    }
}
