use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::buffer::Rgba;
use crate::coords::Size;
use crate::time::{FramePacer, FramePacing};

use super::session::{CancelSignal, HideOnUnwind};
use super::{Blend, BufferPolicy, Context, Event, Graphics, Layer, Platform};

/// Frame producer for one visible session.
pub(crate) struct DrawLoop<P: Platform> {
    ctx: Arc<Context<P::Graphics>>,
    platform: Arc<P>,
    graphics: P::Graphics,
    clear_color: Rgba,
    policy: BufferPolicy,
}

impl<P: Platform> DrawLoop<P> {
    pub(crate) fn new(
        ctx: Arc<Context<P::Graphics>>,
        platform: Arc<P>,
        graphics: P::Graphics,
        clear_color: Rgba,
        policy: BufferPolicy,
    ) -> Self {
        Self { ctx, platform, graphics, clear_color, policy }
    }

    /// Draws frames until `cancel` fires. Returns the number of frames drawn.
    ///
    /// A failed frame ends the loop; `Hidden` is posted so the dispatcher tears
    /// the session down instead of leaving the window undrawn.
    pub(crate) fn run(self, cancel: CancelSignal, pacing: FramePacing) -> Result<u64> {
        let _guard = HideOnUnwind::new(&*self.platform, "draw");
        let mut pacer = FramePacer::new(pacing);
        let mut frames = 0u64;

        while !cancel.is_cancelled() {
            if let Err(err) = self.frame() {
                log::error!("draw loop stopped after {frames} frames: {err:#}");
                self.platform.post(Event::Hidden);
                return Err(err);
            }
            frames += 1;
            pacer.wait();
        }

        Ok(frames)
    }

    /// Renders and presents one frame.
    pub(crate) fn frame(&self) -> Result<()> {
        let ctx = &*self.ctx;
        let size = ctx.size();

        self.graphics
            .clear(size, self.clear_color)
            .context("failed to clear frame")?;

        self.prepare_buffer(size)?;

        ctx.drawers().draw_all(ctx);

        let bounds = {
            let buffer = ctx.buffer();
            self.graphics
                .upload(Layer::Frame, &buffer)
                .context("failed to upload frame")?;
            buffer.bounds()
        };

        self.graphics
            .composite(Layer::Frame, bounds, Blend::Over)
            .context("failed to composite frame")?;

        if let Some(overlay) = ctx.overlay().as_mut() {
            overlay.tick();
            if let Some(dst) = overlay.placement(size) {
                self.graphics
                    .upload(Layer::Overlay, overlay.render())
                    .context("failed to upload diagnostics overlay")?;
                self.graphics
                    .composite(Layer::Overlay, dst, Blend::Over)
                    .context("failed to composite diagnostics overlay")?;
            }
        }

        self.graphics.publish().context("failed to present frame")
    }

    /// Makes the back buffer match `size` and start clear.
    ///
    /// A buffer staged by a resize to `size` is installed as is; a stale one
    /// (superseded by a later resize) is dropped.
    fn prepare_buffer(&self, size: Size) -> Result<()> {
        if let Some(staged) = self.ctx.take_staged().filter(|b| b.size() == size) {
            self.ctx.replace_buffer(staged);
            return Ok(());
        }

        if self.policy == BufferPolicy::OnResize {
            let mut buffer = self.ctx.buffer();
            if buffer.size() == size {
                buffer.fill(Rgba::TRANSPARENT);
                return Ok(());
            }
        }

        let fresh = self
            .platform
            .allocate(size)
            .with_context(|| format!("failed to reallocate back buffer at {size}"))?;
        self.ctx.replace_buffer(fresh);
        Ok(())
    }
}
