use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use parking_lot::Mutex;
use winit::window::Window;

use crate::buffer::{PixelBuffer, Rgba};
use crate::coords::{Rect, Size};
use crate::host::{Blend, Graphics, Layer};

use super::blit::{self, Blitter, LayerTexture};
use super::{surface, GpuInit, SurfaceErrorAction};

/// Graphics context handle for a winit window.
///
/// Cheap to clone; clones share the device, surface and layer textures. The
/// draw loop is the only caller of the [`Graphics`] methods, so the internal
/// locks are uncontended.
#[derive(Clone)]
pub struct Gpu {
    inner: Arc<GpuInner>,
}

struct GpuInner {
    window: Arc<Window>,

    /// Surface bound to the window. Owning an `Arc<Window>` keeps the window
    /// alive for as long as the surface.
    surface: wgpu::Surface<'static>,

    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Active surface configuration; resized lazily by [`Graphics::clear`].
    config: Mutex<wgpu::SurfaceConfiguration>,

    blitter: Blitter,
    layers: Mutex<[Option<LayerTexture>; Layer::COUNT]>,

    /// Frame being recorded between `clear` and `publish`. `None` when the
    /// surface could not provide a texture and the frame is skipped.
    frame: Mutex<Option<GpuFrame>>,
}

/// Represents a single acquired frame.
///
/// Holding the surface texture prevents acquisition of subsequent frames, so
/// it is presented (or dropped) by the end of every iteration.
struct GpuFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    size: Size,
}

impl Gpu {
    /// Creates a GPU context bound to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = Size::from(window.inner_size());
        anyhow::ensure!(!size.is_empty(), "window has zero size");

        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sparkle device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let blitter = Blitter::new(&device, format);

        log::info!(
            "gpu ready: {} ({:?}), surface {format:?}, {present_mode:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
        );

        Ok(Self {
            inner: Arc::new(GpuInner {
                window,
                surface,
                device,
                queue,
                config: Mutex::new(config),
                blitter,
                layers: Mutex::new([None, None]),
                frame: Mutex::new(None),
            }),
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.inner.config.lock().format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.inner.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.inner.queue
    }

    /// Largest width or height a layer texture may have.
    pub fn max_texture_dimension(&self) -> u32 {
        self.inner.device.limits().max_texture_dimension_2d
    }

    /// Acquires the next surface texture, reconfiguring first if `size` moved.
    fn acquire(&self, size: Size) -> Result<Option<wgpu::SurfaceTexture>> {
        let inner = &*self.inner;
        let mut config = inner.config.lock();

        if !surface::reconfigure(&inner.surface, &inner.device, &mut config, size) {
            return Ok(None);
        }

        match inner.surface.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(err) => {
                let action = surface::map_surface_error(&inner.surface, &inner.device, &config, err.clone());
                if !action.is_recoverable() {
                    bail!("surface error: {err}");
                }
                if action == SurfaceErrorAction::SkipFrame {
                    log::debug!("skipping frame: {err}");
                }
                Ok(None)
            }
        }
    }
}

impl Graphics for Gpu {
    fn clear(&self, size: Size, color: Rgba) -> Result<()> {
        let inner = &*self.inner;
        let mut frame = inner.frame.lock();
        // A frame left over from a failed iteration is dropped unpresented.
        *frame = None;

        let Some(surface_texture) = self.acquire(size)? else { return Ok(()) };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = inner
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sparkle frame encoder"),
            });

        let srgb = surface_texture.texture.format().is_srgb();
        // The pass only clears; ending it right away records the load op.
        drop(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sparkle clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_value(color, srgb)),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        }));

        *frame = Some(GpuFrame { surface_texture, view, encoder, size });
        Ok(())
    }

    fn upload(&self, layer: Layer, buffer: &PixelBuffer) -> Result<()> {
        let inner = &*self.inner;
        let size = buffer.size();

        let max = self.max_texture_dimension();
        if size.width > max || size.height > max {
            bail!("{layer:?} layer of {size} exceeds the {max}px texture limit");
        }

        let mut layers = inner.layers.lock();
        let slot = &mut layers[layer.index()];
        if slot.as_ref().is_none_or(|t| t.size() != size) {
            log::debug!("allocating {layer:?} texture at {size}");
            *slot = Some(inner.blitter.create_layer(&inner.device, size));
        }
        let texture = slot.as_ref().ok_or_else(|| anyhow!("{layer:?} texture missing"))?;

        inner.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: texture.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            buffer.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(buffer.stride()),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn composite(&self, layer: Layer, dst: Rect, blend: Blend) -> Result<()> {
        let inner = &*self.inner;
        let mut frame = inner.frame.lock();
        let Some(frame) = frame.as_mut() else { return Ok(()) };

        let layers = inner.layers.lock();
        let texture = layers[layer.index()]
            .as_ref()
            .ok_or_else(|| anyhow!("{layer:?} composited before upload"))?;

        let Some(placed) = blit::place(dst, frame.size) else { return Ok(()) };
        inner.blitter.draw(
            &inner.queue,
            &mut frame.encoder,
            &frame.view,
            texture,
            placed,
            blend,
        );
        Ok(())
    }

    fn publish(&self) -> Result<()> {
        let inner = &*self.inner;
        let Some(frame) = inner.frame.lock().take() else { return Ok(()) };

        let GpuFrame { surface_texture, view, encoder, .. } = frame;
        inner.queue.submit(std::iter::once(encoder.finish()));
        drop(view);

        inner.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}

/// Converts an sRGB-encoded colour into a wgpu clear value.
///
/// Clear values are linear when the target format is sRGB.
fn clear_value(color: Rgba, srgb: bool) -> wgpu::Color {
    let [r, g, b, a] = color.to_f64();
    let channel = |c: f64| if srgb { srgb_to_linear(c) } else { c };
    wgpu::Color { r: channel(r), g: channel(g), b: channel(b), a }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_value_linearizes_for_srgb_targets() {
        let c = clear_value(Rgba::opaque(255, 0, 128), true);
        assert!((c.r - 1.0).abs() < 1e-9);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2158).abs() < 1e-3);
        assert_eq!(c.a, 1.0);

        let raw = clear_value(Rgba::opaque(255, 0, 128), false);
        assert!((raw.b - 128.0 / 255.0).abs() < 1e-9);
    }
}
