//! The host: shared render context, drawer registry, lifecycle dispatcher and
//! the concurrent update/draw loops.
//!
//! Threads per visible session:
//! - the dispatcher (caller's thread) handles platform events
//! - `sparkle-update` calls [`App::update`] until cancelled
//! - `sparkle-draw` renders frames until cancelled
//!
//! Both loop threads are joined before the dispatcher finishes tearing a
//! session down.

mod app;
mod config;
mod context;
mod dispatcher;
mod draw;
mod drawers;
mod event;
pub mod headless;
mod platform;
mod session;
mod update;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use crossbeam_channel::Receiver;

pub use app::{App, Callbacks};
pub use config::{BufferPolicy, EngineConfig, WindowConfig};
pub use context::Context;
pub use dispatcher::{Dispatcher, Flow};
pub use drawers::{Drawer, DrawerId, Drawers};
pub use event::Event;
pub use platform::{Blend, Graphics, Layer, Platform};

pub use crate::time::FramePacing;

/// Runs a host against a queue-driven platform until the session ends.
///
/// Allocates the initial back buffer from `window`, then pulls events from
/// `events` until the dispatcher exits. Returns the shared context, whose
/// graphics handle is cleared by then.
pub fn run_with<P, A>(
    platform: Arc<P>,
    events: Receiver<Event<P::Graphics>>,
    window: &WindowConfig,
    config: EngineConfig,
    app: A,
) -> Result<Arc<Context<P::Graphics>>>
where
    P: Platform,
    A: App<P::Graphics>,
{
    window.validate()?;

    let buffer = platform
        .allocate(window.size())
        .context("failed to allocate initial back buffer")?;
    let ctx = Arc::new(Context::new(window.size(), buffer));

    log::info!("hosting \"{}\" at {}", window.title, window.size());

    let mut dispatcher = Dispatcher::new(ctx.clone(), platform, config, app);
    dispatcher.run(&events)?;

    Ok(ctx)
}
