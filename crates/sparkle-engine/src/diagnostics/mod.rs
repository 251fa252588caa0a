//! On-screen diagnostics: a frames-per-second readout composited over each
//! frame by the draw loop.

mod glyphs;
mod overlay;

pub use overlay::Diagnostics;
