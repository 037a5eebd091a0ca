//! Color model shared between the recorder API and the GPU vertex format.
//!
//! Colors are straight-alpha RGBA in `[0, 1]`, matching the renderer's
//! src-alpha / one-minus-src-alpha blend state.

mod color;

pub use color::Color;
