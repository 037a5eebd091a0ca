//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and wires them to
//! the GPU layer. Events are drained per frame before rendering.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
