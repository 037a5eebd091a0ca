//! quill-render: an immediate-mode 2D batch renderer over wgpu.
//!
//! Hosts open a window through [`window::Runtime`], record colored or
//! textured quads/triangles into a [`render::Renderer`] each frame, and
//! flush once per frame for a single indexed draw call per batch set.
//!
//! The layering is strict: `render` and `shader` never touch the
//! windowing layer; `device` and `window` never reach into the batching
//! core.

pub mod core;
pub mod device;
pub mod window;

pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
pub mod time;

mod error;

pub use error::{RenderError, RenderResult, ShaderStage};
