//! GPU device + surface management.
//!
//! Owns the wgpu Instance/Adapter/Device/Queue, configures the surface
//! (swapchain) and hands out per-frame encoders/views. The batching
//! core never touches any of this directly; it sees only `RenderCtx`
//! and `RenderTarget`.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
