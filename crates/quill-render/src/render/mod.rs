//! The batching core: frame arena, batch recorder, topology expansion,
//! texture slot table and the flush/submit engine.
//!
//! Control flow per frame: record batches (`begin` .. `end`, any number
//! of pairs, all accumulating in the arena) and then `flush` once. No
//! GPU work happens outside `flush`.
//!
//! Convention: positions are whatever space the active program's
//! `matrix_mvp` maps to clip space; the demo uses top-left-origin pixel
//! coordinates with an orthographic projection.

mod arena;
mod batch;
mod ctx;
mod renderer;
mod texture;
mod vertex;

pub(crate) mod slots;

pub use batch::DrawMode;
pub use ctx::{RenderCtx, RenderTarget};
pub use renderer::{Renderer, RendererConfig};
pub use slots::MAX_TEXTURE_SLOTS;
pub use texture::Texture;
pub use vertex::Vertex;
