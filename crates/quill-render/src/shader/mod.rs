//! Shader program management.
//!
//! Programs are compiled from two WGSL stage sources, validated through
//! `naga` (the same front end wgpu uses) and linked into a render
//! pipeline. Five well-known uniforms are resolved by fixed name after a
//! successful link; see [`reflect`] for the binding conventions custom
//! shaders must follow.

pub mod reflect;

mod program;

pub use program::{ProgramLayouts, ShaderProgram, UniformValue};
pub use reflect::{ShaderInterface, UniformLocation};

/// Bundled default vertex stage.
pub const DEFAULT_VERTEX_SHADER: &str = include_str!("wgsl/default.vert.wgsl");
/// Bundled default fragment stage.
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("wgsl/default.frag.wgsl");
