//! WGSL stage compilation and well-known uniform resolution.
//!
//! Everything here runs on the CPU through `naga` (the same front end
//! wgpu feeds shader sources through), so compile diagnostics and
//! uniform lookup are testable without a GPU device.

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

use crate::error::{RenderError, RenderResult, ShaderStage};
use crate::render::slots::MAX_TEXTURE_SLOTS;

/// Well-known uniform names resolved after a successful link.
pub const UNIFORM_MATRIX_MVP: &str = "matrix_mvp";
pub const UNIFORM_MATRIX_PROJECTION: &str = "matrix_projection";
pub const UNIFORM_MATRIX_VIEW: &str = "matrix_view";
pub const UNIFORM_MATRIX_MODEL: &str = "matrix_model";
/// Sampler binding expected in the fragment stage.
pub const UNIFORM_SAMPLER: &str = "u_sampler";
/// Prefix of the per-slot texture bindings (`u_textures_0` .. `u_textures_7`).
pub const UNIFORM_TEXTURES_PREFIX: &str = "u_textures_";

/// Entry point names required of every program.
pub const VS_ENTRY: &str = "vs_main";
pub const FS_ENTRY: &str = "fs_main";

/// Resolved location of a well-known uniform: a byte offset into the
/// program's globals uniform buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub offset: u64,
}

/// Uniform interface of a linked program.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShaderInterface {
    /// Size in bytes of the globals uniform struct.
    pub globals_size: u64,
    pub matrix_mvp: UniformLocation,
    pub matrix_projection: UniformLocation,
    pub matrix_view: UniformLocation,
    pub matrix_model: UniformLocation,
}

/// Parses one WGSL stage, mapping syntax errors to [`RenderError::ShaderCompile`]
/// with the front end's rendered diagnostic.
pub(crate) fn parse_stage(source: &str, stage: ShaderStage) -> RenderResult<naga::Module> {
    if source.trim().is_empty() {
        return Err(RenderError::InvalidArguments(format!(
            "{stage} shader source is empty"
        )));
    }
    naga::front::wgsl::parse_str(source).map_err(|e| RenderError::ShaderCompile {
        stage,
        diagnostic: e.emit_to_string(source),
    })
}

/// Validates a parsed stage. Type and semantics errors surface here with
/// the same diagnostic treatment as parse errors.
pub(crate) fn validate_stage(
    module: &naga::Module,
    source: &str,
    stage: ShaderStage,
) -> RenderResult<ModuleInfo> {
    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(module)
        .map_err(|e| RenderError::ShaderCompile {
            stage,
            diagnostic: e.emit_to_string(source),
        })
}

/// Checks that `module` exports the expected entry point for `stage`.
pub(crate) fn check_entry_point(
    module: &naga::Module,
    expected: &str,
    stage: naga::ShaderStage,
) -> RenderResult<()> {
    let found = module
        .entry_points
        .iter()
        .any(|ep| ep.name == expected && ep.stage == stage);
    if found {
        Ok(())
    } else {
        Err(RenderError::ShaderLink(format!(
            "missing `{expected}` entry point in {} stage",
            match stage {
                naga::ShaderStage::Vertex => "vertex",
                naga::ShaderStage::Fragment => "fragment",
                _ => "unknown",
            }
        )))
    }
}

/// Resolves the five well-known uniforms of a compiled program.
///
/// Texture sampler bindings are checked first, then mvp, projection,
/// view, model. The first missing uniform short-circuits the remaining
/// lookups.
pub(crate) fn resolve_interface(
    vs: &naga::Module,
    fs: &naga::Module,
) -> RenderResult<ShaderInterface> {
    resolve_texture_bindings(fs)?;

    let (globals_size, members) = find_globals_struct(vs)
        .or_else(|| find_globals_struct(fs))
        .ok_or_else(|| RenderError::UniformNotFound {
            name: UNIFORM_MATRIX_MVP.to_string(),
        })?;

    let lookup = |name: &str| -> RenderResult<UniformLocation> {
        members
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, offset)| UniformLocation { offset })
            .ok_or_else(|| RenderError::UniformNotFound {
                name: name.to_string(),
            })
    };

    Ok(ShaderInterface {
        globals_size,
        matrix_mvp: lookup(UNIFORM_MATRIX_MVP)?,
        matrix_projection: lookup(UNIFORM_MATRIX_PROJECTION)?,
        matrix_view: lookup(UNIFORM_MATRIX_VIEW)?,
        matrix_model: lookup(UNIFORM_MATRIX_MODEL)?,
    })
}

/// Locates the uniform-space struct at group 0 binding 0 and returns its
/// total size and `(member name, byte offset)` pairs.
fn find_globals_struct(module: &naga::Module) -> Option<(u64, Vec<(String, u64)>)> {
    for (_, var) in module.global_variables.iter() {
        if var.space != naga::AddressSpace::Uniform {
            continue;
        }
        match var.binding {
            Some(naga::ResourceBinding { group: 0, binding: 0 }) => {}
            _ => continue,
        }
        if let naga::TypeInner::Struct { ref members, span } = module.types[var.ty].inner {
            let named = members
                .iter()
                .filter_map(|m| m.name.clone().map(|n| (n, m.offset as u64)))
                .collect();
            return Some((span as u64, named));
        }
    }
    None
}

/// Verifies the fragment stage declares the sampler and every per-slot
/// texture binding at the conventional group/binding indices.
fn resolve_texture_bindings(fs: &naga::Module) -> RenderResult<()> {
    let find = |name: &str| -> Option<&naga::GlobalVariable> {
        fs.global_variables
            .iter()
            .map(|(_, v)| v)
            .find(|v| v.name.as_deref() == Some(name))
    };

    let sampler = find(UNIFORM_SAMPLER).ok_or_else(|| RenderError::UniformNotFound {
        name: UNIFORM_SAMPLER.to_string(),
    })?;
    expect_binding(sampler, 1, 0)?;

    for slot in 0..MAX_TEXTURE_SLOTS {
        let name = format!("{UNIFORM_TEXTURES_PREFIX}{slot}");
        let var = find(&name).ok_or(RenderError::UniformNotFound { name: name.clone() })?;
        expect_binding(var, 1, 1 + slot as u32)?;
    }
    Ok(())
}

fn expect_binding(var: &naga::GlobalVariable, group: u32, binding: u32) -> RenderResult<()> {
    match var.binding {
        Some(naga::ResourceBinding { group: g, binding: b }) if g == group && b == binding => Ok(()),
        _ => Err(RenderError::ShaderLink(format!(
            "`{}` must be declared at @group({group}) @binding({binding})",
            var.name.as_deref().unwrap_or("<unnamed>")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_VS: &str = include_str!("wgsl/default.vert.wgsl");
    const DEFAULT_FS: &str = include_str!("wgsl/default.frag.wgsl");

    fn parsed(vs: &str, fs: &str) -> (naga::Module, naga::Module) {
        let vs_mod = parse_stage(vs, ShaderStage::Vertex).unwrap();
        let fs_mod = parse_stage(fs, ShaderStage::Fragment).unwrap();
        validate_stage(&vs_mod, vs, ShaderStage::Vertex).unwrap();
        validate_stage(&fs_mod, fs, ShaderStage::Fragment).unwrap();
        (vs_mod, fs_mod)
    }

    // ── compilation ───────────────────────────────────────────────────

    #[test]
    fn default_shaders_compile_and_resolve() {
        let (vs, fs) = parsed(DEFAULT_VS, DEFAULT_FS);
        check_entry_point(&vs, VS_ENTRY, naga::ShaderStage::Vertex).unwrap();
        check_entry_point(&fs, FS_ENTRY, naga::ShaderStage::Fragment).unwrap();

        let iface = resolve_interface(&vs, &fs).unwrap();
        // Four mat4x4 members laid out sequentially.
        assert_eq!(iface.matrix_mvp.offset, 0);
        assert_eq!(iface.matrix_projection.offset, 64);
        assert_eq!(iface.matrix_view.offset, 128);
        assert_eq!(iface.matrix_model.offset, 192);
        assert_eq!(iface.globals_size, 256);
    }

    #[test]
    fn syntax_error_reports_shader_compile() {
        let err = parse_stage("@vertex fn vs_main( {", ShaderStage::Vertex).unwrap_err();
        match err {
            RenderError::ShaderCompile { stage, diagnostic } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_is_invalid_arguments() {
        let err = parse_stage("   \n", ShaderStage::Fragment).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArguments(_)));
    }

    #[test]
    fn missing_vertex_entry_point_fails_link() {
        let src = "@vertex fn other_main() -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0);
        }";
        let module = parse_stage(src, ShaderStage::Vertex).unwrap();
        let err = check_entry_point(&module, VS_ENTRY, naga::ShaderStage::Vertex).unwrap_err();
        assert!(matches!(err, RenderError::ShaderLink(_)));
    }

    // ── uniform resolution ────────────────────────────────────────────

    #[test]
    fn missing_matrix_mvp_is_named_in_the_error() {
        // Globals struct present but lacking the mvp member.
        let vs = DEFAULT_VS.replace("matrix_mvp: mat4x4<f32>,", "")
            .replace(
                "u_globals.matrix_mvp * vec4<f32>(in.position, 1.0)",
                "u_globals.matrix_projection * vec4<f32>(in.position, 1.0)",
            );
        let (vs, fs) = parsed(&vs, DEFAULT_FS);
        let err = resolve_interface(&vs, &fs).unwrap_err();
        match err {
            RenderError::UniformNotFound { name } => assert_eq!(name, UNIFORM_MATRIX_MVP),
            other => panic!("expected UniformNotFound, got {other:?}"),
        }
    }

    #[test]
    fn lookup_short_circuits_at_first_missing_uniform() {
        // Both view and model are missing; only the first is reported.
        let vs = DEFAULT_VS
            .replace("    matrix_view: mat4x4<f32>,\n", "")
            .replace("    matrix_model: mat4x4<f32>,\n", "");
        let (vs, fs) = parsed(&vs, DEFAULT_FS);
        let err = resolve_interface(&vs, &fs).unwrap_err();
        match err {
            RenderError::UniformNotFound { name } => assert_eq!(name, UNIFORM_MATRIX_VIEW),
            other => panic!("expected UniformNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_texture_binding_is_reported_before_matrices() {
        let fs = DEFAULT_FS.replace(
            "@group(1) @binding(4) var u_textures_3: texture_2d<f32>;\n",
            "",
        );
        // Also remove the sampling line that references it.
        let fs = fs.replace(
            "        case 3: { texel = textureSampleLevel(u_textures_3, u_sampler, in.tex_coords, 0.0); }\n",
            "",
        );
        let (vs, fs) = parsed(DEFAULT_VS, &fs);
        let err = resolve_interface(&vs, &fs).unwrap_err();
        match err {
            RenderError::UniformNotFound { name } => assert_eq!(name, "u_textures_3"),
            other => panic!("expected UniformNotFound, got {other:?}"),
        }
    }

    #[test]
    fn misplaced_sampler_binding_fails_link() {
        let fs = DEFAULT_FS.replace(
            "@group(1) @binding(0) var u_sampler: sampler;",
            "@group(0) @binding(3) var u_sampler: sampler;",
        );
        let (vs, fs) = parsed(DEFAULT_VS, &fs);
        let err = resolve_interface(&vs, &fs).unwrap_err();
        assert!(matches!(err, RenderError::ShaderLink(_)));
    }
}
