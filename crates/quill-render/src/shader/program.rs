use std::path::Path;

use nalgebra::Matrix4;
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult, ShaderStage};
use crate::render::slots::MAX_TEXTURE_SLOTS;
use crate::render::Vertex;

use super::reflect::{
    self, FS_ENTRY, ShaderInterface, UniformLocation, VS_ENTRY,
};

/// Bind group layouts shared by every program of one renderer.
///
/// Group 0 is the globals uniform buffer, group 1 the sampler plus one
/// texture binding per slot. Pipelines and the renderer's texture bind
/// group must be created against the same layout objects.
pub struct ProgramLayouts {
    pub(crate) globals: wgpu::BindGroupLayout,
    pub(crate) textures: wgpu::BindGroupLayout,
}

impl ProgramLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let globals = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut entries = Vec::with_capacity(1 + MAX_TEXTURE_SLOTS);
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        for slot in 0..MAX_TEXTURE_SLOTS as u32 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + slot,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        let textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill textures bgl"),
            entries: &entries,
        });

        Self { globals, textures }
    }
}

/// Typed uniform data accepted by [`ShaderProgram::set_uniform`].
#[derive(Debug, Copy, Clone)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    fn bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec2(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Vec3(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Vec4(v) => bytemuck::cast_slice(v).to_vec(),
            // nalgebra stores column-major, matching WGSL mat4x4 layout.
            UniformValue::Mat4(m) => bytemuck::cast_slice(m.as_slice()).to_vec(),
        }
    }
}

/// A compiled, linked shader program.
///
/// Owns the render pipeline, the globals uniform buffer and the resolved
/// well-known uniform locations. wgpu handles are internally refcounted;
/// cloning shares the same GPU objects, and dropping the last clone
/// releases them (there is no explicit unload).
#[derive(Clone)]
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    globals: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    interface: ShaderInterface,
}

impl ShaderProgram {
    /// Compiles and links a program from WGSL vertex and fragment sources.
    ///
    /// Each stage is parsed and validated independently; the first
    /// failing stage aborts with [`RenderError::ShaderCompile`] and no
    /// GPU objects are created. After a successful link the five
    /// well-known uniforms are resolved (see `shader::reflect`); a
    /// missing one aborts the remaining lookups.
    pub fn load(
        device: &wgpu::Device,
        layouts: &ProgramLayouts,
        surface_format: wgpu::TextureFormat,
        vs_source: &str,
        fs_source: &str,
    ) -> RenderResult<Self> {
        let vs_module = reflect::parse_stage(vs_source, ShaderStage::Vertex)?;
        reflect::validate_stage(&vs_module, vs_source, ShaderStage::Vertex)?;
        reflect::check_entry_point(&vs_module, VS_ENTRY, naga::ShaderStage::Vertex)?;

        let fs_module = reflect::parse_stage(fs_source, ShaderStage::Fragment)?;
        reflect::validate_stage(&fs_module, fs_source, ShaderStage::Fragment)?;
        reflect::check_entry_point(&fs_module, FS_ENTRY, naga::ShaderStage::Fragment)?;

        let interface = reflect::resolve_interface(&vs_module, &fs_module)?;

        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quill vertex stage"),
            source: wgpu::ShaderSource::Wgsl(vs_source.into()),
        });
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quill fragment stage"),
            source: wgpu::ShaderSource::Wgsl(fs_source.into()),
        });

        // Globals start as identity transforms; hosts overwrite per frame.
        let globals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quill globals ubo"),
            contents: &identity_globals(&interface),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill globals bind group"),
            layout: &layouts.globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quill pipeline layout"),
            bind_group_layouts: &[&layouts.globals, &layouts.textures],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quill pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(VS_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(FS_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(straight_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            pipeline,
            globals,
            globals_bind_group,
            interface,
        })
    }

    /// Reads both stage sources from disk and delegates to [`load`](Self::load).
    pub fn load_from_file(
        device: &wgpu::Device,
        layouts: &ProgramLayouts,
        surface_format: wgpu::TextureFormat,
        vert_path: impl AsRef<Path>,
        frag_path: impl AsRef<Path>,
    ) -> RenderResult<Self> {
        let vs_source = read_source(vert_path.as_ref())?;
        let fs_source = read_source(frag_path.as_ref())?;
        Self::load(device, layouts, surface_format, &vs_source, &fs_source)
    }

    /// Writes typed uniform data at a resolved location.
    ///
    /// The write is bounds-checked against the globals buffer; the
    /// caller is responsible for passing a location resolved from this
    /// program's [`interface`](Self::interface).
    pub fn set_uniform(
        &self,
        queue: &wgpu::Queue,
        location: UniformLocation,
        value: UniformValue,
    ) -> RenderResult<()> {
        let bytes = value.bytes();
        let end = location.offset + bytes.len() as u64;
        if end > self.interface.globals_size {
            return Err(RenderError::InvalidArguments(format!(
                "uniform write of {} bytes at offset {} exceeds globals buffer ({} bytes)",
                bytes.len(),
                location.offset,
                self.interface.globals_size
            )));
        }
        queue.write_buffer(&self.globals, location.offset, &bytes);
        Ok(())
    }

    /// Convenience: writes the model-view-projection matrix.
    pub fn set_mvp(&self, queue: &wgpu::Queue, mvp: &Matrix4<f32>) -> RenderResult<()> {
        self.set_uniform(queue, self.interface.matrix_mvp, UniformValue::Mat4(*mvp))
    }

    /// Resolved uniform interface of this program.
    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub(crate) fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub(crate) fn globals_bind_group(&self) -> &wgpu::BindGroup {
        &self.globals_bind_group
    }
}

/// src-alpha / one-minus-src-alpha over both color and alpha.
fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Initial globals contents: identity in all four matrix slots.
fn identity_globals(interface: &ShaderInterface) -> Vec<u8> {
    let mut data = vec![0u8; interface.globals_size as usize];
    let identity = Matrix4::<f32>::identity();
    let bytes: &[u8] = bytemuck::cast_slice(identity.as_slice());
    for loc in [
        interface.matrix_mvp,
        interface.matrix_projection,
        interface.matrix_view,
        interface.matrix_model,
    ] {
        let start = loc.offset as usize;
        data[start..start + bytes.len()].copy_from_slice(bytes);
    }
    data
}

fn read_source(path: &Path) -> RenderResult<String> {
    std::fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
