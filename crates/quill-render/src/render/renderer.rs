use crate::error::RenderResult;
use crate::paint::Color;
use crate::shader::{
    DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER, ProgramLayouts, ShaderProgram,
};

use super::arena::FrameArena;
use super::batch::{DrawMode, expand_batch};
use super::ctx::{RenderCtx, RenderTarget};
use super::slots::SlotTable;
use super::texture::Texture;
use super::vertex::Vertex;

/// Capacity configuration for the renderer's frame arena.
#[derive(Debug, Copy, Clone)]
pub struct RendererConfig {
    /// Maximum vertices held per flush.
    pub max_vertices: usize,
    /// Maximum indices held per flush.
    pub max_indices: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_vertices: 8192,
            max_indices: 12288,
        }
    }
}

/// Immediate-mode 2D batch renderer.
///
/// The renderer is an explicitly constructed value owned by the caller;
/// every operation takes it by reference. One instance drives one
/// surface from one thread.
///
/// Per frame, a host records any number of `begin`/`end` batch pairs,
/// all accumulating into the same frame arena, and then calls
/// [`flush`](Self::flush) once, which records exactly one indexed draw
/// call and resets all per-frame state (arena, active shader, texture
/// slots) back to its post-construction configuration.
///
/// Recorder operations (`begin`, `set_color`, `set_tex_coord`,
/// `vertex2`/`vertex3`, `end`) only mutate CPU-side state; GPU work
/// happens exclusively in `flush`.
pub struct Renderer {
    arena: FrameArena,
    mode: DrawMode,
    template: Vertex,

    slots: SlotTable<wgpu::TextureView>,
    texture_bind_group: Option<wgpu::BindGroup>,
    sampler: wgpu::Sampler,
    default_texture: Texture,

    layouts: ProgramLayouts,
    surface_format: wgpu::TextureFormat,
    default_program: ShaderProgram,
    active_program: ShaderProgram,

    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
}

impl Renderer {
    /// Creates a renderer for the surface described by `ctx`.
    ///
    /// Allocates the fixed-size GPU vertex/index buffers, the default
    /// 1x1 white texture and compiles the bundled default shader. A
    /// default-shader compile failure is reported, not unwrapped; hosts
    /// usually treat it as fatal.
    pub fn new(ctx: &RenderCtx<'_>, config: RendererConfig) -> RenderResult<Self> {
        let arena = FrameArena::new(config.max_vertices, config.max_indices);
        let layouts = ProgramLayouts::new(ctx.device);

        let default_texture = Texture::default_white(ctx.device, ctx.queue)?;
        let slots = SlotTable::new(default_texture.id(), default_texture.view().clone());

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quill sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let default_program = ShaderProgram::load(
            ctx.device,
            &layouts,
            ctx.surface_format,
            DEFAULT_VERTEX_SHADER,
            DEFAULT_FRAGMENT_SHADER,
        )?;
        let active_program = default_program.clone();

        let vbo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill vertex buffer"),
            size: (config.max_vertices * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let ibo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill index buffer"),
            size: (config.max_indices * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!(
            "renderer created: {} vertices / {} indices per flush",
            config.max_vertices,
            config.max_indices
        );

        Ok(Self {
            arena,
            mode: DrawMode::Quads,
            template: Vertex {
                position: [0.0; 3],
                color: Color::WHITE.to_array(),
                tex_coords: [0.0; 2],
                tex_slot: 0.0,
            },
            slots,
            texture_bind_group: None,
            sampler,
            default_texture,
            layouts,
            surface_format: ctx.surface_format,
            default_program,
            active_program,
            vbo,
            ibo,
        })
    }

    // ── batch recording ───────────────────────────────────────────────

    /// Starts a batch in `mode`, discarding any unterminated batch.
    pub fn begin(&mut self, mode: DrawMode) {
        if self.arena.staged() > 0 {
            log::warn!("begin() with an unterminated batch; staged vertices discarded");
        }
        self.arena.discard_staged();
        self.mode = mode;
    }

    /// Sets the color applied to subsequently emitted vertices.
    pub fn set_color(&mut self, color: Color) {
        self.template.color = color.to_array();
    }

    /// Sets the texture coordinates and slot applied to subsequently
    /// emitted vertices, registering `texture` into the slot table.
    ///
    /// Binding the same texture to the same slot again is a no-op; an
    /// out-of-range slot is rejected here rather than clamped in the
    /// shader.
    pub fn set_tex_coord(
        &mut self,
        texture: &Texture,
        u: f32,
        v: f32,
        slot: usize,
    ) -> RenderResult<()> {
        self.slots.bind(slot, texture.id(), texture.view().clone())?;
        if self.slots.is_dirty() {
            self.texture_bind_group = None;
        }
        self.template.tex_coords = [u, v];
        self.template.tex_slot = slot as f32;
        Ok(())
    }

    /// Resets the pending template to untextured: UV `(0, 0)`, slot 0
    /// (the default white texture).
    pub fn clear_tex_coord(&mut self) {
        self.template.tex_coords = [0.0, 0.0];
        self.template.tex_slot = 0.0;
    }

    /// Emits one vertex at `(x, y, 0)` from the pending template.
    pub fn vertex2(&mut self, x: f32, y: f32) -> RenderResult<()> {
        self.vertex3(x, y, 0.0)
    }

    /// Emits one vertex at `(x, y, z)` from the pending template.
    ///
    /// The vertex lands in the arena's staged region; committed counts
    /// are unchanged until [`end`](Self::end).
    pub fn vertex3(&mut self, x: f32, y: f32, z: f32) -> RenderResult<()> {
        self.arena.stage_vertex(Vertex {
            position: [x, y, z],
            ..self.template
        })
    }

    /// Ends the current batch, deriving index topology from its mode.
    pub fn end(&mut self) -> RenderResult<()> {
        expand_batch(&mut self.arena, self.mode)
    }

    // ── shader selection ──────────────────────────────────────────────

    /// Selects the program used by the next flush.
    ///
    /// The selection is reset to the default program after every flush.
    pub fn use_shader(&mut self, program: &ShaderProgram) {
        self.active_program = program.clone();
    }

    /// The bundled default program (e.g. for setting its matrices).
    pub fn default_program(&self) -> &ShaderProgram {
        &self.default_program
    }

    /// Compiles a caller-supplied program against this renderer's
    /// layouts and surface format.
    pub fn load_shader(
        &self,
        ctx: &RenderCtx<'_>,
        vs_source: &str,
        fs_source: &str,
    ) -> RenderResult<ShaderProgram> {
        ShaderProgram::load(ctx.device, &self.layouts, self.surface_format, vs_source, fs_source)
    }

    /// Like [`load_shader`](Self::load_shader), reading both stages from disk.
    pub fn load_shader_from_file(
        &self,
        ctx: &RenderCtx<'_>,
        vert_path: impl AsRef<std::path::Path>,
        frag_path: impl AsRef<std::path::Path>,
    ) -> RenderResult<ShaderProgram> {
        ShaderProgram::load_from_file(
            ctx.device,
            &self.layouts,
            self.surface_format,
            vert_path,
            frag_path,
        )
    }

    // ── flush ─────────────────────────────────────────────────────────

    /// Uploads all committed geometry, records one indexed draw call
    /// into `target`, then resets per-frame state.
    ///
    /// After this returns the arena is empty, the active program equals
    /// the default and every texture slot holds the default texture,
    /// the same state as immediately after construction. A flush with
    /// no committed geometry records no draw but performs the same
    /// reset.
    pub fn flush(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if !self.arena.is_empty() {
            ctx.queue
                .write_buffer(&self.vbo, 0, bytemuck::cast_slice(self.arena.vertex_data()));
            ctx.queue
                .write_buffer(&self.ibo, 0, bytemuck::cast_slice(self.arena.index_data()));

            self.ensure_texture_bind_group(ctx);

            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quill batch pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(self.active_program.pipeline());
            rpass.set_bind_group(0, self.active_program.globals_bind_group(), &[]);
            if let Some(bind_group) = self.texture_bind_group.as_ref() {
                rpass.set_bind_group(1, bind_group, &[]);
            }
            rpass.set_vertex_buffer(0, self.vbo.slice(..));
            rpass.set_index_buffer(self.ibo.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..self.arena.index_count() as u32, 0, 0..1);
        }

        // Reset to the post-initialization state.
        self.arena.clear();
        self.active_program = self.default_program.clone();
        self.slots.reset();
        if self.slots.is_dirty() {
            self.texture_bind_group = None;
        }
    }

    fn ensure_texture_bind_group(&mut self, ctx: &RenderCtx<'_>) {
        if self.texture_bind_group.is_some() && !self.slots.is_dirty() {
            return;
        }

        let mut entries = Vec::with_capacity(1 + self.slots.capacity());
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        for (i, view) in self.slots.handles().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        self.texture_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill textures bind group"),
            layout: &self.layouts.textures,
            entries: &entries,
        }));
        self.slots.mark_clean();
    }

    /// Creates a texture usable with this renderer from decoded pixels.
    pub fn create_texture(
        &self,
        ctx: &RenderCtx<'_>,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: u32,
    ) -> RenderResult<Texture> {
        Texture::from_pixels(ctx.device, ctx.queue, pixels, width, height, channels)
    }

    /// Committed vertex count awaiting the next flush.
    pub fn pending_vertices(&self) -> usize {
        self.arena.vertex_count()
    }

    /// Committed index count awaiting the next flush.
    pub fn pending_indices(&self) -> usize {
        self.arena.index_count()
    }

    /// The 1x1 white texture bound to every slot by default.
    pub fn default_texture(&self) -> &Texture {
        &self.default_texture
    }
}
