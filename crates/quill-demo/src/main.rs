//! Demo host: a colored quad, a textured quad and a triangle, re-recorded
//! every frame through the immediate-mode API.

use anyhow::Result;
use nalgebra::Matrix4;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use quill_render::core::{App, AppControl, FrameCtx};
use quill_render::device::GpuInit;
use quill_render::logging::{LoggingConfig, init_logging};
use quill_render::paint::Color;
use quill_render::render::{
    DrawMode, RenderCtx, RenderTarget, Renderer, RendererConfig, Texture,
};
use quill_render::window::{Runtime, RuntimeConfig};
use quill_render::RenderResult;

const CLEAR: Color = Color::new(0.08, 0.08, 0.10, 1.0);

#[derive(Default)]
struct DemoApp {
    renderer: Option<Renderer>,
    checker: Option<Texture>,
}

impl DemoApp {
    /// Creates the renderer and demo texture on the first frame, once a
    /// device exists.
    fn ensure_resources(&mut self, rctx: &RenderCtx<'_>) -> RenderResult<()> {
        if self.renderer.is_some() {
            return Ok(());
        }

        let renderer = Renderer::new(rctx, RendererConfig::default())?;
        let pixels = checkerboard(64, 8);
        let checker = renderer.create_texture(rctx, &pixels, 64, 64, 4)?;

        self.renderer = Some(renderer);
        self.checker = Some(checker);
        Ok(())
    }

    fn draw(
        &mut self,
        rctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        width: f32,
        height: f32,
    ) -> RenderResult<()> {
        self.ensure_resources(rctx)?;
        let (Some(renderer), Some(checker)) = (self.renderer.as_mut(), self.checker.as_ref())
        else {
            return Ok(());
        };

        // Top-left-origin pixel space.
        let ortho = Matrix4::new_orthographic(0.0, width.max(1.0), height.max(1.0), 0.0, -1.0, 1.0);
        renderer.default_program().set_mvp(rctx.queue, &ortho)?;

        // Colored quad with per-corner colors.
        renderer.begin(DrawMode::Quads);
        renderer.set_color(Color::RED);
        renderer.vertex2(40.0, 40.0)?;
        renderer.set_color(Color::GREEN);
        renderer.vertex2(240.0, 40.0)?;
        renderer.set_color(Color::BLUE);
        renderer.vertex2(240.0, 240.0)?;
        renderer.set_color(Color::GREEN);
        renderer.vertex2(40.0, 240.0)?;
        renderer.end()?;

        // Textured quad in slot 1.
        renderer.begin(DrawMode::Quads);
        renderer.set_color(Color::WHITE);
        renderer.set_tex_coord(checker, 0.0, 0.0, 1)?;
        renderer.vertex2(300.0, 40.0)?;
        renderer.set_tex_coord(checker, 1.0, 0.0, 1)?;
        renderer.vertex2(560.0, 40.0)?;
        renderer.set_tex_coord(checker, 1.0, 1.0, 1)?;
        renderer.vertex2(560.0, 300.0)?;
        renderer.set_tex_coord(checker, 0.0, 1.0, 1)?;
        renderer.vertex2(300.0, 300.0)?;
        renderer.end()?;

        // Untextured triangle.
        renderer.clear_tex_coord();
        renderer.begin(DrawMode::Triangles);
        renderer.set_color(Color::from_u8(240, 200, 60, 255));
        renderer.vertex2(150.0, 300.0)?;
        renderer.vertex2(260.0, 480.0)?;
        renderer.vertex2(40.0, 480.0)?;
        renderer.end()?;

        renderer.flush(rctx, target);
        Ok(())
    }
}

impl App for DemoApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (w, h) = ctx.window.size();

        let mut frame_error = None;
        let control = ctx.render(CLEAR, |rctx, target| {
            if let Err(e) = self.draw(rctx, target, w as f32, h as f32) {
                frame_error = Some(e);
            }
        });

        if let Some(e) = frame_error {
            log::error!("frame aborted: {e}");
            return AppControl::Exit;
        }
        control
    }
}

/// RGBA checkerboard, `size` x `size` pixels with `cell`-pixel squares.
fn checkerboard(size: u32, cell: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            if on {
                pixels.extend_from_slice(&[235, 235, 235, 255]);
            } else {
                pixels.extend_from_slice(&[90, 60, 160, 255]);
            }
        }
    }
    pixels
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "quill demo".to_string(),
            initial_size: winit::dpi::LogicalSize::new(800.0, 600.0),
        },
        GpuInit::default(),
        DemoApp::default(),
    )
}
