//! Optional egui overlay for the control panels.

use std::sync::Arc;
use winit::window::Window;

/// Egui context, winit state and wgpu renderer in one place.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    textures: PendingTextures,
}

/// Output of one egui frame, ready to paint.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub pixels_per_point: f32,
}

/// Texture updates not yet uploaded.
///
/// Egui sends each update (the font atlas included) exactly once, so a frame
/// that ends without painting must hand its updates on to the next one.
#[derive(Default)]
pub struct PendingTextures {
    delta: egui::TexturesDelta,
}

impl PendingTextures {
    pub fn push(&mut self, delta: egui::TexturesDelta) {
        self.delta.append(delta);
    }

    pub fn take(&mut self) -> egui::TexturesDelta {
        std::mem::take(&mut self.delta)
    }

    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }
}

impl EguiIntegration {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        window: &Arc<Window>,
    ) -> Self {
        let ctx = egui::Context::default();

        let mut style = egui::Style::default();
        style.visuals = egui::Visuals::dark();
        style.visuals.window_shadow = egui::Shadow::NONE;
        style.visuals.popup_shadow = egui::Shadow::NONE;
        ctx.set_style(style);

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let renderer = egui_wgpu::Renderer::new(device, output_format, None, 1, false);

        Self {
            ctx,
            state,
            renderer,
            textures: PendingTextures::default(),
        }
    }

    /// Feed a window event to egui. Returns true if egui consumed it, in
    /// which case the scene should not see it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over a panel.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input()
    }

    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
    }

    pub fn end_frame(&mut self, window: &Window) -> EguiFrameOutput {
        let full_output = self.ctx.end_pass();
        self.state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        self.textures.push(full_output.textures_delta);

        EguiFrameOutput {
            paint_jobs,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Upload every pending texture and this frame's buffers, then draw the
    /// panels over `target`.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        output: EguiFrameOutput,
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: output.pixels_per_point,
        };

        let textures = self.textures.take();
        for (id, image_delta) in &textures.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &output.paint_jobs, &screen);

        {
            let pass = super::load_pass(encoder, target, "Egui Pass");
            let mut pass = pass.forget_lifetime();
            self.renderer.render(&mut pass, &output.paint_jobs, &screen);
        }

        for id in &textures.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_pass(ctx: &egui::Context) -> egui::TexturesDelta {
        ctx.begin_pass(egui::RawInput::default());
        egui::CentralPanel::default().show(ctx, |ui| ui.label("warpers"));
        ctx.end_pass().textures_delta
    }

    #[test]
    fn test_unpainted_frames_keep_font_atlas() {
        let ctx = egui::Context::default();
        let mut pending = PendingTextures::default();

        // First frame is never painted
        pending.push(run_pass(&ctx));
        assert!(!pending.is_empty());
        pending.push(run_pass(&ctx));

        let delta = pending.take();
        assert!(delta
            .set
            .iter()
            .any(|(id, _)| *id == egui::TextureId::default()));
        assert!(pending.is_empty());
    }
}
