//! Window, event loop and the per-frame update/render cycle.
//!
//! | Key | Action |
//! |-----|--------|
//! | `Space` | pause / resume |
//! | `R` | reset the current scene |
//! | `1`-`4` | switch scene |
//! | `Escape` | quit |
//!
//! Scene specific keys are documented in [`crate::scenes`].

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::LabConfig;
use crate::gpu::{clear_pass, FrameContext, GpuContext, ViewBinding};
use crate::input::{Input, KeyCode};
use crate::scenes::{create_scene, Scene, SceneGpu, SceneKind, UpdateContext};
use crate::time::Time;
use crate::{AppError, FrameError};

/// Open a window and run `config` until it is closed.
pub fn run(config: LabConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Everything that exists once the window is up.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    view: ViewBinding,
    scene: Box<dyn Scene>,
    #[cfg(feature = "egui")]
    egui: crate::gpu::EguiIntegration,
}

struct App {
    config: LabConfig,
    running: Option<Running>,
    time: Time,
    input: Input,
    error: Option<AppError>,
    last_frame_error: Option<FrameError>,
}

impl App {
    fn new(config: LabConfig) -> Self {
        let mut time = Time::new();
        time.set_time_scale(config.time_scale);
        Self {
            config,
            running: None,
            time,
            input: Input::new(),
            error: None,
            last_frame_error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running, AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let view = ViewBinding::new(&gpu.device);
        let scene = create_scene(
            self.config.scene,
            &self.config,
            &SceneGpu {
                device: &gpu.device,
                format: gpu.format(),
                view: &view,
            },
        );

        Ok(Running {
            #[cfg(feature = "egui")]
            egui: crate::gpu::EguiIntegration::new(&gpu.device, gpu.format(), &window),
            window,
            gpu,
            view,
            scene,
        })
    }

    /// Log a frame error once, not every frame it repeats.
    fn report(&mut self, err: FrameError) {
        let repeated = matches!(
            (&self.last_frame_error, &err),
            (Some(FrameError::InstanceBuffer(a)), FrameError::InstanceBuffer(b)) if a == b
        );
        if !repeated {
            log::error!("frame skipped: {}", err);
        }
        self.last_frame_error = Some(err);
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        self.time.update();

        // Global keys
        if self.input.key_pressed(KeyCode::Escape) {
            event_loop.exit();
            return;
        }
        if self.input.key_pressed(KeyCode::Space) {
            self.time.toggle_pause();
        }
        #[cfg_attr(not(feature = "egui"), allow(unused_mut))]
        let mut reset = self.input.key_pressed(KeyCode::R);
        #[cfg_attr(not(feature = "egui"), allow(unused_mut))]
        let mut switch_to = [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3, KeyCode::Key4]
            .into_iter()
            .filter(|&key| self.input.key_pressed(key))
            .find_map(SceneKind::from_key);

        #[cfg(feature = "egui")]
        let egui_output = {
            running.egui.begin_frame(&running.window);
            let ctx = running.egui.ctx.clone();
            let time = &mut self.time;
            let scene = &mut running.scene;
            egui::Window::new(scene.name())
                .default_pos([10.0, 10.0])
                .resizable(false)
                .show(&ctx, |ui| {
                    let request = crate::controls::global_panel(ui, time, scene.kind());
                    reset |= request.reset;
                    switch_to = switch_to.or(request.switch_to);
                    ui.separator();
                    scene.ui(ui);
                });
            running.egui.end_frame(&running.window)
        };

        #[cfg(feature = "egui")]
        let pointer_captured = running.egui.wants_pointer();
        #[cfg(not(feature = "egui"))]
        let pointer_captured = false;

        if let Some(kind) = switch_to.filter(|&kind| kind != running.scene.kind()) {
            running.scene = create_scene(
                kind,
                &self.config,
                &SceneGpu {
                    device: &running.gpu.device,
                    format: running.gpu.format(),
                    view: &running.view,
                },
            );
            self.time.reset();
            self.last_frame_error = None;
        } else if reset {
            log::info!("resetting {}", running.scene.kind());
            running.scene.reset();
        }

        let view_scale = running.gpu.view_scale();
        running.scene.update(&UpdateContext {
            time: &self.time,
            input: &self.input,
            view_scale,
            pointer_captured,
        });
        self.input.begin_frame();

        running
            .view
            .update(&running.gpu.queue, view_scale, self.time.elapsed());

        let output = match running.gpu.current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                running.gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
                return;
            }
            Err(err) => {
                log::warn!("surface error: {}", err);
                return;
            }
        };
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = running
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        drop(clear_pass(&mut encoder, &target));

        let rendered = running.scene.render(&mut FrameContext {
            device: &running.gpu.device,
            queue: &running.gpu.queue,
            encoder: &mut encoder,
            target: &target,
            view: &running.view,
            time: &self.time,
        });
        if let Err(err) = rendered {
            self.report(err.into());
            return;
        }

        #[cfg(feature = "egui")]
        running.egui.paint(
            &running.gpu.device,
            &running.gpu.queue,
            &mut encoder,
            &target,
            [running.gpu.config.width, running.gpu.config.height],
            egui_output,
        );

        running.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.last_frame_error = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                let size = running.window.inner_size();
                self.input.set_window_size(size.width, size.height);
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                log::error!("{}", err);
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let consumed = match &mut self.running {
            Some(running) => running.egui.on_window_event(&running.window, &event),
            None => false,
        };
        #[cfg(not(feature = "egui"))]
        let consumed = false;

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(running) = &mut self.running {
                    running.gpu.resize(physical_size);
                }
                self.input
                    .set_window_size(physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(running) = &self.running {
                    running.window.request_redraw();
                }
            }
            event => self.input.handle_window_event(&event, consumed),
        }
    }
}
