use anyhow::Result;
use glam::Vec3;
use quadray_core::{Camera, Scene};
use quadray_render::Renderer;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod demo;
mod input;
mod timer;

use input::{InputState, MOUSE_SENSITIVITY, MOVEMENT_SPEED};
use timer::Timer;

/// Application state
struct App {
    window: Option<std::sync::Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Option<Scene>,

    camera: Camera,
    input: InputState,
    timer: Timer,

    // Set on camera movement, consumed by the next rendered frame.
    drop_signaled: bool,
    paused: bool,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            scene: None,
            camera: Camera::new(),
            input: InputState::default(),
            timer: Timer::new(),
            drop_signaled: false,
            paused: false,
        }
    }

    fn signal_drop(&mut self) {
        self.drop_signaled = true;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Quadray")
                .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720));

            let window = std::sync::Arc::new(
                event_loop
                    .create_window(window_attrs)
                    .expect("Failed to create window"),
            );

            let mut renderer = pollster::block_on(Renderer::new(window.clone()))
                .expect("Failed to initialize renderer");

            let mut scene = demo::create_scene().expect("Failed to build demo scene");
            renderer
                .attach_scene(&mut scene)
                .expect("Scene exceeds shading program capacity");

            self.camera.move_to(Vec3::new(0.0, 2.0, 3.0));
            self.camera.rescale(renderer.aspect());

            self.window = Some(window);
            self.renderer = Some(renderer);
            self.scene = Some(scene);

            log::info!("Window and renderer initialized");
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) =
                        renderer.resize((physical_size.width, physical_size.height))
                    {
                        log::error!("Resize failed: {e:?}");
                        event_loop.exit();
                        return;
                    }
                    self.camera.rescale(renderer.aspect());
                    log::info!("Resized to {}x{}", physical_size.width, physical_size.height);
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if button == MouseButton::Left {
                    self.input.set_rotating(state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.input.cursor_moved((position.x, position.y)) {
                    self.camera
                        .rotate(-dx * MOUSE_SENSITIVITY, -dy * MOUSE_SENSITIVITY);
                    self.signal_drop();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(keycode),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.input.key_pressed(keycode);
                }
                ElementState::Released => {
                    self.input.key_released(keycode);
                    match keycode {
                        KeyCode::Space => {
                            self.paused = !self.paused;
                            log::info!(
                                "{}",
                                if self.paused { "paused" } else { "resumed" }
                            );
                        }
                        KeyCode::KeyP => {
                            if let Some(renderer) = &mut self.renderer {
                                renderer.request_screenshot();
                            }
                        }
                        _ => {}
                    }
                }
            },
            WindowEvent::RedrawRequested => {
                self.timer.update();

                let movement = self.input.movement();
                if movement != Vec3::ZERO {
                    self.camera
                        .move_along(movement * MOVEMENT_SPEED * self.timer.dt());
                    self.signal_drop();
                }

                if !self.paused {
                    if let (Some(renderer), Some(scene)) =
                        (&mut self.renderer, &mut self.scene)
                    {
                        let result = renderer.render_frame(
                            &self.camera,
                            scene,
                            self.timer.t(),
                            self.drop_signaled,
                        );
                        self.drop_signaled = false;

                        if let Err(e) = result {
                            if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                                match surface_err {
                                    wgpu::SurfaceError::Lost => {
                                        let size = renderer.size();
                                        if let Err(e) = renderer.resize(size) {
                                            log::error!("Surface recovery failed: {e:?}");
                                            event_loop.exit();
                                        }
                                    }
                                    wgpu::SurfaceError::OutOfMemory => {
                                        log::error!("Out of memory!");
                                        event_loop.exit();
                                    }
                                    _ => {
                                        log::error!("Surface error: {surface_err:?}");
                                    }
                                }
                            } else {
                                log::error!("Render error: {e:?}");
                            }
                        }
                    }
                }

                // Progressive refinement wants a tick every vsync.
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting Quadray");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
