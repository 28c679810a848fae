//! Sort & Drop: drag each piece into the bin of its kind.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`:
//!
//!   1. `begin_frame()` measures the wall-clock delta and feeds the fixed-step accumulator
//!   2. the puzzle file is polled for changes (reload rebuilds the session at the title)
//!   3. `while should_step()` feeds one pointer sample per step into the [`Session`]
//!   4. session events are drained and logged
//!   5. the board is rebuilt as flat quads, then the egui HUD is composited on top
//!
//! The first argument, when given, is the puzzle file path.

mod camera_rig;
mod config;
mod events;
mod manager;
mod piece;
#[cfg(test)]
mod replay;
mod round;
mod score;
mod session;
mod slot;

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{load_puzzle_from_path, FileWatcher};
use events::GameEvent;
use session::{GamePhase, Session};
use sorter_core::clock::FrameClock;
use sorter_core::input::{InputState, Key, MouseBtn};
use sorter_hud::{HudModel, HudOverlay, SessionStats};
use sorter_platform::window::PlatformConfig;
use sorter_render::{Camera2D, GpuContext, QuadMesh, QuadPipeline, QuadVertex};

const DEFAULT_PUZZLE_PATH: &str = "assets/puzzles/recycling.json";

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.11,
    g: 0.13,
    b: 0.16,
    a: 1.0,
};
const SLOT_PAD_ALPHA: f32 = 0.35;
const SLOT_FRAME_THICKNESS: f32 = 0.08;
const PIECE_OUTLINE: [f32; 4] = [0.05, 0.05, 0.05, 1.0];
const DRAG_HIGHLIGHT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

struct ShellState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    input: InputState,
    camera: Camera2D,
    quad_pipeline: QuadPipeline,
    hud: HudOverlay,

    puzzle_path: PathBuf,
    puzzle_watcher: FileWatcher,
    session: Session,

    // Rebuilt on the CPU each frame; GPU buffers grow (power-of-two) but never shrink.
    mesh: QuadMesh,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl ShellState {
    fn new(window: Arc<Window>, puzzle_path: PathBuf) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to initialise the GPU: {err}"));
        let quad_pipeline = QuadPipeline::new(&gpu.device, gpu.surface_format);
        let hud = HudOverlay::new(&gpu.device, gpu.surface_format, &window);

        let puzzle_watcher = FileWatcher::new(puzzle_path.clone());
        let puzzle = load_puzzle_from_path(&puzzle_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load initial puzzle '{}': {}",
                puzzle_path.display(),
                err
            );
        });
        let session = Session::new(&puzzle);

        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        if let Some(rig) = session.camera() {
            camera.position = rig.position;
            camera.zoom = rig.zoom;
        }

        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = quad_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Self {
            window,
            gpu,
            clock: FrameClock::new(),
            input: InputState::new(),
            camera,
            quad_pipeline,
            hud,
            puzzle_path,
            puzzle_watcher,
            session,
            mesh: QuadMesh::with_capacity(64),
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        }
    }

    fn reload_puzzle(&mut self, reason: &str) {
        match load_puzzle_from_path(&self.puzzle_path) {
            Ok(puzzle) => {
                self.session = Session::new(&puzzle);
                log::info!(
                    "Puzzle reloaded ({}): '{}' with {} slots and a pool of {}",
                    reason,
                    puzzle.puzzle_id,
                    puzzle.slots.len(),
                    puzzle.pool_size()
                );
            }
            Err(err) => {
                log::error!("Puzzle reload failed ({}), keeping current session: {}", reason, err);
            }
        }
    }

    fn handle_hotkeys(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.is_just_pressed(Key::Escape) {
            log::info!("Escape pressed, exiting.");
            event_loop.exit();
            return;
        }
        if self.input.is_just_pressed(Key::F3) {
            self.hud.toggle_debug();
        }
        if self.input.is_just_pressed(Key::Enter) && self.session.phase() == GamePhase::Title {
            self.session.start_game();
        }
        if self.input.is_just_pressed(Key::R) && matches!(self.session.phase(), GamePhase::Over(_)) {
            self.session.restart_game();
        }
    }

    fn drain_session_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                GameEvent::Cue(cue) => log::debug!("Sound cue: {}", cue.label()),
                GameEvent::ScoreChanged(score) => log::debug!("Score is now {score}"),
                other => log::info!("Session event: {other:?}"),
            }
        }
    }

    fn build_mesh(&mut self) {
        self.mesh.clear();

        let pad_size = Vec2::splat(self.session.snap_threshold());
        for slot in self.session.slots() {
            let [r, g, b, _] = slot.visual.color;
            self.mesh
                .push_rect(slot.position, pad_size, [r, g, b, SLOT_PAD_ALPHA]);
            self.mesh.push_frame(
                slot.position,
                pad_size,
                SLOT_FRAME_THICKNESS,
                slot.visual.color,
            );
        }

        let manager = self.session.manager();
        let dragging = self.session.dragging();
        let drawn = manager
            .active()
            .iter()
            .copied()
            .filter(|&id| Some(id) != dragging)
            .chain(dragging);
        for id in drawn {
            let Some(piece) = manager.piece(id) else {
                continue;
            };
            let size = Vec2::splat(piece.size);
            let outline = if Some(id) == dragging {
                DRAG_HIGHLIGHT
            } else {
                PIECE_OUTLINE
            };
            self.mesh.push_rect(piece.position, size, piece.visual.color);
            self.mesh
                .push_frame(piece.position, size, piece.size * 0.08, outline);
        }
    }

    fn upload_mesh(&mut self) {
        let vertex_count = self.mesh.vertices.len();
        let index_count = self.mesh.indices.len();
        self.ensure_mesh_capacity(vertex_count, index_count);
        if vertex_count > 0 {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.mesh.vertices),
            );
        }
        if index_count > 0 {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.mesh.indices));
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn hud_model(&self) -> HudModel {
        let ui = self.session.ui();
        let manager = self.session.manager();
        let round = manager.round();
        HudModel {
            score_text: ui.score_text.clone(),
            start_visible: ui.start_visible,
            end_visible: ui.end_visible,
            end_text: ui.end_text.clone(),
            restart_visible: ui.restart_visible,
            stats: Some(SessionStats {
                puzzle_id: self.session.puzzle_id().to_string(),
                seed: self.session.seed(),
                round: round.round,
                batch_size: round.batch_size,
                placed_in_round: round.placed_in_round,
                active: manager.active().len(),
                queued: manager.queue_len(),
                target: self.session.score().target(),
                ramp_label: format!("{:?}", manager.ramp()).to_lowercase(),
                quads: self.mesh.quad_count() as u32,
            }),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }

        self.clock.begin_frame();

        if self.puzzle_watcher.should_reload() {
            self.reload_puzzle("file watcher");
        }

        // Edges are delivered on the first step only so a click is not handled twice.
        let dt = self.clock.fixed_dt as f32;
        let mut first_step = true;
        while self.clock.should_step() {
            let world = self.camera.screen_to_world(self.input.cursor());
            let sample = self.input.pointer_sample(world);
            if first_step {
                self.handle_hotkeys(event_loop);
                self.session.update(dt, sample);
                first_step = false;
            } else {
                self.session.update(dt, sample.without_edges());
            }
        }
        self.drain_session_events();

        if let Some(rig) = self.session.camera() {
            self.camera.position = rig.position;
            self.camera.zoom = rig.zoom;
        }

        self.build_mesh();
        self.upload_mesh();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let model = self.hud_model();
        let (hud_primitives, hud_textures_delta, hud_actions) =
            self.hud.prepare(&self.window, &self.clock, &model);

        if hud_actions.start {
            self.session.start_game();
        }
        if hud_actions.restart {
            self.session.restart_game();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Board Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            let index_count = self.mesh.indices.len() as u32;
            if index_count > 0 {
                render_pass.set_pipeline(&self.quad_pipeline.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        self.hud.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &hud_primitives,
            &hud_textures_delta,
            &screen_descriptor,
        );

        {
            let mut hud_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("HUD Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.hud
                .paint(&mut hud_pass, &hud_primitives, &screen_descriptor);
        }

        self.hud.cleanup(&hud_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // A press landing on a frame with zero steps must survive to the next frame.
        if self.clock.steps_this_frame > 0 {
            self.input.end_frame();
        }
    }
}

struct App {
    config: PlatformConfig,
    puzzle_path: PathBuf,
    state: Option<ShellState>,
}

impl App {
    fn new(puzzle_path: PathBuf) -> Self {
        Self {
            config: PlatformConfig::default(),
            puzzle_path,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = sorter_platform::window::create_window(event_loop, &self.config)
            .unwrap_or_else(|err| panic!("Failed to create window: {err}"));
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(ShellState::new(window, self.puzzle_path.clone()));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let hud_consumed = state.hud.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !hud_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let Some(btn) = map_mouse_button(button) else {
                    return;
                };
                match button_state {
                    // A click on a HUD button must not also grab a piece underneath it.
                    ElementState::Pressed if !hud_consumed => state.input.mouse_down(btn),
                    ElementState::Pressed => {}
                    // Releases always go through so a drag never gets stuck.
                    ElementState::Released => state.input.mouse_up(btn),
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.set_cursor(position.x, position.y);
            }

            WindowEvent::RedrawRequested => state.redraw(event_loop),

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<QuadVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Board Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Board Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let puzzle_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PUZZLE_PATH));
    log::info!("Sort & Drop starting with puzzle '{}'", puzzle_path.display());

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(puzzle_path);
    event_loop.run_app(&mut app).expect("Event loop error");
}
