//! Screen-space HUD drawn with egui over the board.
//!
//! Rendering follows the egui-wgpu split: `prepare()` runs the UI and tessellates,
//! `upload()` pushes textures and buffers through the frame encoder, `paint()` draws into
//! a pass created with `forget_lifetime()`, and `cleanup()` frees released textures.
//!
//! The score, start and end widgets are always live. The debug window is toggled with F3.

use sorter_core::clock::FrameClock;
use winit::window::Window;

/// What the HUD should show this frame. Built by the host from session state.
#[derive(Debug, Clone, Default)]
pub struct HudModel {
    pub score_text: String,
    pub start_visible: bool,
    pub end_visible: bool,
    pub end_text: String,
    pub restart_visible: bool,
    pub stats: Option<SessionStats>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub puzzle_id: String,
    pub seed: u64,
    pub round: u32,
    pub batch_size: usize,
    pub placed_in_round: usize,
    pub active: usize,
    pub queued: usize,
    pub target: u32,
    pub ramp_label: String,
    pub quads: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HudActions {
    pub start: bool,
    pub restart: bool,
}

pub struct HudOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl HudOverlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    /// Returns true when egui consumed the event (e.g. a click on a HUD button).
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!("Debug panel: {}", if self.debug_visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        model: &HudModel,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        HudActions,
    ) {
        let mut actions = HudActions::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            score_panel(ctx, model);
            if model.start_visible {
                start_panel(ctx, &mut actions);
            }
            if model.end_visible {
                end_panel(ctx, model, &mut actions);
            }
            if debug_visible {
                debug_panel(ctx, clock, model.stats.as_ref());
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn score_panel(ctx: &egui::Context, model: &HudModel) {
    egui::Area::new(egui::Id::new("hud_score"))
        .anchor(egui::Align2::RIGHT_TOP, [-24.0, 16.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!("Score: {}", model.score_text))
                    .size(28.0)
                    .strong(),
            );
        });
}

fn start_panel(ctx: &egui::Context, actions: &mut HudActions) {
    egui::Window::new("hud_start")
        .title_bar(false)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new("Sort & Drop").size(40.0));
                ui.label("Drag every piece into the bin that matches it.");
                ui.add_space(12.0);
                if ui
                    .button(egui::RichText::new("Start").size(24.0))
                    .clicked()
                {
                    actions.start = true;
                }
                ui.small("or press Enter");
            });
        });
}

fn end_panel(ctx: &egui::Context, model: &HudModel, actions: &mut HudActions) {
    egui::Window::new("hud_end")
        .title_bar(false)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new(&model.end_text).size(32.0));
                if model.restart_visible {
                    ui.add_space(12.0);
                    if ui
                        .button(egui::RichText::new("Play again").size(24.0))
                        .clicked()
                    {
                        actions.restart = true;
                    }
                    ui.small("or press R");
                }
            });
        });
}

fn debug_panel(ctx: &egui::Context, clock: &FrameClock, stats: Option<&SessionStats>) {
    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
            ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
            ui.label(format!("Steps this frame: {}", clock.steps_this_frame));
            ui.label(format!("Total steps: {}", clock.fixed_step_count));
            if let Some(stats) = stats {
                ui.separator();
                ui.label(format!("Puzzle: {} (seed {})", stats.puzzle_id, stats.seed));
                ui.label(format!(
                    "Round {}: {}/{} placed, ramp {}",
                    stats.round, stats.placed_in_round, stats.batch_size, stats.ramp_label
                ));
                ui.label(format!("Active: {}  Queued: {}", stats.active, stats.queued));
                ui.label(format!("Target: {}", stats.target));
                ui.label(format!("Quads: {}", stats.quads));
            }
        });
}
