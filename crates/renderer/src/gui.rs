//! egui control panel and the glue that feeds it winit events and paints it
//! on top of the composite pass.

use std::time::Duration;

use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::params::{
    Channel, Frequency, LayerRole, NoiseKind, NoiseLayerConfig, MAX_OCTAVES, MIN_OCTAVES,
};
use crate::session::Session;
use crate::size::TextureSize;
use crate::view::{ChannelView, Dimension, LayeringMode};

/// Read-only numbers shown at the bottom of the panel.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameStats {
    pub frame_time: Duration,
    pub adapter: String,
}

/// Tessellated output of one GUI pass, ready to be painted.
pub(crate) struct GuiFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    screen: ScreenDescriptor,
}

/// Texture updates not yet handed to the wgpu renderer.
///
/// egui emits each texture change once. A frame that never reaches `paint`
/// (surface lost or outdated) leaves its changes here for the next frame.
#[derive(Default)]
pub(crate) struct PendingTextures {
    delta: egui::TexturesDelta,
}

impl PendingTextures {
    pub fn queue(&mut self, delta: egui::TexturesDelta) {
        self.delta.append(delta);
    }

    pub fn take(&mut self) -> egui::TexturesDelta {
        std::mem::take(&mut self.delta)
    }
}

pub(crate) struct Gui {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    textures: PendingTextures,
}

impl Gui {
    pub fn new(
        window: &Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );
        let renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);
        Self {
            ctx,
            state,
            renderer,
            textures: PendingTextures::default(),
        }
    }

    /// Returns `true` when egui consumed the event (a focused text field
    /// swallowing a key press, for instance).
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        session: &mut Session,
        stats: &FrameStats,
    ) -> GuiFrame {
        let raw_input = self.state.take_egui_input(window);
        let output = self
            .ctx
            .run(raw_input, |ctx| draw_controls(ctx, session, stats));
        self.state
            .handle_platform_output(window, output.platform_output);

        self.textures.queue(output.textures_delta);

        let paint_jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let size = window.inner_size();
        GuiFrame {
            paint_jobs,
            screen: ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point: output.pixels_per_point,
            },
        }
    }

    /// Records the overlay pass on top of whatever `target` already holds.
    /// The returned command buffers must be submitted before the encoder.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        frame: GuiFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        let textures = self.textures.take();
        for (id, delta) in &textures.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let commands = self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &frame.paint_jobs,
            &frame.screen,
        );

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("gui pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer
                .render(&mut pass, &frame.paint_jobs, &frame.screen);
        }

        for id in &textures.free {
            self.renderer.free_texture(id);
        }
        commands
    }
}

pub(crate) fn draw_controls(ctx: &egui::Context, session: &mut Session, stats: &FrameStats) {
    egui::Window::new("Noise")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            for channel in Channel::ALL {
                egui::CollapsingHeader::new(format!("Channel {}", channel.label()))
                    .default_open(channel == Channel::R)
                    .show(ui, |ui| {
                        for role in LayerRole::ALL {
                            ui.label(role.label());
                            let id = format!("{}-{}", channel.label(), role.label());
                            layer_editor(ui, &id, session.params.get_mut(channel, role));
                        }
                    });
            }

            ui.separator();
            view_controls(ui, session);

            ui.separator();
            let mut requested = session.requested_size();
            egui::ComboBox::from_label("Texture size")
                .selected_text(requested.to_string())
                .show_ui(ui, |ui| {
                    for size in TextureSize::ALL {
                        ui.selectable_value(&mut requested, size, size.to_string());
                    }
                });
            if requested != session.requested_size() {
                session.request_size(requested);
            }

            if ui.button("Export").clicked() {
                session.request_export();
            }

            ui.separator();
            ui.label(format!(
                "{} texels, {:.2} ms/frame",
                session.texture_size(),
                stats.frame_time.as_secs_f64() * 1000.0
            ));
            ui.weak(&stats.adapter);
        });
}

fn layer_editor(ui: &mut egui::Ui, id: &str, layer: &mut NoiseLayerConfig) {
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt(format!("{id}-kind"))
            .selected_text(layer.kind.label())
            .show_ui(ui, |ui| {
                for kind in NoiseKind::ALL {
                    ui.selectable_value(&mut layer.kind, kind, kind.label());
                }
            });
        ui.add(egui::DragValue::new(&mut layer.seed).speed(0.1).prefix("seed "));
    });
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt(format!("{id}-frequency"))
            .selected_text(format!("freq {}", layer.frequency))
            .show_ui(ui, |ui| {
                for frequency in Frequency::all() {
                    ui.selectable_value(&mut layer.frequency, frequency, frequency.to_string());
                }
            });
        ui.add(egui::Slider::new(layer.octaves_mut(), MIN_OCTAVES..=MAX_OCTAVES).text("octaves"));
    });
    layer.normalise();
}

fn view_controls(ui: &mut egui::Ui, session: &mut Session) {
    egui::ComboBox::from_label("Layering")
        .selected_text(session.view.layering.label())
        .show_ui(ui, |ui| {
            for mode in LayeringMode::ALL {
                ui.selectable_value(&mut session.view.layering, mode, mode.label());
            }
        });

    let mut channel = session.view.channel;
    ui.horizontal(|ui| {
        for view in ChannelView::ALL {
            ui.selectable_value(&mut channel, view, view.label());
        }
    });
    if channel != session.view.channel {
        session.set_view_channel(channel);
    }

    ui.checkbox(&mut session.view.grayscale, "Grayscale");

    let mut volume = session.view.dimension.is_3d();
    if ui.checkbox(&mut volume, "3D").changed() {
        session.view.dimension = if volume { Dimension::D3 } else { Dimension::D2 };
    }
    if session.view.dimension.is_3d() {
        ui.add(egui::Slider::new(session.view.slice_mut(), 0.0..=1.0).text("slice"));
        let slice = session.view.slice();
        session.view.set_slice(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::NoiseParameters;
    use crate::view::ViewState;
    use winit::dpi::PhysicalSize;

    fn run_panel(session: &mut Session) {
        let ctx = egui::Context::default();
        let stats = FrameStats::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            draw_controls(ctx, session, &stats)
        });
    }

    #[test]
    fn skipped_frame_keeps_its_texture_uploads() {
        let ctx = egui::Context::default();
        let mut session = Session::new(
            NoiseParameters::default(),
            ViewState::default(),
            TextureSize::S128,
            PhysicalSize::new(800, 800),
        );
        let stats = FrameStats::default();
        let mut pending = PendingTextures::default();

        // The first pass uploads the font atlas; its frame is never painted.
        let first = ctx.run(egui::RawInput::default(), |ctx| {
            draw_controls(ctx, &mut session, &stats)
        });
        assert!(!first.textures_delta.set.is_empty());
        pending.queue(first.textures_delta);

        let second = ctx.run(egui::RawInput::default(), |ctx| {
            draw_controls(ctx, &mut session, &stats)
        });
        pending.queue(second.textures_delta);

        let delivered = pending.take();
        assert!(delivered
            .set
            .iter()
            .any(|(id, _)| *id == egui::TextureId::default()));
        assert!(pending.take().is_empty());
    }

    #[test]
    fn idle_panel_leaves_session_untouched() {
        let mut session = Session::new(
            NoiseParameters::default(),
            ViewState::default(),
            TextureSize::S128,
            PhysicalSize::new(800, 800),
        );
        let params = session.params.clone();
        let view = session.view;

        run_panel(&mut session);

        assert_eq!(session.params, params);
        assert_eq!(session.view, view);
        assert_eq!(session.take_pending_size(), None);
        assert!(!session.take_export_request());
    }
}
