use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;
use winit::dpi::PhysicalSize;

use super::compositor::Compositor;
use super::context::GpuContext;
use super::dispatch::{ImageWritten, NoiseDispatcher, WORK_GROUP_SIZE};
use super::readback;
use super::shader::ShaderLoader;
use super::textures::NoiseTextures;
use crate::export::{self, ExportError, ExportReport};
use crate::gui::{Gui, GuiFrame};
use crate::session::Session;
use crate::types::{AdapterProfile, RendererConfig};

/// Owns every GPU resource of the window and runs one frame at a time.
pub(crate) struct GpuState {
    context: GpuContext,
    textures: NoiseTextures,
    dispatcher: NoiseDispatcher,
    compositor: Compositor,
    last_frame: Instant,
    frame_time: Duration,
    frames_since_report: u32,
    last_report: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, config.gpu_power, config.vsync)?;

        let loader = ShaderLoader::new(&config.shader_dir)
            .with_define("WORK_GROUP_SIZE", WORK_GROUP_SIZE);
        let dispatcher = NoiseDispatcher::new(&context.device, &loader)
            .context("failed to build noise kernels")?;
        let compositor = Compositor::new(&context.device, &loader, context.surface_format)
            .context("failed to build compositor")?;
        let textures = NoiseTextures::new(&context.device, config.texture_size);
        debug!(
            size = %config.texture_size,
            shader_dir = %config.shader_dir.display(),
            "GPU pipeline ready"
        );

        let now = Instant::now();
        Ok(Self {
            context,
            textures,
            dispatcher,
            compositor,
            last_frame: now,
            frame_time: Duration::ZERO,
            frames_since_report: 0,
            last_report: now,
        })
    }

    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub(crate) fn surface_format(&self) -> wgpu::TextureFormat {
        self.context.surface_format
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn reconfigure(&self) {
        self.context.reconfigure();
    }

    /// Dispatch, composite, overlay, present. The returned token names the
    /// image this frame wrote, for an export that follows.
    pub(crate) fn render(
        &mut self,
        session: &Session,
        gui: &mut Gui,
        gui_frame: GuiFrame,
    ) -> Result<ImageWritten, wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        self.track_frame_time();

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let device = &self.context.device;
        let queue = &self.context.queue;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });

        let written = self.dispatcher.dispatch(
            &mut encoder,
            device,
            queue,
            &session.params,
            &session.view,
            &self.textures,
        );
        self.compositor.draw(
            &mut encoder,
            device,
            queue,
            &view,
            &written,
            &self.textures,
            session,
        );
        let gui_commands = gui.paint(device, queue, &mut encoder, &view, gui_frame);

        queue.submit(gui_commands.into_iter().chain(Some(encoder.finish())));
        frame.present();
        Ok(written)
    }

    /// Reads back the image written this frame and writes the dump. Errors
    /// are returned to the caller; nothing here ends the session.
    pub(crate) fn export(
        &self,
        written: &ImageWritten,
        path: &Path,
        png_preview: bool,
    ) -> Result<ExportReport, ExportError> {
        export_image(
            &self.context.device,
            &self.context.queue,
            &self.textures,
            written,
            path,
            png_preview,
        )
    }

    /// End-of-frame hook: applies a latched size change, if any.
    pub(crate) fn apply_pending_size(&mut self, session: &mut Session) -> bool {
        apply_latched_size(&self.context.device, &mut self.textures, session)
    }

    fn track_frame_time(&mut self) {
        let now = Instant::now();
        self.frame_time = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;

        self.frames_since_report += 1;
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_report as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                size = %self.textures.current_size(),
                "render stats"
            );
            self.frames_since_report = 0;
            self.last_report = now;
        }
    }
}

fn export_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    textures: &NoiseTextures,
    written: &ImageWritten,
    path: &Path,
    png_preview: bool,
) -> Result<ExportReport, ExportError> {
    let image = readback::read_image(device, queue, textures, written)?;
    let bytes_written = export::write_dump(path, &image)?;
    let preview = if png_preview {
        export::write_png_preview(path, &image)?
    } else {
        None
    };
    Ok(ExportReport {
        path: path.to_path_buf(),
        bytes_written,
        preview,
    })
}

fn apply_latched_size(
    device: &wgpu::Device,
    textures: &mut NoiseTextures,
    session: &mut Session,
) -> bool {
    match session.take_pending_size() {
        Some(size) => textures.resize(device, size),
        None => false,
    }
}
