use winit::dpi::PhysicalSize;

use crate::params::NoiseParameters;
use crate::size::{SizeLatch, TextureSize};
use crate::view::{ChannelView, ViewState};

/// Everything the GUI may edit between frames. Owned by the window loop and
/// lent to the GUI, the dispatcher, and the compositor by reference.
#[derive(Debug, Clone)]
pub struct Session {
    pub params: NoiseParameters,
    pub view: ViewState,
    size: SizeLatch,
    screen: PhysicalSize<u32>,
    export_requested: bool,
    exit_requested: bool,
}

impl Session {
    pub fn new(
        params: NoiseParameters,
        view: ViewState,
        size: TextureSize,
        screen: PhysicalSize<u32>,
    ) -> Self {
        Self {
            params,
            view,
            size: SizeLatch::new(size),
            screen,
            export_requested: false,
            exit_requested: false,
        }
    }

    pub fn texture_size(&self) -> TextureSize {
        self.size.current()
    }

    pub fn requested_size(&self) -> TextureSize {
        self.size.requested()
    }

    pub fn request_size(&mut self, size: TextureSize) {
        self.size.request(size);
    }

    /// Drained by the frame loop after the frame that observed the request.
    pub fn take_pending_size(&mut self) -> Option<TextureSize> {
        self.size.take_pending()
    }

    pub fn set_view_channel(&mut self, channel: ChannelView) {
        self.view.channel = channel;
    }

    pub fn screen(&self) -> PhysicalSize<u32> {
        self.screen
    }

    pub fn screen_resized(&mut self, size: PhysicalSize<u32>) {
        if size.width > 0 && size.height > 0 {
            self.screen = size;
        }
    }

    pub fn request_export(&mut self) {
        self.export_requested = true;
    }

    pub fn take_export_request(&mut self) -> bool {
        std::mem::take(&mut self.export_requested)
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}
