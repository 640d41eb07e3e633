use std::fmt;

/// Edge lengths the texture manager can allocate. 3D images are cubic, so
/// the largest entry bounds the 3D allocation at 256³ RGBA32F texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TextureSize {
    S32,
    S64,
    #[default]
    S128,
    S256,
}

impl TextureSize {
    pub const ALL: [TextureSize; 4] = [
        TextureSize::S32,
        TextureSize::S64,
        TextureSize::S128,
        TextureSize::S256,
    ];

    pub fn edge(self) -> u32 {
        match self {
            TextureSize::S32 => 32,
            TextureSize::S64 => 64,
            TextureSize::S128 => 128,
            TextureSize::S256 => 256,
        }
    }

    pub fn from_edge(edge: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.edge() == edge)
    }
}

impl fmt::Display for TextureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.edge())
    }
}

/// Deferred resize request. Requests inside one frame overwrite each other;
/// the frame loop drains the latch once, after the frame has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLatch {
    current: TextureSize,
    pending: Option<TextureSize>,
}

impl SizeLatch {
    pub fn new(current: TextureSize) -> Self {
        Self {
            current,
            pending: None,
        }
    }

    pub fn current(&self) -> TextureSize {
        self.current
    }

    /// Size the UI should display: the pending request if any.
    pub fn requested(&self) -> TextureSize {
        self.pending.unwrap_or(self.current)
    }

    pub fn request(&mut self, size: TextureSize) {
        self.pending = (size != self.current).then_some(size);
    }

    /// Returns the size to allocate, if it differs from the current one.
    pub fn take_pending(&mut self) -> Option<TextureSize> {
        let next = self.pending.take()?;
        self.current = next;
        Some(next)
    }
}
