use crate::params::Channel;

/// How the secondary layer of each channel combines with the primary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayeringMode {
    #[default]
    None,
    Multiply,
    Average,
}

impl LayeringMode {
    pub const ALL: [LayeringMode; 3] = [
        LayeringMode::None,
        LayeringMode::Multiply,
        LayeringMode::Average,
    ];

    pub fn shader_id(self) -> u32 {
        match self {
            LayeringMode::None => 0,
            LayeringMode::Multiply => 1,
            LayeringMode::Average => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayeringMode::None => "None",
            LayeringMode::Multiply => "Multiply",
            LayeringMode::Average => "Average",
        }
    }

    pub fn uses_secondary(self) -> bool {
        !matches!(self, LayeringMode::None)
    }
}

/// Which channel(s) the compositor displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelView {
    Single(Channel),
    #[default]
    All,
}

impl ChannelView {
    pub const ALL: [ChannelView; 5] = [
        ChannelView::Single(Channel::R),
        ChannelView::Single(Channel::G),
        ChannelView::Single(Channel::B),
        ChannelView::Single(Channel::A),
        ChannelView::All,
    ];

    /// `0..=3` selects a channel, `4` shows all of them.
    pub fn shader_id(self) -> u32 {
        match self {
            ChannelView::Single(channel) => channel.index() as u32,
            ChannelView::All => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChannelView::Single(channel) => channel.label(),
            ChannelView::All => "All",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    D2,
    D3,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::D2, Dimension::D3];

    /// Number of spatial axes, used as the exponent in texel counts.
    pub fn axes(self) -> u32 {
        match self {
            Dimension::D2 => 2,
            Dimension::D3 => 3,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Dimension::D2 => 0,
            Dimension::D3 => 1,
        }
    }

    pub fn is_3d(self) -> bool {
        matches!(self, Dimension::D3)
    }
}

/// Display state shared by the dispatcher and the compositor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub layering: LayeringMode,
    pub channel: ChannelView,
    pub grayscale: bool,
    pub dimension: Dimension,
    slice: f32,
}

impl ViewState {
    pub fn slice(&self) -> f32 {
        self.slice
    }

    pub fn set_slice(&mut self, slice: f32) {
        self.slice = if slice.is_finite() {
            slice.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub(crate) fn slice_mut(&mut self) -> &mut f32 {
        &mut self.slice
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            layering: LayeringMode::None,
            channel: ChannelView::All,
            grayscale: false,
            dimension: Dimension::D2,
            slice: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_blending_modes_use_secondary() {
        assert!(!LayeringMode::None.uses_secondary());
        assert!(LayeringMode::Multiply.uses_secondary());
        assert!(LayeringMode::Average.uses_secondary());
        let ids: Vec<u32> = LayeringMode::ALL.iter().map(|mode| mode.shader_id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn channel_view_ids_match_shader_contract() {
        let ids: Vec<u32> = ChannelView::ALL.iter().map(|view| view.shader_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn slice_is_clamped() {
        let mut view = ViewState::default();
        view.set_slice(1.5);
        assert_eq!(view.slice(), 1.0);
        view.set_slice(-0.2);
        assert_eq!(view.slice(), 0.0);
        view.set_slice(f32::NAN);
        assert_eq!(view.slice(), 0.0);
        view.set_slice(0.3);
        assert!((view.slice() - 0.3).abs() < f32::EPSILON);
    }
}
