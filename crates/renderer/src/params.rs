//! Per-channel noise configuration and its GPU-facing flat encoding.
//!
//! The store is addressed by `(Channel, LayerRole)`; the compute shader sees
//! a flat array of [`LAYER_SLOTS`] entries where primary layers occupy slots
//! `0..4` and secondary (blend) layers occupy slots `4..8`.

use std::fmt;

/// Output channels written by the noise kernel.
pub const CHANNEL_COUNT: usize = 4;

/// Layer roles per channel (primary plus one blend layer).
pub const LAYER_ROLE_COUNT: usize = 2;

/// Total number of parameter slots uploaded each frame.
pub const LAYER_SLOTS: usize = CHANNEL_COUNT * LAYER_ROLE_COUNT;

/// Octave range accepted by the noise kernel.
pub const MIN_OCTAVES: u32 = 1;
pub const MAX_OCTAVES: u32 = 32;

/// Noise algorithm selector. The discriminants are part of the shader contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoiseKind {
    #[default]
    Perlin,
    Worley,
    WorleyInverted,
}

impl NoiseKind {
    pub const ALL: [NoiseKind; 3] = [
        NoiseKind::Perlin,
        NoiseKind::Worley,
        NoiseKind::WorleyInverted,
    ];

    pub fn shader_id(self) -> u32 {
        match self {
            NoiseKind::Perlin => 0,
            NoiseKind::Worley => 1,
            NoiseKind::WorleyInverted => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NoiseKind::Perlin => "Perlin",
            NoiseKind::Worley => "Worley",
            NoiseKind::WorleyInverted => "Worley (inverted)",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Base frequency stored as a power-of-two exponent so only `1, 2, 4, .. 64`
/// are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency {
    index: u8,
}

impl Frequency {
    /// Largest exponent; `2^6 = 64`.
    pub const MAX_INDEX: u8 = 6;

    pub fn from_index(index: u8) -> Option<Self> {
        (index <= Self::MAX_INDEX).then_some(Self { index })
    }

    /// Accepts only exact powers of two in `1..=64`.
    pub fn from_value(value: u32) -> Option<Self> {
        if value == 0 || !value.is_power_of_two() {
            return None;
        }
        let index = value.trailing_zeros();
        u8::try_from(index).ok().and_then(Self::from_index)
    }

    pub fn value(self) -> u32 {
        1 << self.index
    }

    pub fn all() -> impl Iterator<Item = Frequency> {
        (0..=Self::MAX_INDEX).map(|index| Frequency { index })
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self { index: 2 }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Settings for a single noise layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseLayerConfig {
    pub kind: NoiseKind,
    pub seed: f32,
    pub frequency: Frequency,
    octaves: u32,
}

impl NoiseLayerConfig {
    pub fn new(kind: NoiseKind, seed: f32, frequency: Frequency, octaves: u32) -> Self {
        Self {
            kind,
            seed,
            frequency,
            octaves: octaves.clamp(MIN_OCTAVES, MAX_OCTAVES),
        }
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Mutable access for slider widgets; callers must go through
    /// [`NoiseLayerConfig::normalise`] afterwards.
    pub(crate) fn octaves_mut(&mut self) -> &mut u32 {
        &mut self.octaves
    }

    pub(crate) fn normalise(&mut self) {
        self.octaves = self.octaves.clamp(MIN_OCTAVES, MAX_OCTAVES);
        if !self.seed.is_finite() {
            self.seed = 0.0;
        }
    }
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self::new(NoiseKind::Perlin, 0.0, Frequency::default(), 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::R, Channel::G, Channel::B, Channel::A];

    pub fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
            Channel::A => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    Primary,
    Secondary,
}

impl LayerRole {
    pub const ALL: [LayerRole; LAYER_ROLE_COUNT] = [LayerRole::Primary, LayerRole::Secondary];

    fn index(self) -> usize {
        match self {
            LayerRole::Primary => 0,
            LayerRole::Secondary => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayerRole::Primary => "Primary",
            LayerRole::Secondary => "Secondary",
        }
    }
}

/// Flat slot used by the shader for a `(channel, role)` pair.
pub fn slot_index(channel: Channel, role: LayerRole) -> usize {
    role.index() * CHANNEL_COUNT + channel.index()
}

/// Parameter store for every channel and layer role.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseParameters {
    layers: [[NoiseLayerConfig; CHANNEL_COUNT]; LAYER_ROLE_COUNT],
}

impl NoiseParameters {
    pub fn get(&self, channel: Channel, role: LayerRole) -> &NoiseLayerConfig {
        &self.layers[role.index()][channel.index()]
    }

    pub fn get_mut(&mut self, channel: Channel, role: LayerRole) -> &mut NoiseLayerConfig {
        &mut self.layers[role.index()][channel.index()]
    }

    pub fn set(&mut self, channel: Channel, role: LayerRole, config: NoiseLayerConfig) {
        self.layers[role.index()][channel.index()] = config;
    }

    /// Slots in shader order: every primary layer, then every secondary layer.
    pub fn slots(&self) -> [NoiseLayerConfig; LAYER_SLOTS] {
        let mut slots = [NoiseLayerConfig::default(); LAYER_SLOTS];
        for role in LayerRole::ALL {
            for channel in Channel::ALL {
                slots[slot_index(channel, role)] = *self.get(channel, role);
            }
        }
        slots
    }
}

impl Default for NoiseParameters {
    fn default() -> Self {
        let primary = std::array::from_fn(|index| {
            NoiseLayerConfig::new(
                NoiseKind::Perlin,
                index as f32 * 17.0,
                Frequency::from_index(2).unwrap_or_default(),
                6,
            )
        });
        let secondary = std::array::from_fn(|index| {
            NoiseLayerConfig::new(
                NoiseKind::WorleyInverted,
                index as f32 * 31.0 + 5.0,
                Frequency::from_index(3).unwrap_or_default(),
                3,
            )
        });
        Self {
            layers: [primary, secondary],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_index_round_trips_to_power_of_two() {
        for index in 0..=Frequency::MAX_INDEX {
            let frequency = Frequency::from_index(index).expect("index in range");
            assert_eq!(frequency.value(), 1 << index);
            assert_eq!(Frequency::from_value(frequency.value()), Some(frequency));
            assert!((1..=64).contains(&frequency.value()));
        }
        assert_eq!(Frequency::from_index(7), None);
    }

    #[test]
    fn frequency_rejects_non_powers_of_two() {
        for value in [0, 3, 6, 12, 65, 128] {
            assert_eq!(Frequency::from_value(value), None, "value {value}");
        }
    }

    #[test]
    fn octaves_are_clamped() {
        let mut layer = NoiseLayerConfig::new(NoiseKind::Worley, 1.0, Frequency::default(), 0);
        assert_eq!(layer.octaves(), MIN_OCTAVES);
        let layer_max = NoiseLayerConfig::new(NoiseKind::Perlin, 1.0, Frequency::default(), 100);
        assert_eq!(layer_max.octaves(), MAX_OCTAVES);
        *layer.octaves_mut() = 0;
        layer.normalise();
        assert_eq!(layer.octaves(), MIN_OCTAVES);
    }

    #[test]
    fn slots_follow_channel_and_role_mapping() {
        let mut params = NoiseParameters::default();
        let marker = NoiseLayerConfig::new(
            NoiseKind::WorleyInverted,
            42.0,
            Frequency::from_value(64).unwrap(),
            9,
        );
        params.set(Channel::B, LayerRole::Secondary, marker);

        let slots = params.slots();
        assert_eq!(slot_index(Channel::B, LayerRole::Secondary), 6);
        assert_eq!(slots[6], marker);
        assert_eq!(slot_index(Channel::R, LayerRole::Primary), 0);
        assert_eq!(slot_index(Channel::A, LayerRole::Primary), 3);
        assert_eq!(slot_index(Channel::R, LayerRole::Secondary), 4);
    }

    #[test]
    fn every_slot_is_distinct() {
        let mut seen = [false; LAYER_SLOTS];
        for role in LayerRole::ALL {
            for channel in Channel::ALL {
                let slot = slot_index(channel, role);
                assert!(!seen[slot]);
                seen[slot] = true;
            }
        }
        assert!(seen.iter().all(|hit| *hit));
    }
}
