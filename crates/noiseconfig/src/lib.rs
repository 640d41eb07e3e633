use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Texture edges the renderer can allocate.
pub const SUPPORTED_SIZES: [u32; 4] = [32, 64, 128, 256];

pub const MIN_FREQUENCY: u32 = 1;
pub const MAX_FREQUENCY: u32 = 64;
pub const MIN_OCTAVES: u32 = 1;
pub const MAX_OCTAVES: u32 = 32;

const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoiseToyConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub texture: TextureSection,
    #[serde(default)]
    pub shaders: ShaderSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerEntry>,
}

impl Default for NoiseToyConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window: WindowSection::default(),
            texture: TextureSection::default(),
            shaders: ShaderSection::default(),
            export: ExportSection::default(),
            layers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
    pub gpu_power: GpuPower,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            title: "NoiseToy".to_string(),
            vsync: false,
            gpu_power: GpuPower::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuPower {
    Low,
    #[default]
    High,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextureSection {
    pub size: u32,
    pub mode: TextureMode,
    pub layering: Layering,
    pub view: ChannelSelector,
    pub grayscale: bool,
    pub slice: f32,
}

impl Default for TextureSection {
    fn default() -> Self {
        Self {
            size: 128,
            mode: TextureMode::D2,
            layering: Layering::None,
            view: ChannelSelector::All,
            grayscale: false,
            slice: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum TextureMode {
    #[default]
    #[serde(rename = "2d")]
    D2,
    #[serde(rename = "3d")]
    D3,
}

impl TextureMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "2d" | "2" => Some(Self::D2),
            "3d" | "3" => Some(Self::D3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layering {
    #[default]
    None,
    Multiply,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSelector {
    R,
    G,
    B,
    A,
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShaderSection {
    pub dir: PathBuf,
}

impl Default for ShaderSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("shaders"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportSection {
    pub path: PathBuf,
    pub png: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output/out.dat"),
            png: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerChannel {
    R,
    G,
    B,
    A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoiseKindSetting {
    #[default]
    Perlin,
    Worley,
    WorleyInverted,
}

/// Overrides one `(channel, role)` layer of the built-in parameter set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayerEntry {
    pub channel: LayerChannel,
    #[serde(default)]
    pub role: LayerRole,
    #[serde(default)]
    pub kind: NoiseKindSetting,
    #[serde(default)]
    pub seed: f32,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_frequency() -> u32 {
    4
}

fn default_octaves() -> u32 {
    4
}

impl NoiseToyConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: NoiseToyConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        validate_size(self.texture.size)?;

        let slice = self.texture.slice;
        if !slice.is_finite() || !(0.0..=1.0).contains(&slice) {
            return Err(ConfigError::Invalid(format!(
                "texture slice {slice} must be within [0, 1]"
            )));
        }

        let mut seen = BTreeSet::new();
        for (index, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|reason| ConfigError::Invalid(format!("layers[{index}]: {reason}")))?;
            if !seen.insert((layer.channel, layer.role)) {
                return Err(ConfigError::Invalid(format!(
                    "layers[{index}]: duplicate entry for channel {:?} role {:?}",
                    layer.channel, layer.role
                )));
            }
        }

        Ok(())
    }
}

impl LayerEntry {
    fn validate(&self) -> Result<(), String> {
        if !self.seed.is_finite() {
            return Err(format!("seed {} must be finite", self.seed));
        }
        validate_frequency(self.frequency)?;
        if !(MIN_OCTAVES..=MAX_OCTAVES).contains(&self.octaves) {
            return Err(format!(
                "octaves {} must be within {MIN_OCTAVES}..={MAX_OCTAVES}",
                self.octaves
            ));
        }
        Ok(())
    }
}

pub fn validate_size(size: u32) -> Result<(), ConfigError> {
    if SUPPORTED_SIZES.contains(&size) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "texture size {size} is not one of {SUPPORTED_SIZES:?}"
        )))
    }
}

fn validate_frequency(frequency: u32) -> Result<(), String> {
    if frequency.is_power_of_two() && (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency) {
        Ok(())
    } else {
        Err(format!(
            "frequency {frequency} must be a power of two within {MIN_FREQUENCY}..={MAX_FREQUENCY}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> &'static str {
        r#"
version = 1

[window]
width = 1280
height = 720
vsync = true

[texture]
size = 64
mode = "3d"
layering = "multiply"
view = "g"
slice = 0.25

[shaders]
dir = "assets/shaders"

[export]
path = "dumps/noise.dat"
png = true

[[layers]]
channel = "r"
kind = "worley-inverted"
seed = 3.5
frequency = 16
octaves = 8

[[layers]]
channel = "r"
role = "secondary"
kind = "perlin"
frequency = 2
"#
    }

    #[test]
    fn parses_sample_config() {
        let config = NoiseToyConfig::from_toml_str(sample_config()).expect("config parses");
        assert_eq!(config.window.width, 1280);
        assert!(config.window.vsync);
        assert_eq!(config.window.title, "NoiseToy");
        assert_eq!(config.texture.size, 64);
        assert_eq!(config.texture.mode, TextureMode::D3);
        assert_eq!(config.texture.layering, Layering::Multiply);
        assert_eq!(config.texture.view, ChannelSelector::G);
        assert_eq!(config.shaders.dir, PathBuf::from("assets/shaders"));
        assert!(config.export.png);
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[0].kind, NoiseKindSetting::WorleyInverted);
        assert_eq!(config.layers[0].role, LayerRole::Primary);
        assert_eq!(config.layers[1].role, LayerRole::Secondary);
        assert_eq!(config.layers[1].octaves, 4);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = NoiseToyConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, NoiseToyConfig::default());
        assert_eq!(config.texture.size, 128);
        assert_eq!(config.export.path, PathBuf::from("output/out.dat"));
    }

    #[test]
    fn rejects_unsupported_size() {
        let err = NoiseToyConfig::from_toml_str("[texture]\nsize = 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("100")));
    }

    #[test]
    fn rejects_non_power_of_two_frequency() {
        let input = "[[layers]]\nchannel = \"b\"\nfrequency = 12\n";
        let err = NoiseToyConfig::from_toml_str(input).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("layers[0]")));
    }

    #[test]
    fn rejects_out_of_range_octaves() {
        for octaves in [0, 33] {
            let input = format!("[[layers]]\nchannel = \"a\"\noctaves = {octaves}\n");
            assert!(NoiseToyConfig::from_toml_str(&input).is_err(), "{octaves}");
        }
    }

    #[test]
    fn rejects_unknown_channel() {
        let err = NoiseToyConfig::from_toml_str("[[layers]]\nchannel = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_duplicate_layers() {
        let input = "[[layers]]\nchannel = \"r\"\n\n[[layers]]\nchannel = \"r\"\nrole = \"primary\"\n";
        let err = NoiseToyConfig::from_toml_str(input).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("duplicate")));
    }

    #[test]
    fn rejects_slice_outside_unit_range() {
        let err = NoiseToyConfig::from_toml_str("[texture]\nslice = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn serialised_config_parses_back() {
        let config = NoiseToyConfig::from_toml_str(sample_config()).unwrap();
        let text = config.to_toml_string().expect("serialise");
        assert!(text.contains("mode = \"3d\""));
        assert!(text.contains("kind = \"worley-inverted\""));
        assert_eq!(NoiseToyConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn texture_mode_parses_cli_spellings() {
        assert_eq!(TextureMode::parse("2D"), Some(TextureMode::D2));
        assert_eq!(TextureMode::parse("3d"), Some(TextureMode::D3));
        assert_eq!(TextureMode::parse("4d"), None);
    }
}
