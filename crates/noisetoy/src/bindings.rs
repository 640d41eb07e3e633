use anyhow::{anyhow, Result};
use noiseconfig::{
    ChannelSelector, GpuPower, LayerChannel, LayerEntry, LayerRole as ConfigLayerRole, Layering,
    NoiseKindSetting, NoiseToyConfig, TextureMode,
};
use renderer::{
    Channel, ChannelView, Dimension, Frequency, GpuPowerPreference, LayerRole, LayeringMode,
    NoiseKind, NoiseLayerConfig, NoiseParameters, RendererConfig, TextureSize, ViewState,
};

pub fn renderer_config_from(config: &NoiseToyConfig) -> Result<RendererConfig> {
    let texture_size = TextureSize::from_edge(config.texture.size)
        .ok_or_else(|| anyhow!("unsupported texture size {}", config.texture.size))?;

    let mut view = ViewState::default();
    view.layering = map_layering(config.texture.layering);
    view.channel = map_view(config.texture.view);
    view.grayscale = config.texture.grayscale;
    view.dimension = map_mode(config.texture.mode);
    view.set_slice(config.texture.slice);

    let params = params_from_layers(&config.layers)?;
    if !view.layering.uses_secondary()
        && config
            .layers
            .iter()
            .any(|layer| layer.role == ConfigLayerRole::Secondary)
    {
        tracing::warn!("secondary layers are configured but layering is none; they stay hidden");
    }

    Ok(RendererConfig {
        window_size: (config.window.width, config.window.height),
        title: config.window.title.clone(),
        shader_dir: config.shaders.dir.clone(),
        texture_size,
        export_path: config.export.path.clone(),
        export_png: config.export.png,
        vsync: config.window.vsync,
        gpu_power: map_power(config.window.gpu_power),
        params,
        view,
    })
}

/// Built-in parameters with every configured layer applied on top.
pub fn params_from_layers(layers: &[LayerEntry]) -> Result<NoiseParameters> {
    let mut params = NoiseParameters::default();
    for layer in layers {
        let frequency = Frequency::from_value(layer.frequency).ok_or_else(|| {
            anyhow!(
                "layer frequency {} must be a power of two in 1..=64",
                layer.frequency
            )
        })?;
        params.set(
            map_channel(layer.channel),
            map_role(layer.role),
            NoiseLayerConfig::new(map_kind(layer.kind), layer.seed, frequency, layer.octaves),
        );
    }
    Ok(params)
}

/// Every slot of `params` as config entries, primary layers first.
pub fn layers_from_params(params: &NoiseParameters) -> Vec<LayerEntry> {
    let mut layers = Vec::new();
    for role in LayerRole::ALL {
        for channel in Channel::ALL {
            let layer = params.get(channel, role);
            layers.push(LayerEntry {
                channel: unmap_channel(channel),
                role: unmap_role(role),
                kind: unmap_kind(layer.kind),
                seed: layer.seed,
                frequency: layer.frequency.value(),
                octaves: layer.octaves(),
            });
        }
    }
    layers
}

fn map_kind(kind: NoiseKindSetting) -> NoiseKind {
    match kind {
        NoiseKindSetting::Perlin => NoiseKind::Perlin,
        NoiseKindSetting::Worley => NoiseKind::Worley,
        NoiseKindSetting::WorleyInverted => NoiseKind::WorleyInverted,
    }
}

fn unmap_kind(kind: NoiseKind) -> NoiseKindSetting {
    match kind {
        NoiseKind::Perlin => NoiseKindSetting::Perlin,
        NoiseKind::Worley => NoiseKindSetting::Worley,
        NoiseKind::WorleyInverted => NoiseKindSetting::WorleyInverted,
    }
}

fn map_channel(channel: LayerChannel) -> Channel {
    match channel {
        LayerChannel::R => Channel::R,
        LayerChannel::G => Channel::G,
        LayerChannel::B => Channel::B,
        LayerChannel::A => Channel::A,
    }
}

fn unmap_channel(channel: Channel) -> LayerChannel {
    match channel {
        Channel::R => LayerChannel::R,
        Channel::G => LayerChannel::G,
        Channel::B => LayerChannel::B,
        Channel::A => LayerChannel::A,
    }
}

fn map_role(role: ConfigLayerRole) -> LayerRole {
    match role {
        ConfigLayerRole::Primary => LayerRole::Primary,
        ConfigLayerRole::Secondary => LayerRole::Secondary,
    }
}

fn unmap_role(role: LayerRole) -> ConfigLayerRole {
    match role {
        LayerRole::Primary => ConfigLayerRole::Primary,
        LayerRole::Secondary => ConfigLayerRole::Secondary,
    }
}

fn map_layering(layering: Layering) -> LayeringMode {
    match layering {
        Layering::None => LayeringMode::None,
        Layering::Multiply => LayeringMode::Multiply,
        Layering::Average => LayeringMode::Average,
    }
}

fn map_view(view: ChannelSelector) -> ChannelView {
    match view {
        ChannelSelector::R => ChannelView::Single(Channel::R),
        ChannelSelector::G => ChannelView::Single(Channel::G),
        ChannelSelector::B => ChannelView::Single(Channel::B),
        ChannelSelector::A => ChannelView::Single(Channel::A),
        ChannelSelector::All => ChannelView::All,
    }
}

fn map_mode(mode: TextureMode) -> Dimension {
    match mode {
        TextureMode::D2 => Dimension::D2,
        TextureMode::D3 => Dimension::D3,
    }
}

fn map_power(power: GpuPower) -> GpuPowerPreference {
    match power {
        GpuPower::Low => GpuPowerPreference::Low,
        GpuPower::High => GpuPowerPreference::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_renderer_state() {
        let renderer = renderer_config_from(&NoiseToyConfig::default()).unwrap();
        assert_eq!(renderer.texture_size, TextureSize::S128);
        assert_eq!(renderer.window_size, (800, 800));
        assert_eq!(renderer.title, "NoiseToy");
        assert_eq!(renderer.params, NoiseParameters::default());
        assert_eq!(renderer.view, ViewState::default());
    }

    #[test]
    fn layer_entries_override_their_slot_only() {
        let mut config = NoiseToyConfig::default();
        config.layers.push(LayerEntry {
            channel: LayerChannel::B,
            role: ConfigLayerRole::Secondary,
            kind: NoiseKindSetting::Worley,
            seed: 2.5,
            frequency: 16,
            octaves: 3,
        });

        let renderer = renderer_config_from(&config).unwrap();
        let defaults = NoiseParameters::default();
        let layer = renderer.params.get(Channel::B, LayerRole::Secondary);
        assert_eq!(layer.kind, NoiseKind::Worley);
        assert_eq!(layer.seed, 2.5);
        assert_eq!(layer.frequency.value(), 16);
        assert_eq!(layer.octaves(), 3);
        assert_eq!(
            renderer.params.get(Channel::B, LayerRole::Primary),
            defaults.get(Channel::B, LayerRole::Primary)
        );
        assert_eq!(
            renderer.params.get(Channel::R, LayerRole::Secondary),
            defaults.get(Channel::R, LayerRole::Secondary)
        );
    }

    #[test]
    fn view_settings_are_carried_over() {
        let mut config = NoiseToyConfig::default();
        config.texture.size = 64;
        config.texture.mode = TextureMode::D3;
        config.texture.layering = Layering::Average;
        config.texture.view = ChannelSelector::G;
        config.texture.grayscale = true;
        config.texture.slice = 0.25;

        let renderer = renderer_config_from(&config).unwrap();
        assert_eq!(renderer.texture_size, TextureSize::S64);
        assert_eq!(renderer.view.dimension, Dimension::D3);
        assert_eq!(renderer.view.layering, LayeringMode::Average);
        assert_eq!(renderer.view.channel, ChannelView::Single(Channel::G));
        assert!(renderer.view.grayscale);
        assert_eq!(renderer.view.slice(), 0.25);
    }

    #[test]
    fn invalid_size_or_frequency_is_rejected() {
        let mut config = NoiseToyConfig::default();
        config.texture.size = 100;
        assert!(renderer_config_from(&config).is_err());

        let layer = LayerEntry {
            channel: LayerChannel::R,
            role: ConfigLayerRole::Primary,
            kind: NoiseKindSetting::Perlin,
            seed: 0.0,
            frequency: 12,
            octaves: 4,
        };
        assert!(params_from_layers(&[layer]).is_err());
    }

    #[test]
    fn exported_layers_rebuild_the_same_parameters() {
        let params = NoiseParameters::default();
        let layers = layers_from_params(&params);
        assert_eq!(layers.len(), 8);
        assert_eq!(params_from_layers(&layers).unwrap(), params);
    }
}
