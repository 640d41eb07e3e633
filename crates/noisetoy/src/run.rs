use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use noiseconfig::NoiseToyConfig;
use renderer::Renderer;
use tracing_subscriber::EnvFilter;

use crate::bindings::{layers_from_params, params_from_layers, renderer_config_from};
use crate::cli::Cli;
use crate::paths::AppPaths;

pub fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;
    apply_overrides(&mut config, &cli);
    config
        .validate()
        .context("configuration is invalid after applying command-line overrides")?;

    if cli.print_config {
        let mut resolved = config.clone();
        if resolved.layers.is_empty() {
            resolved.layers = layers_from_params(&params_from_layers(&[])?);
        }
        print!("{}", resolved.to_toml_string()?);
        return Ok(());
    }

    let renderer_config = renderer_config_from(&config)?;
    tracing::info!(
        size = %renderer_config.texture_size,
        mode = ?renderer_config.view.dimension,
        shader_dir = %renderer_config.shader_dir.display(),
        export = %renderer_config.export_path.display(),
        "starting noisetoy"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(cli: &Cli) -> Result<NoiseToyConfig> {
    if let Some(path) = cli.config.as_ref() {
        if !path.is_file() {
            bail!("config file {} does not exist", path.display());
        }
        return read_config(path);
    }

    let paths = AppPaths::discover()?;
    let default_file = paths.config_file();
    if default_file.is_file() {
        read_config(&default_file)
    } else {
        tracing::debug!(
            config_dir = %paths.config_dir().display(),
            "no config file found; using built-in defaults"
        );
        Ok(NoiseToyConfig::default())
    }
}

fn read_config(path: &Path) -> Result<NoiseToyConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = NoiseToyConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), layers = config.layers.len(), "loaded config");
    Ok(config)
}

fn apply_overrides(config: &mut NoiseToyConfig, cli: &Cli) {
    if let Some(dir) = cli.shader_dir.as_ref() {
        config.shaders.dir = dir.clone();
    }
    if let Some(size) = cli.size {
        config.texture.size = size;
    }
    if let Some(mode) = cli.mode {
        config.texture.mode = mode;
    }
    if let Some(path) = cli.export_path.as_ref() {
        config.export.path = path.clone();
    }
    if cli.export_png {
        config.export.png = true;
    }
    if let Some((width, height)) = cli.window_size {
        config.window.width = width;
        config.window.height = height;
    }
    if cli.vsync {
        config.window.vsync = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use noiseconfig::TextureMode;
    use tempfile::TempDir;

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "noisetoy",
            "--size",
            "256",
            "--mode",
            "3d",
            "--export-path",
            "dump/noise.dat",
            "--export-png",
            "--shader-dir",
            "assets/shaders",
        ])
        .unwrap();
        let mut config = NoiseToyConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.texture.size, 256);
        assert_eq!(config.texture.mode, TextureMode::D3);
        assert_eq!(config.export.path, Path::new("dump/noise.dat"));
        assert!(config.export.png);
        assert_eq!(config.shaders.dir, Path::new("assets/shaders"));
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let cli = Cli::try_parse_from(["noisetoy", "--config", missing.to_str().unwrap()]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn explicit_config_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noisetoy.toml");
        fs::write(&path, "[texture]\nsize = 32\nmode = \"3d\"\n").unwrap();
        let cli = Cli::try_parse_from(["noisetoy", "--config", path.to_str().unwrap()]).unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.texture.size, 32);
        assert_eq!(config.texture.mode, TextureMode::D3);
    }
}
