use std::path::PathBuf;

use clap::Parser;
use noiseconfig::{TextureMode, SUPPORTED_SIZES};

#[derive(Parser, Debug)]
#[command(
    name = "noisetoy",
    author,
    version,
    about = "Interactive GPU noise generator",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Load configuration from FILE instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the noise and compositing shaders.
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Texture edge length in texels (32, 64, 128 or 256).
    #[arg(long, value_name = "N", value_parser = parse_size)]
    pub size: Option<u32>,

    /// Start in 2D or 3D mode.
    #[arg(long, value_name = "2d|3d", value_parser = parse_mode)]
    pub mode: Option<TextureMode>,

    /// Destination of the binary export.
    #[arg(long, value_name = "FILE")]
    pub export_path: Option<PathBuf>,

    /// Also write a PNG preview next to 2D exports.
    #[arg(long)]
    pub export_png: bool,

    /// Initial window size (e.g. `1024x768`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_window_size)]
    pub window_size: Option<(u32, u32)>,

    /// Present with vsync instead of the lowest-latency mode.
    #[arg(long)]
    pub vsync: bool,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<u32, String> {
    let size = value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid texture size '{value}'"))?;
    if SUPPORTED_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!(
            "unsupported texture size {size}; expected one of {SUPPORTED_SIZES:?}"
        ))
    }
}

pub fn parse_mode(value: &str) -> Result<TextureMode, String> {
    TextureMode::parse(value).ok_or_else(|| format!("invalid mode '{value}'; expected 2d or 3d"))
}

fn parse_window_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid window width".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid window height".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_sizes_only() {
        for size in SUPPORTED_SIZES {
            assert_eq!(parse_size(&size.to_string()), Ok(size));
        }
        assert!(parse_size("100").is_err());
        assert!(parse_size("512").is_err());
        assert!(parse_size("abc").is_err());
    }

    #[test]
    fn parses_mode_variants() {
        assert_eq!(parse_mode("2d"), Ok(TextureMode::D2));
        assert_eq!(parse_mode("3D"), Ok(TextureMode::D3));
        assert!(parse_mode("4d").is_err());
    }

    #[test]
    fn parses_window_size() {
        assert_eq!(parse_window_size("1024x768"), Ok((1024, 768)));
        assert_eq!(parse_window_size("640X480"), Ok((640, 480)));
        assert!(parse_window_size("0x480").is_err());
        assert!(parse_window_size("640").is_err());
    }

    #[test]
    fn cli_collects_overrides() {
        let cli = Cli::try_parse_from([
            "noisetoy",
            "--size",
            "64",
            "--mode",
            "3d",
            "--window-size",
            "400x300",
            "--print-config",
        ])
        .unwrap();
        assert_eq!(cli.size, Some(64));
        assert_eq!(cli.mode, Some(TextureMode::D3));
        assert_eq!(cli.window_size, Some((400, 300)));
        assert!(cli.print_config);
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_rejects_unsupported_size() {
        assert!(Cli::try_parse_from(["noisetoy", "--size", "96"]).is_err());
    }
}
