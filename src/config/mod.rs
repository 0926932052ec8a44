//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{CliArgs, Command, DotArgs, RenderArgs, RenderOverrides};

#[cfg(test)]
mod tests;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "punto";
pub(crate) const DEFAULT_DOT_PATH: &str = "dot";
const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 4;

/// Image formats the Graphviz CLI is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    /// Token passed to the Graphviz CLI as `-T<format>`.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }

    /// MIME type of the produced payload.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Svg => "image/svg+xml",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(format!("unsupported image format `{other}`, expected png or svg")),
        }
    }
}

/// Which pipeline handles a diagram block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Invoke the Graphviz CLI and embed a static image.
    Image,
    /// Emit a container plus a d3-graphviz live-rendering script.
    D3,
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(RendererKind::Image),
            "d3" => Ok(RendererKind::D3),
            other => Err(format!("unsupported renderer `{other}`, expected image or d3")),
        }
    }
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Graphviz executable: a bare command name or a qualified path.
    pub dot_path: String,
    pub image_format: ImageFormat,
    pub renderer: RendererKind,
    pub max_concurrent_renders: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse CLI arguments and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("PUNTO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Render(args) => raw.apply_overrides(&args.overrides),
        Command::Dot(args) => raw.apply_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    dot_path: Option<String>,
    image_format: Option<String>,
    renderer: Option<String>,
    max_concurrent_renders: Option<usize>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(path) = overrides.dot_path.as_ref() {
            self.render.dot_path = Some(path.clone());
        }
        if let Some(format) = overrides.image_format.as_ref() {
            self.render.image_format = Some(format.clone());
        }
        if let Some(renderer) = overrides.renderer.as_ref() {
            self.render.renderer = Some(renderer.clone());
        }
        if let Some(max) = overrides.max_concurrent_renders {
            self.render.max_concurrent_renders = Some(max);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, render } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;

        Ok(Self { logging, render })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    // A host that resets its settings hands us an empty string; treat it as
    // unset and fall back to the bare command name.
    let dot_path = render
        .dot_path
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DOT_PATH.to_string());

    let image_format = match render.image_format {
        Some(value) => value
            .parse::<ImageFormat>()
            .map_err(|reason| LoadError::invalid("render.image_format", reason))?,
        None => ImageFormat::Png,
    };

    let renderer = match render.renderer {
        Some(value) => value
            .parse::<RendererKind>()
            .map_err(|reason| LoadError::invalid("render.renderer", reason))?,
        None => RendererKind::Image,
    };

    let max_concurrent_renders = NonZeroUsize::new(
        render
            .max_concurrent_renders
            .unwrap_or(DEFAULT_MAX_CONCURRENT_RENDERS),
    )
    .ok_or_else(|| {
        LoadError::invalid("render.max_concurrent_renders", "must be greater than zero")
    })?;

    Ok(RenderSettings {
        dot_path,
        image_format,
        renderer,
        max_concurrent_renders,
    })
}
