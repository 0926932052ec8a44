use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the punto binary.
#[derive(Debug, Parser)]
#[command(
    name = "punto",
    version,
    about = "Graphviz DOT renderer for Markdown documents"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PUNTO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a Markdown document, replacing DOT code blocks with diagrams.
    Render(RenderArgs),
    /// Run a single DOT source file through the Graphviz CLI.
    Dot(DotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// Markdown document to render.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Write the rendered HTML here instead of standard output.
    #[arg(long = "output", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DotArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// DOT source file to render.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Write the image bytes here instead of standard output.
    #[arg(long = "output", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the Graphviz executable path or command name.
    #[arg(long = "dot-path", value_name = "PATH")]
    pub dot_path: Option<String>,

    /// Override the image format produced by the Graphviz CLI (png|svg).
    #[arg(long = "image-format", value_name = "FORMAT")]
    pub image_format: Option<String>,

    /// Override the diagram renderer (image|d3).
    #[arg(long = "renderer", value_name = "RENDERER")]
    pub renderer: Option<String>,

    /// Override the cap on concurrent Graphviz processes.
    #[arg(long = "max-concurrent-renders", value_name = "COUNT")]
    pub max_concurrent_renders: Option<usize>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
