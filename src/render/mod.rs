//! Markdown rendering service: finds Graphviz DOT code blocks and replaces
//! them with the output of the configured diagram pipeline.

mod image;
mod invoke;
mod pool;
mod rewrite;
mod script;
pub mod types;

use std::{num::NonZeroUsize, sync::Arc};

use comrak::{Arena, Options, format_html, parse_document};
use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;

use crate::config::{DEFAULT_DOT_PATH, ImageFormat, RenderSettings, RendererKind};

pub use invoke::{DotInvokeError, DotInvoker};
pub use types::{RenderError, RenderOutput, RenderRequest, RenderService};

/// Comrak-based rendering pipeline that rewrites DOT diagram blocks.
pub struct DotRenderService {
    options: Options<'static>,
    invoker: DotInvoker,
    renderer: RendererKind,
}

impl DotRenderService {
    fn new() -> Self {
        Self::from_config(&active_render_config())
    }

    /// Construct a service for an explicit pipeline configuration, bypassing
    /// the process-wide configured instance.
    pub fn from_config(config: &RenderPipelineConfig) -> Self {
        let invoker = DotInvoker::new(
            config.dot_path.clone(),
            config.image_format,
            config.max_concurrent_renders,
        );
        Self {
            options: default_options(),
            invoker,
            renderer: config.renderer,
        }
    }

    /// Static image pipeline entry point for one diagram block.
    pub fn render_image_block(&self, source: &str) -> String {
        image::image_block(&self.invoker, source)
    }

    /// Live-script pipeline entry point for one diagram block.
    pub fn render_script_block(&self, source: &str) -> String {
        script::script_block(source)
    }

    pub fn invoker(&self) -> &DotInvoker {
        &self.invoker
    }
}

impl Default for DotRenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderService for DotRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let outcome = rewrite::rewrite_ast(root, &self.invoker, self.renderer);

        let mut html = String::new();
        format_html(root, &self.options, &mut html).map_err(|err| RenderError::Markdown {
            message: err.to_string(),
        })?;

        Ok(RenderOutput {
            html,
            contains_graphviz: outcome.contains_graphviz,
            diagram_count: outcome.diagram_count,
        })
    }
}

static RENDER_SERVICE: Lazy<Arc<DotRenderService>> = Lazy::new(|| Arc::new(DotRenderService::new()));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<DotRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

/// Pipeline configuration resolved from settings before first use.
#[derive(Debug, Clone)]
pub struct RenderPipelineConfig {
    pub dot_path: String,
    pub image_format: ImageFormat,
    pub renderer: RendererKind,
    pub max_concurrent_renders: NonZeroUsize,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            dot_path: DEFAULT_DOT_PATH.to_string(),
            image_format: ImageFormat::Png,
            renderer: RendererKind::Image,
            max_concurrent_renders: NonZeroUsize::new(4).expect("default permit count"),
        }
    }
}

impl From<&RenderSettings> for RenderPipelineConfig {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            dot_path: settings.dot_path.clone(),
            image_format: settings.image_format,
            renderer: settings.renderer,
            max_concurrent_renders: settings.max_concurrent_renders,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

/// Configure the shared render service. Must run before `render_service` is
/// first called; later calls fail.
pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    // Rewritten diagram blocks are injected as raw HTML and must survive
    // formatting.
    options.render.r#unsafe = true;

    options
}

#[cfg(test)]
mod service_tests {
    use super::*;

    fn d3_service() -> DotRenderService {
        DotRenderService::from_config(&RenderPipelineConfig {
            renderer: RendererKind::D3,
            ..RenderPipelineConfig::default()
        })
    }

    #[test]
    fn render_replaces_dot_blocks_and_reports_counts() {
        let service = d3_service();
        let request = RenderRequest::new("# Title\n\n```dot\ndigraph { a -> b }\n```\n");
        let output = service.render(&request).expect("rendered");

        assert!(output.contains_graphviz);
        assert_eq!(output.diagram_count, 1);
        assert!(output.html.contains("<h1>Title</h1>"));
        assert!(output.html.contains("<div id=\"d3graph_"));
        assert!(output.html.contains("<script>"));
    }

    #[test]
    fn documents_without_diagrams_render_plain_markdown() {
        let service = d3_service();
        let request = RenderRequest::new("plain *markdown* text");
        let output = service.render(&request).expect("rendered");

        assert!(!output.contains_graphviz);
        assert_eq!(output.diagram_count, 0);
        assert!(output.html.contains("<em>markdown</em>"));
    }

    #[test]
    fn invoker_accessor_exposes_the_configured_pipeline() {
        let service = DotRenderService::from_config(&RenderPipelineConfig {
            dot_path: "/nonexistent/tool".to_string(),
            ..RenderPipelineConfig::default()
        });

        let error = service
            .invoker()
            .render("digraph { a }")
            .expect_err("spawn must fail");
        assert!(matches!(error, DotInvokeError::NotFound { .. }));
    }

    #[test]
    fn per_block_entry_points_match_the_pipelines() {
        let service = d3_service();
        let script = service.render_script_block("digraph { a }");
        assert!(script.contains("renderDot"));

        let image = DotRenderService::from_config(&RenderPipelineConfig {
            dot_path: "/nonexistent/tool".to_string(),
            ..RenderPipelineConfig::default()
        })
        .render_image_block("digraph { a }");
        assert!(image.contains("<pre><code>"));
    }
}
