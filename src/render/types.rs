use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Source markdown captured from the document.
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Rendered HTML with diagram blocks replaced.
    pub html: String,
    /// Indicates whether the document contained any Graphviz diagram blocks.
    pub contains_graphviz: bool,
    /// Number of diagram blocks found in the document.
    pub diagram_count: u32,
}

/// Structured errors surfaced by the rendering pipeline. Per-diagram failures
/// are not errors: they render as in-document error blocks instead.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
}

/// Trait exposed by the rendering pipeline. Implementations must be
/// deterministic: given the same input and configuration, they return
/// identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
