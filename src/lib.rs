//! Renders Graphviz DOT code blocks in Markdown documents.
//!
//! Two pipelines share one configuration surface: the static image pipeline
//! shells out to the Graphviz `dot` CLI and embeds the produced image, while
//! the live-script pipeline emits a container plus an inline d3-graphviz
//! rendering script for the host document to execute.

pub mod config;
pub mod render;
pub mod telemetry;
