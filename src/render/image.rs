use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::warn;

use super::invoke::DotInvoker;

/// Static image pipeline: run the source through the Graphviz CLI and wrap
/// the payload as an embedded object, or emit a preformatted error block.
///
/// Failures never escape this function; the caller always receives a fragment
/// to put where the diagram would have appeared.
pub(crate) fn image_block(invoker: &DotInvoker, source: &str) -> String {
    match invoker.render(source) {
        Ok(payload) => {
            let mime = invoker.image_format().mime_type();
            let data_url = format!("data:{mime};base64,{}", STANDARD.encode(&payload));
            format!(
                "<object class=\"graphviz-image\" type=\"{mime}\" data=\"{data_url}\"><img src=\"{data_url}\"></object>"
            )
        }
        Err(err) => {
            warn!(
                target: "render::dot",
                op = "dot::image_block",
                error = %err,
                "diagram rendering failed"
            );
            error_block(&err.to_string())
        }
    }
}

pub(crate) fn error_block(message: &str) -> String {
    format!("<pre><code>{}</code></pre>", escape_text(message))
}

pub(crate) fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ImageFormat;
    use std::{fs, num::NonZeroUsize, os::unix::fs::PermissionsExt};
    use tempfile::TempDir;

    fn fake_dot(dir: &TempDir, script: &str) -> String {
        let path = dir.path().join("fake-dot");
        fs::write(&path, script).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        path.display().to_string()
    }

    fn invoker(dot_path: String, format: ImageFormat) -> DotInvoker {
        DotInvoker::new(dot_path, format, NonZeroUsize::new(2).expect("permits"))
    }

    #[test]
    fn success_embeds_an_object_and_img_pair() {
        let dir = TempDir::new().expect("temp dir");
        let dot_path = fake_dot(
            &dir,
            r#"#!/bin/sh
printf 'fake-png-bytes'
"#,
        );

        let html = image_block(&invoker(dot_path, ImageFormat::Png), "digraph { a -> b }");
        assert!(html.starts_with("<object class=\"graphviz-image\" type=\"image/png\""));
        assert!(html.contains("<img src=\"data:image/png;base64,"));
        assert!(
            html.contains(&format!(
                "base64,{}",
                STANDARD.encode(b"fake-png-bytes")
            )),
            "payload not embedded verbatim: {html}"
        );
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn svg_format_switches_the_mime_type() {
        let dir = TempDir::new().expect("temp dir");
        let dot_path = fake_dot(
            &dir,
            r#"#!/bin/sh
printf '<svg/>'
"#,
        );

        let html = image_block(&invoker(dot_path, ImageFormat::Svg), "digraph {}");
        assert!(html.contains("type=\"image/svg+xml\""));
        assert!(html.contains("data:image/svg+xml;base64,"));
    }

    #[test]
    fn failure_renders_a_preformatted_error_block() {
        let html = image_block(
            &invoker("/nonexistent/tool".to_string(), ImageFormat::Svg),
            "digraph {}",
        );
        assert!(html.starts_with("<pre><code>"));
        assert!(html.contains("Check the dot executable path"));
        assert!(!html.contains("<object"));
    }

    #[test]
    fn error_text_is_escaped() {
        let html = error_block("exit <code> & stderr");
        assert_eq!(html, "<pre><code>exit &lt;code&gt; &amp; stderr</code></pre>");
    }
}
