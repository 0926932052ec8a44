use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};

use crate::config::RendererKind;

use super::{image, invoke::DotInvoker, script};

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) contains_graphviz: bool,
    pub(crate) diagram_count: u32,
}

/// Replace every fenced code block tagged `dot` or `graphviz` with the output
/// of the configured pipeline. All other nodes pass through untouched.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    invoker: &DotInvoker,
    renderer: RendererKind,
) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();
    visit_nodes(root, invoker, renderer, &mut outcome);
    outcome
}

fn visit_nodes<'a>(
    node: &'a AstNode<'a>,
    invoker: &DotInvoker,
    renderer: RendererKind,
    outcome: &mut RewriteOutcome,
) {
    if let Some((info, literal)) = extract_code_block(node) {
        let language = info
            .split_whitespace()
            .next()
            .map(|token| token.to_ascii_lowercase());
        if matches!(language.as_deref(), Some("dot" | "graphviz")) {
            let html = match renderer {
                RendererKind::Image => image::image_block(invoker, &literal),
                RendererKind::D3 => script::script_block(&literal),
            };
            outcome.contains_graphviz = true;
            outcome.diagram_count += 1;
            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        visit_nodes(next, invoker, renderer, outcome);
        child = next.next_sibling();
    }
}

fn extract_code_block<'a>(node: &'a AstNode<'a>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some((block.info.trim().to_string(), block.literal.clone()))
    } else {
        None
    }
}
