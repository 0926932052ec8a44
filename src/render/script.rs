use sha2::{Digest, Sha256};

const GRAPH_ID_PREFIX: &str = "d3graph_";
const GRAPH_ID_HASH_CHARS: usize = 6;

/// Live-script pipeline: emit an identified container plus an inline script
/// that renders the diagram through the host document's d3-graphviz global.
///
/// No process is invoked here; rendering failures happen later inside the
/// host's script environment, where the installed error handler replaces the
/// container's markup.
pub(crate) fn script_block(source: &str) -> String {
    let graph_id = graph_id(source);
    let escaped = escape_template_literal(source);
    format!(
        concat!(
            "<div id=\"{id}\" style=\"text-align: center\"></div>\n",
            "<script>\n",
            "(function () {{\n",
            "  var capability = (typeof d3 !== 'undefined' && typeof d3.select === 'function') ? 'present' : 'absent';\n",
            "  if (capability === 'absent') {{\n",
            "    return;\n",
            "  }}\n",
            "  function d3error(err) {{\n",
            "    d3.select(\"#{id}\").html(`<div class=\"d3graphvizError\"> d3.graphviz(): ` + err.toString() + `</div>`);\n",
            "    console.error('Caught error on {id}: ', err);\n",
            "  }}\n",
            "  d3.select(\"#{id}\").graphviz().onerror(d3error).renderDot(`{source}`);\n",
            "}})();\n",
            "</script>"
        ),
        id = graph_id,
        source = escaped,
    )
}

/// Container identifier derived from the source. Truncated, so distinct
/// sources can collide; stability for a given source is the only guarantee.
fn graph_id(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{GRAPH_ID_PREFIX}{}", &digest[..GRAPH_ID_HASH_CHARS])
}

/// Escape the source so it embeds losslessly in a JavaScript template
/// literal. Backslashes first, then backticks.
fn escape_template_literal(source: &str) -> String {
    source.replace('\\', "\\\\").replace('`', "\\`")
}
