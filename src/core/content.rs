//! Content normaliser for display text.
//!
//! Removes metadata that already lives in dedicated record fields (the
//! bracketed timestamp and the session-start marker), collapses
//! whitespace, and pretty-prints embedded `NewDataSet` payloads with
//! `roxmltree`. Malformed XML never escapes this module: it is flattened
//! to a single whitespace-collapsed line instead.

use std::sync::OnceLock;

use regex::Regex;

/// Indentation unit of pretty-printed XML.
const INDENT: &str = "  ";

fn timestamp_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\d{2}-\d{2}-\d{4} \d{2}:\d{2}:\d{2}(?:\.\d+)?\]")
            .expect("valid timestamp prefix regex")
    })
}

fn session_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ExecuteService(?:Sync)?\(\)\s*:\s*(?:\[[^\]]*\])?(?:\s*Exception\b)?")
            .expect("valid session marker regex")
    })
}

/// Remove the bracketed timestamp and the session-start marker.
pub fn strip_metadata(text: &str) -> String {
    let without_ts = timestamp_prefix_re().replace_all(text, "");
    session_marker_re().replace_all(&without_ts, "").into_owned()
}

/// Collapse every whitespace run (including line breaks) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise the text of a single-line record.
pub fn normalize_line(text: &str) -> String {
    collapse_whitespace(&strip_metadata(text))
}

/// Normalise an accumulated session body.
///
/// The span from the first `<` to the last `>` is pretty-printed when it
/// parses as XML; text around it is kept on its own lines. Bodies without
/// markup, or with markup that does not parse, become one collapsed line.
pub fn normalize_body(body: &str) -> String {
    let stripped = strip_metadata(body);
    let text = stripped.trim();

    let (Some(start), Some(end)) = (text.find('<'), text.rfind('>')) else {
        return collapse_whitespace(text);
    };
    if end < start {
        return collapse_whitespace(text);
    }

    let region = &text[start..=end];
    match pretty_print_xml(region) {
        Some(pretty) => {
            let mut parts = Vec::with_capacity(3);
            let before = collapse_whitespace(&text[..start]);
            let after = collapse_whitespace(&text[end + 1..]);
            if !before.is_empty() {
                parts.push(before);
            }
            parts.push(pretty);
            if !after.is_empty() {
                parts.push(after);
            }
            parts.join("\n")
        }
        None => collapse_whitespace(text),
    }
}

/// Pretty-print an XML fragment with two-space indentation and `\n` line
/// breaks. No XML declaration is emitted. Returns `None` when the fragment
/// is not well-formed.
pub fn pretty_print_xml(xml: &str) -> Option<String> {
    let doc = match roxmltree::Document::parse(xml) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::trace!("Payload is not well-formed XML, flattening: {e}");
            return None;
        }
    };

    let mut out = String::with_capacity(xml.len() * 2);
    for node in doc.root().children() {
        write_node(&node, 0, &mut out);
    }
    Some(out.trim_end().to_string())
}

fn write_node(node: &roxmltree::Node, depth: usize, out: &mut String) {
    match node.node_type() {
        roxmltree::NodeType::Element => write_element(node, depth, out),
        roxmltree::NodeType::Text => {
            let text = node.text().unwrap_or("").trim();
            if !text.is_empty() {
                push_indent(depth, out);
                out.push_str(&escape(text, false));
                out.push('\n');
            }
        }
        roxmltree::NodeType::Comment => {
            push_indent(depth, out);
            out.push_str("<!--");
            out.push_str(node.text().unwrap_or(""));
            out.push_str("-->\n");
        }
        roxmltree::NodeType::Root | roxmltree::NodeType::PI => {}
    }
}

fn write_element(node: &roxmltree::Node, depth: usize, out: &mut String) {
    let name = node.tag_name().name();
    push_indent(depth, out);
    out.push('<');
    out.push_str(name);
    for attr in node.attributes() {
        out.push(' ');
        out.push_str(attr.name());
        out.push_str("=\"");
        out.push_str(&escape(attr.value(), true));
        out.push('"');
    }

    let children: Vec<roxmltree::Node> = node
        .children()
        .filter(|c| !(c.is_text() && c.text().map_or(true, |t| t.trim().is_empty())))
        .collect();

    match children.as_slice() {
        [] => out.push_str(" />\n"),
        [only] if only.is_text() => {
            out.push('>');
            out.push_str(&escape(only.text().unwrap_or("").trim(), false));
            out.push_str("</");
            out.push_str(name);
            out.push_str(">\n");
        }
        _ => {
            out.push_str(">\n");
            for child in &children {
                write_node(child, depth + 1, out);
            }
            push_indent(depth, out);
            out.push_str("</");
            out.push_str(name);
            out.push_str(">\n");
        }
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
