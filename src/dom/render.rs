//! Markup serialization.

use std::borrow::Cow;
use std::fmt::Write;

use super::{Document, NodeData, NodeId, ROOT_TAG};

impl Document {
    /// Serialize the whole document (children of the synthetic root).
    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|parent| self.element(parent))
                    .is_some_and(|el| is_raw_text_element(&el.tag));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape(text));
                }
            }
            NodeData::Element(el) if el.tag == ROOT_TAG => {
                for child in &node.children {
                    self.write_node(*child, out);
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in el.attrs.iter() {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", escape(value));
                    }
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for child in &node.children {
                    self.write_node(*child, out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

/// Escape text and attribute values.
pub(crate) fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_roundtrip_shape() {
        let markup = r#"<div id="a" hidden><input name="q" value="x"><p>1 &lt; 2</p></div>"#;
        let doc = Document::parse(markup);
        assert_eq!(doc.to_html(), markup);
    }

    #[test]
    fn test_script_not_escaped() {
        let mut doc = Document::new();
        let script = doc.create_element("script");
        let body = doc.create_text("if (a < b) {}");
        doc.append_child(doc.root(), script);
        doc.append_child(script, body);
        assert_eq!(doc.to_html(), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b"), "a&lt;b");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }
}
