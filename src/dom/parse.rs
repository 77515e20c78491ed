//! Markup parsing via `tl`.

use std::borrow::Cow;

use super::{Document, Element, NodeData, NodeId};

impl Document {
    /// Parse a document or fragment.
    ///
    /// Comments, the doctype and whitespace-only text are dropped.
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root();
        let markup = strip_doctype(markup);

        let Ok(dom) = tl::parse(markup, tl::ParserOptions::default()) else {
            // Unparseable input degrades to a single text node
            if !markup.trim().is_empty() {
                let text = doc.create_text(decode_entities(markup));
                doc.append_child(root, text);
            }
            return doc;
        };

        let parser = dom.parser();
        for handle in dom.children() {
            if let Some(id) = doc.import(*handle, parser) {
                doc.append_child(root, id);
            }
        }
        doc
    }

    fn import(&mut self, handle: tl::NodeHandle, parser: &tl::Parser) -> Option<NodeId> {
        match handle.get(parser)? {
            tl::Node::Tag(tag) => {
                let name = tag.name().as_utf8_str().to_ascii_lowercase();
                if name.starts_with('!') {
                    return None;
                }

                let mut el = Element::new(&name);
                for (key, value) in tag.attributes().iter() {
                    let key: &str = key.as_ref();
                    let value = value.map(|v| decode_entities(&v).into_owned());
                    el.attrs.set(&key.to_ascii_lowercase(), value.as_deref().unwrap_or_default());
                }
                el.sync_control_from_attrs();

                let id = self.alloc(NodeData::Element(el));
                for child in tag.children().top().iter() {
                    if let Some(child_id) = self.import(*child, parser) {
                        self.append_child(id, child_id);
                    }
                }

                if name == "textarea" {
                    let text = self.text_content(id);
                    if let Some(control) = self.element_mut(id).and_then(|el| el.control.as_mut()) {
                        control.value = text;
                    }
                }
                Some(id)
            }
            tl::Node::Raw(bytes) => {
                let text = bytes.as_utf8_str();
                if text.trim().is_empty() {
                    None
                } else {
                    Some(self.create_text(decode_entities(&text)))
                }
            }
            tl::Node::Comment(_) => None,
        }
    }
}

fn strip_doctype(markup: &str) -> &str {
    let trimmed = markup.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    if !is_doctype {
        return markup;
    }
    match trimmed.find('>') {
        Some(end) => &trimmed[end + 1..],
        None => "",
    }
}

/// Decode character references (`&amp;`, `&#39;`, `&#x27;`, ...).
pub(crate) fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment() {
        let doc = Document::parse(r#"<p class="x">Hello <b>world</b></p><p>2</p>"#);
        let top = doc.children(doc.root());
        assert_eq!(top.len(), 2);

        let p = doc.element(top[0]).unwrap();
        assert_eq!(p.tag, "p");
        assert_eq!(p.attrs.get("class"), Some("x"));
        assert_eq!(doc.text_content(top[0]), "Hello world");
    }

    #[test]
    fn test_parse_full_document() {
        let doc = Document::parse(
            "<!DOCTYPE html>\n<html><head><meta name=\"version\" content=\"1\"></head><body></body></html>",
        );
        let top = doc.children(doc.root());
        assert_eq!(top.len(), 1);
        assert_eq!(doc.element(top[0]).unwrap().tag, "html");
        assert!(doc.find(|el| el.tag == "meta").is_some());
    }

    #[test]
    fn test_parse_controls() {
        let doc = Document::parse(
            r#"<input name="a" value="1"><input type="checkbox" checked><textarea>notes</textarea>"#,
        );
        let top = doc.children(doc.root());
        let value = |id| doc.element(id).unwrap().control.clone().unwrap();

        assert_eq!(value(top[0]).value, "1");
        assert!(value(top[1]).checked);
        assert_eq!(value(top[2]).value, "notes");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#39;&#x27;"), "''");
        assert_eq!(decode_entities("&unknown; &"), "&unknown; &");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_whitespace_text_dropped() {
        let doc = Document::parse("<ul>\n  <li>a</li>\n</ul>");
        let ul = doc.children(doc.root())[0];
        assert_eq!(doc.children(ul).len(), 1);
    }
}
