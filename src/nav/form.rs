//! Form submission data.

use url::Url;
use url::form_urlencoded;

use crate::dom::{Document, Element, NodeId};
use crate::transport::{FetchRequest, Method};

/// Input types that never contribute a field without a submitter.
const BUTTON_TYPES: [&str; 4] = ["submit", "button", "reset", "image"];

/// Whether `id` is disabled itself or through a disabled `fieldset`.
fn is_disabled(doc: &Document, id: NodeId) -> bool {
    std::iter::once(id).chain(doc.ancestors(id)).any(|node| {
        doc.element(node).is_some_and(|el| {
            el.attrs.contains("disabled") && (node == id || el.tag == "fieldset")
        })
    })
}

fn select_value(doc: &Document, select: NodeId, el: &Element) -> String {
    if let Some(control) = el.control.as_ref().filter(|c| !c.value.is_empty()) {
        return control.value.clone();
    }
    let options: Vec<NodeId> = doc
        .descendants(select)
        .into_iter()
        .filter(|id| doc.element(*id).is_some_and(|el| el.tag == "option"))
        .collect();
    let chosen = options
        .iter()
        .find(|id| doc.element(**id).is_some_and(|el| el.attrs.contains("selected")))
        .or(options.first());
    match chosen {
        Some(&option) => match doc.element(option).and_then(|el| el.attrs.get("value")) {
            Some(value) => value.to_string(),
            None => doc.text_content(option),
        },
        None => String::new(),
    }
}

/// Successful controls of a form as `(name, value)` pairs, in tree order.
pub fn fields(doc: &Document, form: NodeId) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for id in doc.descendants(form) {
        let Some(el) = doc.element(id).filter(|el| el.is_control()) else {
            continue;
        };
        let Some(name) = el.attrs.get("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if is_disabled(doc, id) {
            continue;
        }

        let kind = el.attrs.get("type").unwrap_or("text").to_ascii_lowercase();
        let control = el.control.clone().unwrap_or_default();
        let value = match el.tag.as_str() {
            "select" => select_value(doc, id, el),
            "input" if BUTTON_TYPES.contains(&kind.as_str()) => continue,
            "input" if kind == "checkbox" || kind == "radio" => {
                if !control.checked {
                    continue;
                }
                if control.value.is_empty() {
                    "on".to_string()
                } else {
                    control.value
                }
            }
            _ => control.value,
        };
        out.push((name.to_string(), value));
    }
    out
}

/// Whether any control in the form was flagged invalid.
pub fn has_invalid(doc: &Document, form: NodeId) -> bool {
    doc.descendants(form)
        .into_iter()
        .any(|id| doc.element(id).is_some_and(|el| el.is_control() && !el.flags.is_valid))
}

/// Build the request a form submits, resolving `action` against `base`.
pub fn request(doc: &Document, form: NodeId, base: &Url) -> Result<FetchRequest, url::ParseError> {
    let el = doc.element(form);
    let action = el.and_then(|el| el.attrs.get("action")).unwrap_or_default();
    let mut url = base.join(action)?;
    url.set_fragment(None);

    let fields = fields(doc, form);
    match Method::from_form(el.and_then(|el| el.attrs.get("method"))) {
        Method::Get => {
            url.set_query(None);
            if !fields.is_empty() {
                url.query_pairs_mut().extend_pairs(&fields);
            }
            Ok(FetchRequest::get(url))
        }
        Method::Post => {
            let body = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&fields)
                .finish();
            Ok(FetchRequest::post(url, body))
        }
    }
}
