//! Node payloads.

use rustc_hash::FxHashSet;

/// Tags whose runtime `value`/`checked` can drift from their attributes.
const CONTROL_TAGS: [&str; 3] = ["input", "select", "textarea"];

/// Node payload: element or text.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

impl NodeData {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }
}

/// Element payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    pub attrs: Attrs,
    /// Runtime properties, present only for input-like controls
    pub control: Option<Control>,
    /// Programmatic flags, never serialized
    pub flags: LiveFlags,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let control = CONTROL_TAGS.contains(&tag.as_str()).then(Control::default);
        Self {
            tag,
            attrs: Attrs::default(),
            control,
            flags: LiveFlags::default(),
        }
    }

    pub fn is_control(&self) -> bool {
        self.control.is_some()
    }

    /// Initialize runtime properties from the current attributes.
    pub(crate) fn sync_control_from_attrs(&mut self) {
        if let Some(control) = self.control.as_mut() {
            control.value = self.attrs.get("value").unwrap_or_default().to_string();
            control.checked = self.attrs.contains("checked");
        }
    }
}

/// Runtime state of an input-like control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Control {
    pub value: String,
    pub checked: bool,
}

/// Ordered attribute map (insertion order preserved).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Set a value, keeping the original position of an existing name.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(pos).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::default();
        for (key, value) in iter {
            attrs.set(&key.into(), &value.into());
        }
        attrs
    }
}

/// Per-element flags set programmatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveFlags {
    /// The user edited this control since the last clean point
    pub is_modified: bool,
    /// Validation outcome, maintained by form helpers
    pub is_valid: bool,
    pub live_update: LiveUpdate,
}

impl Default for LiveFlags {
    fn default() -> Self {
        Self {
            is_modified: false,
            is_valid: true,
            live_update: LiveUpdate::Unset,
        }
    }
}

/// Push-update policy pinned on an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LiveUpdate {
    /// No pinning
    #[default]
    Unset,
    /// Never touched by a push update (subtree included)
    Preserve,
    /// Protected names listed here stay updatable during push updates
    Allow(FxHashSet<String>),
}

impl LiveUpdate {
    pub fn allow<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Allow(names.into_iter().map(Into::into).collect())
    }

    pub fn is_preserve(&self) -> bool {
        matches!(self, Self::Preserve)
    }
}
