//! Session history.

use url::Url;

/// Linear history with a cursor, like a browser tab.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    /// Push an entry after the cursor, dropping any forward entries.
    pub fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    /// Overwrite the current entry in place.
    pub fn replace(&mut self, url: Url) {
        self.entries[self.index] = url;
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    /// Step back; returns the new current entry.
    pub fn back(&mut self) -> Option<&Url> {
        self.index = self.index.checked_sub(1)?;
        Some(self.current())
    }

    /// Step forward; returns the new current entry.
    pub fn forward(&mut self) -> Option<&Url> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Url] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("http://site.test/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_back_forward() {
        let mut history = History::new(url("/a"));
        history.push(url("/b"));
        history.push(url("/c"));

        assert_eq!(history.back(), Some(&url("/b")));
        assert_eq!(history.back(), Some(&url("/a")));
        assert_eq!(history.back(), None);
        assert_eq!(history.current(), &url("/a"));
        assert_eq!(history.forward(), Some(&url("/b")));
    }

    #[test]
    fn test_push_drops_forward_entries() {
        let mut history = History::new(url("/a"));
        history.push(url("/b"));
        history.back();
        history.push(url("/c"));

        assert_eq!(history.entries(), &[url("/a"), url("/c")]);
        assert_eq!(history.forward(), None);
    }
}
