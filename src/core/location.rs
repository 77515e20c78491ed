//! URL helpers for page locations.
//!
//! - Same-origin checks for link/form interception
//! - Document identity (path + query, fragment ignored)
//! - Fragment to element id (percent-decoded)

use percent_encoding::percent_decode_str;
use url::Url;

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Whether two URLs address the same document (fragment ignored).
pub fn same_document(a: &Url, b: &Url) -> bool {
    same_origin(a, b) && a.path() == b.path() && a.query() == b.query()
}

/// Element id targeted by the URL fragment, decoded.
pub fn fragment_id(url: &Url) -> Option<String> {
    let fragment = url.fragment().filter(|f| !f.is_empty())?;
    let decoded = percent_decode_str(fragment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| fragment.to_string());
    Some(decoded)
}
