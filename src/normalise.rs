//! EAD root-tag namespace fix-up.
//!
//! The exporter may omit the namespace declarations the downstream XSLT and
//! FO tooling requires. Only the first opening `<ead>` tag is rewritten, by
//! targeted text substitution rather than XML re-serialization, so the rest
//! of the document keeps its exact original bytes.

use std::borrow::Cow;

use regex::Regex;
use tracing::debug;

/// Replacement root tag carrying the xlink, EAD default and
/// XML-schema-instance namespaces.
const EAD_ROOT_WITH_NAMESPACES: &str = "<ead xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
     xmlns=\"urn:isbn:1-931666-22-9\" \
     xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">";

/// Matches `<ead>` or `<ead ...>` but not longer tag names such as
/// `<eadheader>`.
const EAD_OPEN_TAG: &str = r"<ead(\s[^>]*)?>";

/// Rewrite the first EAD root opening tag to the three-namespace version.
/// A document with no matching tag is returned unchanged (borrowed).
pub fn add_namespaces(xml: &str) -> Cow<'_, str> {
    let pattern = Regex::new(EAD_OPEN_TAG).expect("ead open tag pattern");
    let rewritten = pattern.replace(xml, EAD_ROOT_WITH_NAMESPACES);
    if matches!(rewritten, Cow::Borrowed(_)) {
        debug!("No <ead> root tag found; document left unchanged");
    }
    rewritten
}
