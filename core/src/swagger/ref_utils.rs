#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Builds and takes apart `#/definitions/{key}` pointers. Keys are escaped as
//! JSON Pointer segments (`~0`, `~1`) and then percent-encoded so that they
//! are valid URI fragments.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Characters that may not appear raw in a URI fragment.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'[')
    .add(b']');

/// Escapes one JSON Pointer segment.
pub(crate) fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`encode_pointer_segment`] after percent-decoding.
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    decoded.replace("~1", "/").replace("~0", "~")
}

/// Builds the `$ref` value for a definition key.
pub fn definition_pointer(key: &str) -> String {
    let segment = encode_pointer_segment(key);
    format!(
        "{}{}",
        DEFINITIONS_PREFIX,
        utf8_percent_encode(&segment, FRAGMENT)
    )
}

/// Extracts the definition key from a `#/definitions/{key}` pointer.
///
/// Returns `None` for pointers into other sections or nested pointers.
pub fn definition_key(reference: &str) -> Option<String> {
    let segment = reference.strip_prefix(DEFINITIONS_PREFIX)?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    Some(decode_pointer_segment(segment))
}

/// Appends a segment to a JSON Pointer used in diagnostics.
pub(crate) fn child_pointer(parent: &str, segment: &str) -> String {
    format!("{}/{}", parent, encode_pointer_segment(segment))
}
