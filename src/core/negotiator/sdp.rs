//! Minimal SDP checks.
//!
//! The relay never parses SDP. It only checks the version line that every
//! SDP document starts with, so that obviously wrong payloads are rejected
//! before they reach (or after they leave) the upstream API.

use regex::bytes::Regex;
use std::sync::LazyLock;

/// Version line that opens every SDP document.
pub const SDP_VERSION_PREFIX: &str = "v=0";

static SDP_VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^v=0").expect("SDP version pattern is valid"));

/// An offer must start with the version line, with no leading whitespace.
#[inline]
pub fn is_sdp_offer(offer: &str) -> bool {
    offer.starts_with(SDP_VERSION_PREFIX)
}

/// An answer only needs some line starting with the version marker.
///
/// Works on raw bytes so that answers with non-UTF-8 attribute values are
/// still recognized.
#[inline]
pub fn contains_sdp_answer(body: &[u8]) -> bool {
    SDP_VERSION_LINE.is_match(body)
}

/// At most `max_chars` characters of `text`, cut on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
