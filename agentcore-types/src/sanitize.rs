//! UTF-8 sanitization for message text (§4.1).
//!
//! Tool output and provider stream bytes are not guaranteed to be valid
//! UTF-8 at the boundary where they enter a [`crate::Message`]. Rather than
//! rejecting such input, invalid sequences are replaced with U+FFFD, the
//! same policy `String::from_utf8_lossy` applies to raw bytes — this
//! extends it to the case where the caller already holds a `&str` that may
//! contain a stray lone surrogate or otherwise-invalid scalar value encoded
//! upstream (e.g. a tool round-tripping through a non-Rust JSON parser).

/// Replace invalid UTF-8 byte sequences with U+FFFD, leaving already-valid
/// text untouched (no allocation in the common case).
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Scrub a `str` of characters that are technically valid Unicode scalar
/// values but unsafe to forward verbatim (lone surrogates can't occur in a
/// `&str` by construction, but other control characters commonly smuggled
/// through broken tool output can).
pub fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}
