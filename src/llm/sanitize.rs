//! Reply cleanup applied before generated text reaches a chat channel.

use regex::Regex;
use std::sync::LazyLock;

static EMOJI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[",
        r"\x{1F600}-\x{1F64F}",
        r"\x{1F300}-\x{1F5FF}",
        r"\x{1F680}-\x{1F6FF}",
        r"\x{1F700}-\x{1F77F}",
        r"\x{1F780}-\x{1F7FF}",
        r"\x{1F800}-\x{1F8FF}",
        r"\x{1F900}-\x{1F9FF}",
        r"\x{1FA00}-\x{1FA6F}",
        r"\x{1FA70}-\x{1FAFF}",
        r"\x{2702}-\x{27B0}",
        r"\x{24C2}-\x{1F251}",
        r"]+",
    ))
    .expect("hardcoded emoji regex")
});

/// Strip emoji code points and every `#` and `@` from generated text.
///
/// Surrounding whitespace is left alone, so `"Hi 😀"` becomes `"Hi "`.
pub fn sanitize(text: &str) -> String {
    EMOJI_REGEX.replace_all(text, "").replace(['#', '@'], "")
}
