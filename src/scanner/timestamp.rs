use regex::Regex;
use std::sync::LazyLock;

/// `DD-MM-YYYY HH:MM:SS`, ASCII digits only
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{2}-[0-9]{2}-[0-9]{4} [0-9]{2}:[0-9]{2}:[0-9]{2}")
        .expect("timestamp regex is valid")
});

/// Return the first embedded timestamp in `line`, verbatim
///
/// The text is not parsed into a date; absence is not an error.
pub fn extract(line: &str) -> Option<&str> {
    TIMESTAMP_PATTERN.find(line).map(|m| m.as_str())
}
