use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Builds an `ILIKE` pattern that matches `input` as a literal substring.
///
/// `%`, `_` and the escape character itself are escaped so user input can't act
/// as a wildcard. Postgres uses `\` as the default `LIKE` escape.
pub fn like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('%');
    for c in input.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Collapses empty or whitespace-only search strings to `None`.
pub fn normalize_search(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
