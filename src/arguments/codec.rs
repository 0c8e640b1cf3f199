//! Line format of service argument files.
//!
//! Each line holds at most one directive, written as `--key=value`,
//! `--key value` or a bare `--flag`. Anything else (blank lines, comments)
//! carries no directive and is kept verbatim when a file is rewritten.
//!
//! Only the first directive of a line is recognized. In
//! `--multiple=keys --in-the-same-row=lost` the second flag is not indexed,
//! and a space-separated `--key value extra` keeps `value` and drops `extra`.

/// Parse one line into `(key, value)`. Bare flags yield an empty value.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if !line.starts_with('-') {
        return None;
    }

    if let Some((key, value)) = line.split_once('=') {
        return Some((key.trim(), value.trim()));
    }

    match line.split_once(char::is_whitespace) {
        Some((key, rest)) => {
            let value = rest.split_whitespace().next().unwrap_or_default();
            Some((key, value))
        }
        None => Some((line, "")),
    }
}

/// Key of the directive on this line, if any.
pub fn line_key(line: &str) -> Option<&str> {
    parse_line(line).map(|(key, _)| key)
}

pub fn render_line(key: &str, value: &str) -> String {
    format!("{key}={value}")
}
