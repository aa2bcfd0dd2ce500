//! Key Module
//!
//! Scoped-key construction and the `key=value` line format.
//!
//! Both splits use the *last* occurrence of their delimiter: `a=b=c` is
//! key `a=b` with value `c`, and `/x'y'z` is path `/x'y` with name `z`.

use crate::cache::{ENTRY_SEPARATOR, SCOPE_DELIMITER};

// == Split Last ==
/// Splits `s` around the rightmost occurrence of `delim`.
///
/// Returns `None` if `delim` does not occur.
pub fn split_last(s: &str, delim: char) -> Option<(&str, &str)> {
    s.rfind(delim)
        .map(|idx| (&s[..idx], &s[idx + delim.len_utf8()..]))
}

// == Scoped Keys ==
/// Builds the scoped key `path'name`.
pub fn scoped_key(path: &str, name: &str) -> String {
    let mut key = String::with_capacity(path.len() + name.len() + 1);
    key.push_str(path);
    key.push(SCOPE_DELIMITER);
    key.push_str(name);
    key
}

/// Splits a scoped key into `(path, name)`.
///
/// Returns `None` for plain keys.
pub fn parse_scoped(key: &str) -> Option<(&str, &str)> {
    split_last(key, SCOPE_DELIMITER)
}

// == Line Format ==
/// Parses one persisted line into `(key, value)`.
///
/// The value must be non-empty; the key may be empty. Lines without a
/// separator, or ending in one, yield `None`.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    split_last(line, ENTRY_SEPARATOR).filter(|(_, value)| !value.is_empty())
}

/// Formats an entry as a persisted line, without the trailing newline.
///
/// No escaping is applied: a key or value containing `=` or a newline will
/// not survive a round trip.
pub fn format_line(key: &str, value: &str) -> String {
    format!("{}{}{}", key, ENTRY_SEPARATOR, value)
}
