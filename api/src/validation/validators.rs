//! Format checks shared by shape rules, the identifier check and query parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Object identifier: 24 hex characters, either case
    static ref OBJECT_ID_REGEX: Regex = Regex::new(r"^[0-9a-fA-F]{24}$").unwrap();

    /// Pragmatic email pattern: local part, '@', dotted domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    ).unwrap();

    /// URL pattern for http(s) addresses
    static ref URL_REGEX: Regex = Regex::new(
        r"^https?://[^\s/$.?#].[^\s]*$"
    ).unwrap();
}

/// Validate object identifier format
pub fn is_object_id(value: &str) -> bool {
    OBJECT_ID_REGEX.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

pub fn is_url(value: &str) -> bool {
    URL_REGEX.is_match(value)
}

/// `true`, `false`, `1` or `0`, ignoring ASCII case.
pub fn is_boolean_string(value: &str) -> bool {
    ["true", "false", "1", "0"]
        .iter()
        .any(|candidate| value.eq_ignore_ascii_case(candidate))
}
