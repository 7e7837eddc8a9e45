//! String utility functions

/// Upper-case the first character, leaving the rest untouched (`user` -> `User`)
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether `s` can be used as a Cypher name without backtick quoting
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Backtick-quote a Cypher name when it is not a plain identifier
pub fn quote_identifier(s: &str) -> String {
    if is_plain_identifier(s) {
        s.to_string()
    } else {
        format!("`{}`", s.replace('`', "``"))
    }
}
