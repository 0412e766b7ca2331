//! Identifier derivation.
//!
//! Every name that appears in generated code goes through these functions,
//! and only [`crate::view`] calls them, so all artifacts of one workflow
//! agree on spelling.

/// Turn arbitrary text into a snake-case identifier.
///
/// Lower-cases, replaces anything that is not an ASCII letter or digit with
/// `_`, and prefixes `_` when the result would start with a digit.
pub fn ident(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// `ai_web_testing` -> `AiWebTesting`.
pub fn type_name(raw: &str) -> String {
    ident(raw).split('_').map(capitalize).collect()
}

/// `page_url` -> `pageUrl`.
pub fn camel(raw: &str) -> String {
    let ident = ident(raw);
    let mut parts = ident.split('_').filter(|p| !p.is_empty());
    let Some(head) = parts.next() else {
        return ident;
    };
    let mut out = head.to_string();
    out.extend(parts.map(capitalize));
    out
}

/// Upper-case the first letter of every word, lower-case the rest.  A word
/// starts after any character that is not a letter, so `ai-powered` becomes
/// `Ai-Powered`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
