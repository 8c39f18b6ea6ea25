//! Placeholder escapes for characters that are reserved in file system names
//!
//! Tracker fields spell reserved characters as `#name#` placeholders. Tokens
//! are decoded to literal characters before classification and the surviving
//! reserved characters are encoded again on the way out.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Placeholder text ↔ reserved character
const ESCAPES: &[(&str, char)] = &[
    ("#quote#", '"'),
    ("#lessThan#", '<'),
    ("#greaterThan#", '>'),
    ("#orsymbol#", '|'),
    ("#nullchar#", '\0'),
    ("#colon#", ':'),
    ("#star#", '*'),
    ("#question#", '?'),
];

static PLACEHOLDER_TO_CHAR: Lazy<HashMap<String, char>> = Lazy::new(|| {
    ESCAPES
        .iter()
        .map(|(placeholder, c)| (placeholder.to_ascii_lowercase(), *c))
        .collect()
});

static CHAR_TO_PLACEHOLDER: Lazy<HashMap<char, &'static str>> =
    Lazy::new(|| ESCAPES.iter().map(|(placeholder, c)| (*c, *placeholder)).collect());

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = ESCAPES
        .iter()
        .map(|(placeholder, _)| regex::escape(placeholder))
        .collect();
    Regex::new(&format!("(?i){}", alternatives.join("|"))).expect("escape table forms a valid pattern")
});

/// Whether `c` has a placeholder spelling
pub fn is_reserved(c: char) -> bool {
    CHAR_TO_PLACEHOLDER.contains_key(&c)
}

/// Replace every placeholder (matched case-insensitively) with its character
pub fn decode(text: &str) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let key = caps[0].to_ascii_lowercase();
            PLACEHOLDER_TO_CHAR
                .get(&key)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Replace every reserved character with its placeholder
pub fn encode(text: &str) -> String {
    if !text.chars().any(is_reserved) {
        return text.to_string();
    }

    let mut encoded = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match CHAR_TO_PLACEHOLDER.get(&c) {
            Some(placeholder) => encoded.push_str(placeholder),
            None => encoded.push(c),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_reserved_char_round_trips() {
        for (_, c) in ESCAPES {
            let encoded = encode(&c.to_string());
            assert_ne!(encoded, c.to_string());
            assert_eq!(decode(&encoded), c.to_string());
        }
    }

    #[test]
    fn test_every_placeholder_round_trips() {
        for (placeholder, _) in ESCAPES {
            let token = format!("dir{}name.dll", placeholder);
            assert_eq!(encode(&decode(&token)), token);
        }
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(decode("a#COLON#b"), "a:b");
        assert_eq!(decode("#LessThan#x#greaterthan#"), "<x>");
    }

    #[test]
    fn test_decode_leaves_unknown_hashes() {
        assert_eq!(decode("#pound#file#1.dll"), "#pound#file#1.dll");
    }

    #[test]
    fn test_encode_plain_text_untouched() {
        assert_eq!(encode(r"windows\system32\kernel32.dll"), r"windows\system32\kernel32.dll");
    }

    #[test]
    fn test_encode_multiple() {
        assert_eq!(encode("C:\\a*b?"), "C#colon#\\a#star#b#question#");
        assert_eq!(encode("\0|"), "#nullchar##orsymbol#");
    }
}
