//! Turns a bug's free-text binary field into a list of payload tokens
//!
//! The binary field is either a `,`/`;` separated list, a "not applicable"
//! marker, or a pointer to the repro steps where the list sits inside a
//! `<binary>` (or `<binaries>`) wrapper within rich-text markup.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::winpath;

static LINE_BREAK_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<br>|<br/>|<p>|</p>").expect("valid line break pattern"));

static SPAN_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<span>/</span>").expect("valid span pattern"));

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^>\n]*)>").expect("valid tag pattern"));

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?|\n").expect("valid newline pattern"));

const MOBILE_ONLY_MARKER: &str = "mobileonly";
const NOT_APPLICABLE_MARKERS: &[&str] = &["n/a", "na"];
const SEE_REPRO_STEPS: &str = "seereprosteps";

/// Split a binary field into trimmed, non-empty payload tokens
///
/// Returns an empty list for blank fields, "Mobile Only" fields and "N/A"
/// markers. A field pointing at the repro steps is mined from `repro_steps`.
pub fn sanitize(binary_files: Option<&str>, repro_steps: Option<&str>) -> Vec<String> {
    let field = match binary_files {
        Some(field) if !field.trim().is_empty() => field,
        _ => return Vec::new(),
    };

    if is_mobile_only(field) {
        return Vec::new();
    }

    let compact: String = field.to_lowercase().trim().replace(' ', "");
    if NOT_APPLICABLE_MARKERS.contains(&compact.as_str()) {
        return Vec::new();
    }

    let source = if compact.contains(SEE_REPRO_STEPS) {
        mine_repro_steps(repro_steps.unwrap_or_default())
    } else {
        field.to_string()
    };

    to_ascii(&source)
        .split([',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| !winpath::is_directory_only(token))
        .map(str::to_string)
        .collect()
}

fn is_mobile_only(field: &str) -> bool {
    field
        .replace(['-', ' '], "")
        .trim()
        .eq_ignore_ascii_case(MOBILE_ONLY_MARKER)
}

/// Drop zero-width characters and everything outside ASCII
pub fn to_ascii(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\u{200B}' && *c != '\u{FEFF}')
        .filter(char::is_ascii)
        .collect()
}

/// Extract the wrapped binary list out of rich-text repro steps
///
/// Line breaks inside the wrapper become `,` separators. An opening wrapper
/// with no closing counterpart yields an empty string; so does text with no
/// wrapper at all.
pub fn mine_repro_steps(repro_steps: &str) -> String {
    if repro_steps.is_empty() {
        return String::new();
    }

    let text = LINE_BREAK_TAGS.replace_all(repro_steps, ",");
    let text = SPAN_SLASH.replace_all(&text, "/");
    let text = MARKUP_TAG.replace_all(&text, |caps: &Captures<'_>| {
        if is_wrapper_tag(&caps[1]) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    let text = decode_entities(&text);

    if let Some(inner) = wrapped_section(&text, "<binary>", "</binary>") {
        return inner;
    }
    wrapped_section(&text, "<binaries>", "</binaries>").unwrap_or_default()
}

/// Decode named and numeric character references in one pass
///
/// Unknown references stay as written.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Raw markup tags survive only as lowercase `binary`/`binaries` wrappers
fn is_wrapper_tag(tag: &str) -> bool {
    tag.strip_prefix('/').unwrap_or(tag).starts_with("binary")
}

/// Text after the first `open` up to the next `open`, else up to `close`
///
/// `None` when `open` never occurs; `Some("")` when nothing terminates it.
fn wrapped_section(text: &str, open: &str, close: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find(open)? + open.len();
    let rest = &lower[start..];

    // a repeated opening tag is accepted as the terminator
    let end = match rest.find(open).or_else(|| rest.find(close)) {
        Some(end) => end,
        None => return Some(String::new()),
    };

    let inner = text[start..start + end].trim();
    Some(NEWLINES.replace_all(inner, ",").into_owned())
}
