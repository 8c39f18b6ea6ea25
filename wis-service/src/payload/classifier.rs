//! Classifies payload tokens as binaries or components
//!
//! A token is a Windows path, optionally carrying a parenthetical platform
//! note and a `name:kb:version` suffix. Tokens with a directory or a file
//! extension are binaries; bare names (and `.Resources` names) are components.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};
use wis_common::models::{WorkItemBinary, WorkItemComponent};
use wis_common::WorkItemId;

use super::{escape, winpath};

/// Tokens at or beyond this length are ignored
pub const MAX_TOKEN_LEN: usize = 248;

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").expect("valid parenthetical pattern"));

static KB_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w\.]*):(\d+):(\d\.\d{3})").expect("valid kb suffix pattern"));

/// Platform notes marking a binary that never ships in the desktop payload
const RESTRICTED_PLATFORMS: &[&str] = &["Mobile Only", "Analog Only", "One Core Only"];

const RESOURCES_EXTENSION: &str = ".Resources";

/// Outcome for a single payload token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadEntry {
    Binary(WorkItemBinary),
    Component(WorkItemComponent),
}

/// A token that could not be interpreted at all
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Parenthetical note {0:?} is not a usable path")]
    UnusableParenthetical(String),
}

/// Binaries and components recovered from a token list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub binaries: Vec<WorkItemBinary>,
    pub components: Vec<WorkItemComponent>,
}

/// Classify every token, dropping the ones that do not survive
pub fn classify_tokens(work_item_id: WorkItemId, tokens: &[String]) -> Classification {
    let mut classification = Classification::default();

    for token in tokens {
        match classify_token(work_item_id, token) {
            Ok(Some(PayloadEntry::Binary(binary))) => classification.binaries.push(binary),
            Ok(Some(PayloadEntry::Component(component))) => {
                classification.components.push(component)
            }
            Ok(None) => debug!(work_item_id, token = %token, "Payload token dropped"),
            Err(e) => warn!(work_item_id, token = %token, error = %e, "Skipping payload token"),
        }
    }

    classification
}

/// Classify one token
///
/// `Ok(None)` means the token is intentionally excluded (blank, too long,
/// restricted platform residue, or nothing left of the name).
pub fn classify_token(
    work_item_id: WorkItemId,
    token: &str,
) -> Result<Option<PayloadEntry>, TokenError> {
    if token.trim().is_empty() {
        return Ok(None);
    }
    let mut token = token.trim().to_string();
    if token.len() >= MAX_TOKEN_LEN {
        return Ok(None);
    }

    // Step 1: parenthetical platform note
    let mut parenthetical_is_path = false;
    let note = PARENTHETICAL
        .captures(&token)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()));
    if let Some((whole, inner)) = note {
        if !inner.is_empty() {
            parenthetical_is_path = match winpath::directory_name(&inner) {
                Some(dir) => !dir.is_empty(),
                None => return Err(TokenError::UnusableParenthetical(inner)),
            };

            if is_restricted_platform(&inner) {
                token = replace_ignore_ascii_case(&token, &whole, "");
            }
        }
    }

    // Step 2: placeholders to literal characters
    let token = escape::decode(&token);
    if token.is_empty() || token.len() >= MAX_TOKEN_LEN {
        return Ok(None);
    }

    // Step 3: split into directory and file name
    let mut path = if parenthetical_is_path || winpath::has_invalid_path_chars(&token) {
        String::new()
    } else {
        winpath::directory_name(&token).unwrap_or_default()
    };
    let mut name = if parenthetical_is_path {
        token.clone()
    } else {
        winpath::file_name(&token).to_string()
    };

    // Step 4: name:kb:version suffix
    if let Some(stripped) = KB_SUFFIX.captures(&name).map(|caps| caps[1].to_string()) {
        name = stripped;
    }

    // Step 5: normalise the directory and re-check both halves
    if path == "\\" || path == "." {
        path = ".\\".to_string();
    }
    if !path.is_empty() && !path.ends_with('\\') {
        path = format!("{}\\", path.trim());
    }
    if winpath::has_invalid_path_chars(&path) {
        warn!(work_item_id, path = %path, "Payload path contains invalid characters");
        path.clear();
    }
    if winpath::has_invalid_file_name_chars(&name) {
        warn!(work_item_id, name = %name, "Payload binary name contains invalid characters");
        name.clear();
    }

    // Step 6: reserved characters left over go back to placeholders
    let path = escape::encode(&path);
    let name = escape::encode(name.trim());
    if name.is_empty() {
        return Ok(None);
    }

    // Step 7: binary or component
    let extension = winpath::extension(&name);
    let is_component = path.trim().is_empty()
        && (extension.trim().is_empty() || extension.eq_ignore_ascii_case(RESOURCES_EXTENSION));

    Ok(Some(if is_component {
        PayloadEntry::Component(WorkItemComponent { name })
    } else {
        PayloadEntry::Binary(WorkItemBinary { name, path })
    }))
}

fn is_restricted_platform(note: &str) -> bool {
    let note = note.to_ascii_lowercase();
    RESTRICTED_PLATFORMS.iter().any(|platform| {
        let platform = platform.to_ascii_lowercase();
        note.contains(&platform) || note.contains(&platform.replace(' ', ""))
    })
}

/// Replace every ASCII-case-insensitive occurrence of `needle`
fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }

    let lower_haystack = haystack.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();
    let mut result = String::with_capacity(haystack.len());
    let mut last = 0;
    for (start, _) in lower_haystack.match_indices(&lower_needle) {
        result.push_str(&haystack[last..start]);
        result.push_str(replacement);
        last = start + needle.len();
    }
    result.push_str(&haystack[last..]);
    result
}
