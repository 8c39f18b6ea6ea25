//! Windows path semantics for payload tokens
//!
//! Payload entries are Windows paths regardless of the host the service runs
//! on, so `std::path` cannot be used to split them. Both `\` and `/` are
//! separators and directory names are normalised to `\`.

pub const SEPARATOR: char = '\\';

/// Characters that may not appear in a directory path
pub fn is_invalid_path_char(c: char) -> bool {
    c == '|' || c == '\0' || ('\u{1}'..='\u{1f}').contains(&c)
}

/// Characters that may not appear in a file name
pub fn is_invalid_file_name_char(c: char) -> bool {
    is_invalid_path_char(c) || matches!(c, '"' | '<' | '>' | ':' | '*' | '?' | '\\' | '/')
}

pub fn has_invalid_path_chars(s: &str) -> bool {
    s.chars().any(is_invalid_path_char)
}

pub fn has_invalid_file_name_chars(s: &str) -> bool {
    s.chars().any(is_invalid_file_name_char)
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Byte length of the root (`C:`, `C:\`, `\`, `\\server\share\`), 0 when relative
fn root_length(path: &str) -> usize {
    let bytes = path.as_bytes();
    let sep = |i: usize| bytes.get(i).map_or(false, |b| *b == b'\\' || *b == b'/');

    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return if sep(2) { 3 } else { 2 };
    }

    if sep(0) && sep(1) {
        // UNC: \\server\share\
        let mut index = 2;
        for _ in 0..2 {
            while index < bytes.len() && !sep(index) {
                index += 1;
            }
            if index < bytes.len() {
                index += 1;
            }
        }
        return index.min(bytes.len());
    }

    if sep(0) {
        1
    } else {
        0
    }
}

/// Convert `/` to `\` and collapse repeated separators (a leading `\\` survives)
fn normalize_separators(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut previous_separator = false;
    for (index, c) in path.chars().enumerate() {
        if is_separator(c) {
            if previous_separator && index > 1 {
                continue;
            }
            normalized.push(SEPARATOR);
            previous_separator = true;
        } else {
            normalized.push(c);
            previous_separator = false;
        }
    }
    normalized
}

/// Directory component of `path`
///
/// `None` when the path is blank or is nothing but a root; `Some("")` when
/// there is no directory component.
pub fn directory_name(path: &str) -> Option<String> {
    if path.chars().all(|c| c == ' ') {
        return None;
    }

    let root = root_length(path);
    if path.len() <= root {
        return None;
    }

    let bytes = path.as_bytes();
    let mut end = path.len();
    while end > root {
        end -= 1;
        if bytes[end] == b'\\' || bytes[end] == b'/' {
            break;
        }
    }
    while end > root && (bytes[end - 1] == b'\\' || bytes[end - 1] == b'/') {
        end -= 1;
    }

    Some(normalize_separators(&path[..end]))
}

/// File name component of `path` (text after the last separator or root)
pub fn file_name(path: &str) -> &str {
    let root = root_length(path);
    match path.rfind(is_separator) {
        Some(index) if index >= root => &path[index + 1..],
        _ => &path[root..],
    }
}

/// Extension of `name` including the dot, empty when absent or trailing
pub fn extension(name: &str) -> &str {
    for (index, c) in name.char_indices().rev() {
        if c == '.' {
            return if index + 1 == name.len() { "" } else { &name[index..] };
        }
        if is_separator(c) {
            break;
        }
    }
    ""
}

/// A directory with nothing after the last separator, e.g. `drivers\`
pub fn is_directory_only(path: &str) -> bool {
    directory_name(path).map_or(false, |dir| !dir.is_empty()) && file_name(path).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_name() {
        assert_eq!(directory_name("P1/p2/a.dll").as_deref(), Some(r"P1\p2"));
        assert_eq!(directory_name(r"windows\system32\a.dll").as_deref(), Some(r"windows\system32"));
        assert_eq!(directory_name("a.dll").as_deref(), Some(""));
        assert_eq!(directory_name(r"\a.dll").as_deref(), Some(r"\"));
        assert_eq!(directory_name(r"C:\a.dll").as_deref(), Some(r"C:\"));
        assert_eq!(directory_name(r"a\\b//c.dll").as_deref(), Some(r"a\b"));
        assert_eq!(directory_name(r"\"), None);
        assert_eq!(directory_name("   "), None);
        assert_eq!(directory_name(""), None);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("P1/p2/a.dll"), "a.dll");
        assert_eq!(file_name("a.dll"), "a.dll");
        assert_eq!(file_name(r"drivers\"), "");
        assert_eq!(file_name("C:a.dll"), "a.dll");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a.dll"), ".dll");
        assert_eq!(extension("Foo.Resources"), ".Resources");
        assert_eq!(extension("ntoskrnl"), "");
        assert_eq!(extension("trailing."), "");
        assert_eq!(extension(r"dir.d\name"), "");
    }

    #[test]
    fn test_directory_only() {
        assert!(is_directory_only(r"drivers\"));
        assert!(is_directory_only("P1/p2/"));
        assert!(!is_directory_only("a.dll"));
        assert!(!is_directory_only(r"\"));
    }

    #[test]
    fn test_invalid_character_sets() {
        assert!(has_invalid_path_chars("a|b"));
        assert!(has_invalid_path_chars("a\tb"));
        assert!(!has_invalid_path_chars(r"C:\x<y>"));
        assert!(has_invalid_file_name_chars("a?.dll"));
        assert!(has_invalid_file_name_chars(r"a\b"));
        assert!(!has_invalid_file_name_chars("a b.dll"));
    }
}
