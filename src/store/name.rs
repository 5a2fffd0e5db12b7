const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const RESERVED_NAMES: &[&str] = &["CON", "PRN", "AUX", "NUL"];
/// File names are capped at 255 bytes; leave room for the `.json.tmp` suffix
const MAX_NAME_BYTES: usize = 255 - ".".len() - super::TEMP_EXTENSION.len();

/// Check that `name` can be used as a document file name on any platform
pub fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(format!("name must be at most {MAX_NAME_BYTES} bytes"));
    }
    if let Some(c) = name.chars().find(|c| ILLEGAL_CHARS.contains(c) || c.is_control()) {
        return Err(format!("name contains illegal character {c:?}"));
    }
    if name == "." || name == ".." {
        return Err("name must not be a relative path component".to_string());
    }
    if name.ends_with('.') || name.ends_with(' ') {
        return Err("name must not end with a dot or a space".to_string());
    }
    if is_reserved(name) {
        return Err(format!("'{name}' is a reserved device name"));
    }
    Ok(())
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).to_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        return true;
    }
    ["COM", "LPT"].iter().any(|prefix| {
        stem.strip_prefix(prefix)
            .is_some_and(|digit| matches!(digit, "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9"))
    })
}
