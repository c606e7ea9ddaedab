#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,
    #[error("slug `{0}` contains a path separator")]
    Separator(String),
    #[error("slug `{0}` is a path traversal")]
    Traversal(String),
    #[error("slug `{0}` contains a forbidden character")]
    ForbiddenChar(String),
    #[error("slug `{0}` is a reserved name on Windows")]
    Reserved(String),
}

/// Slugs come straight from the export and become directory and file
/// names, so anything path-like is rejected rather than repaired; a
/// repaired slug would no longer round-trip to the same output path on a
/// re-run.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.trim().is_empty() {
        return Err(SlugError::Empty);
    }
    if slug.contains('/') || slug.contains('\\') {
        return Err(SlugError::Separator(slug.to_string()));
    }
    if slug == "." || slug == ".." {
        return Err(SlugError::Traversal(slug.to_string()));
    }
    if slug.chars().any(is_forbidden) {
        return Err(SlugError::ForbiddenChar(slug.to_string()));
    }
    let stem = slug.split('.').next().unwrap_or(slug);
    if is_reserved_windows_name(stem) {
        return Err(SlugError::Reserved(slug.to_string()));
    }
    Ok(())
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
