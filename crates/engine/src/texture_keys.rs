use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureKeyError {
    #[error("texture key must not be empty")]
    Empty,
    #[error("texture path must not start with '/'")]
    LeadingSlash,
    #[error("texture path must not contain '\\\\'")]
    Backslash,
    #[error("texture path must not contain '..'")]
    ParentTraversal,
    #[error("texture key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
    #[error("texture frame size must be positive, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
}

/// Keys are short lowercase identifiers such as `mario` or `floorbricks`.
pub(crate) fn validate_texture_key(key: &str) -> Result<(), TextureKeyError> {
    if key.is_empty() {
        return Err(TextureKeyError::Empty);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-') {
            continue;
        }
        return Err(TextureKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Paths are relative to the asset root, e.g. `entities/mario.png`.
pub(crate) fn validate_texture_path(path: &str) -> Result<(), TextureKeyError> {
    if path.is_empty() {
        return Err(TextureKeyError::Empty);
    }
    if path.starts_with('/') {
        return Err(TextureKeyError::LeadingSlash);
    }
    if path.contains('\\') {
        return Err(TextureKeyError::Backslash);
    }
    if path.contains("..") {
        return Err(TextureKeyError::ParentTraversal);
    }
    for ch in path.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(TextureKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}
