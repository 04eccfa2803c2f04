//! URL slugs from free text.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing slug-worthy was left after dropping non `[a-z0-9]` characters
    #[error("empty string not permitted")]
    Empty,
}

/// Lowercase `s` and collapse every run of characters outside `[a-z0-9]` into a single
/// `-`, trimming dashes from both ends.
pub fn slugify(s: &str) -> Result<String, SlugError> {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;

    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return Err(SlugError::Empty);
    }

    Ok(slug)
}
