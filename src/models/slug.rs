/// Derive a URL-safe slug from a blog title.
///
/// The title is lowercased, every run of characters outside `[a-z0-9]` is
/// collapsed into a single `-`, and leading/trailing dashes are removed.
/// Returns `None` when nothing URL-safe remains (e.g. a title made only of
/// punctuation), so the blog is stored without a slug.
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.to_lowercase().chars() {
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
        None
    } else {
        Some(slug)
    }
}

/// Check that a string has the shape produced by [`slugify`].
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
