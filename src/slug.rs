pub const MAX_SLUG_LEN: usize = 150;

/// Lowercases `text`, keeps letters and digits, and joins the remaining
/// words with single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    if slug.chars().count() > MAX_SLUG_LEN {
        slug = slug.chars().take(MAX_SLUG_LEN).collect();
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// First of `base`, `base-2`, `base-3`, ... not in `taken`.
pub fn unique_slug<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|t| t.as_ref() == candidate);
    if !is_taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
