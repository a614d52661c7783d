//! Rooting caller-supplied paths at the GitLab v4 API prefix.

/// Prefix every dispatched path is rooted at.
pub const API_ROOT: &str = "/api/v4";

/// Rewrite `path` into an absolute path under [`API_ROOT`].
///
/// A missing leading slash is added first, then the root is prepended unless
/// already present. Both prefix checks ignore ASCII case, so
/// `/API/V4/users` is left untouched. Applying this twice gives the same
/// result as applying it once.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    if !starts_with_ignore_ascii_case(&normalized, API_ROOT) {
        normalized.insert_str(0, API_ROOT);
    }

    normalized
}

fn starts_with_ignore_ascii_case(value: &str, prefix: &str) -> bool {
    value
        .as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}
