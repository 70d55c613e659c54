//! Helpers for `/`-delimited relative paths.

pub const DELIMITER: char = '/';

/// Splits a path into its non-empty segments.
/// Leading, trailing and repeated delimiters do not produce segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(DELIMITER).filter(|s| !s.is_empty())
}

/// Returns the path with redundant delimiters removed.
pub fn normalize_path(path: &str) -> String {
    split_path(path).collect::<Vec<_>>().join("/")
}

/// Returns the segments of `path` that follow the segments of `base`,
/// or `None` if `base` is not a segment-wise prefix of `path`.
pub fn strip_base<'a>(path: &'a str, base: &str) -> Option<Vec<&'a str>> {
    let mut segments = split_path(path);
    for expected in split_path(base) {
        if segments.next()? != expected {
            return None;
        }
    }
    Some(segments.collect())
}
