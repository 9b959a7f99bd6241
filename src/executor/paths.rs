//! Server-side path helpers. Paths are `/`-separated and relative to the
//! server's data root, so `std::path` is not used.

/// Last component of `path`, ignoring trailing slashes. `"/"` yields `""`.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Target path for `name` inside `destination`; the root joins as `/name`
pub fn join_destination(destination: &str, name: &str) -> String {
    format!("{}/{}", destination.trim_end_matches('/'), name)
}
