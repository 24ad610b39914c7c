use std::path::{Component, PathBuf};

/// Turns a request path into a relative path that cannot leave its root.
///
/// Returns `None` for `..`, absolute or drive-prefixed paths. Empty and `.`
/// segments are dropped.
pub fn sanitize_path(path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in std::path::Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (!clean.as_os_str().is_empty()).then_some(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_plain_relative_paths() {
        assert_eq!(
            sanitize_path("/image/project/pro1/a.png"),
            Some(PathBuf::from("image/project/pro1/a.png"))
        );
        assert_eq!(
            sanitize_path("image/./a.png"),
            Some(PathBuf::from("image/a.png"))
        );
    }

    #[test]
    fn test_rejects_parent_segments_and_empty_paths() {
        assert_eq!(sanitize_path("image/../../etc/passwd"), None);
        assert_eq!(sanitize_path(".."), None);
        assert_eq!(sanitize_path(""), None);
        assert_eq!(sanitize_path("/"), None);
    }
}
