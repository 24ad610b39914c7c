//! Image path normalization for project records.
//!
//! The admin UI lets people paste anything into a project's image list: a bare
//! filename, a path relative to the site, a Windows or POSIX absolute path from
//! their own machine, or a full URL. Everything that is not a remote reference
//! is forced into the project's own asset folder:
//!
//! ```text
//! image/project/pro<id>/<filename>
//! ```
//!
//! Nothing here fails. Malformed input still produces a deterministic path, and
//! empty input produces `None`.

/// Identifier of a project record.
pub type ProjectId = u64;

const REMOTE_PREFIXES: [&str; 3] = ["http://", "https://", "data:"];
const IMAGE_DIR: &str = "image";
const PROJECT_DIR: &str = "project";

/// Shape of an image path, decided once and then dispatched on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImagePath<'a> {
    /// URL or data URI, kept verbatim.
    Remote(&'a str),
    /// Contains a drive separator or starts with `/`. Slashes already normalized.
    Absolute(String),
    /// Already inside `image/project/pro<id>/` for the project it was checked against.
    Canonical(String),
    /// Anything else. Slashes already normalized.
    Relative(String),
}

impl<'a> ImagePath<'a> {
    /// Classifies `path` as-is, without trimming. Returns `None` for an empty string.
    pub fn classify(path: &'a str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }

        if is_remote(path) {
            return Some(Self::Remote(path));
        }

        let normalized = path.replace('\\', "/");
        if normalized.contains(':') || normalized.starts_with('/') {
            Some(Self::Absolute(normalized))
        } else {
            Some(Self::Relative(normalized))
        }
    }

    /// Promotes a path to [`ImagePath::Canonical`] when it already lives in the
    /// folder of `project_id`. Remote references are returned untouched.
    pub fn within_project(self, project_id: ProjectId) -> Self {
        match self {
            Self::Absolute(path) | Self::Relative(path)
                if is_in_project_folder(&path, project_id) =>
            {
                Self::Canonical(path)
            }
            other => other,
        }
    }

    /// Web-safe form of the path, without choosing a project folder.
    pub fn into_normalized(self) -> String {
        match self {
            Self::Remote(path) => path.to_owned(),
            Self::Absolute(path) => strip_to_image_root(&path),
            Self::Canonical(path) | Self::Relative(path) => path,
        }
    }

    /// Final placement inside the folder of `project_id`.
    pub fn into_project_path(self, project_id: ProjectId) -> String {
        match self {
            Self::Remote(path) => path.to_owned(),
            Self::Canonical(path) => path,
            Self::Absolute(path) | Self::Relative(path) => {
                project_image_path(project_id, basename(&path))
            }
        }
    }
}

/// Converts whatever the admin pasted into a web-safe path.
///
/// Remote references come back unchanged. Absolute paths are cut down to
/// everything below their `image` folder, or to the bare filename when there is
/// no such folder. Relative paths only get their separators normalized.
pub fn normalize_image_path(raw: &str) -> Option<String> {
    ImagePath::classify(raw.trim()).map(ImagePath::into_normalized)
}

/// Forces an arbitrary image path into `image/project/pro<project_id>/<filename>`.
///
/// Remote references and paths already in this project's folder are returned
/// unchanged, so calling it again on its own output is a no-op.
pub fn to_project_image_path(raw: &str, project_id: ProjectId) -> Option<String> {
    let normalized = normalize_image_path(raw)?;
    let path = ImagePath::classify(&normalized)?.within_project(project_id);
    Some(path.into_project_path(project_id))
}

/// Folder prefix of a project, e.g. `image/project/pro3`.
pub fn project_folder(project_id: ProjectId) -> String {
    format!("{IMAGE_DIR}/{PROJECT_DIR}/pro{project_id}")
}

fn project_image_path(project_id: ProjectId, filename: &str) -> String {
    format!("{}/{filename}", project_folder(project_id))
}

fn is_remote(path: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|prefix| {
        path.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

fn is_in_project_folder(path: &str, project_id: ProjectId) -> bool {
    let parts: Vec<&str> = path.split('/').collect();
    parts.len() >= 4
        && parts[0] == IMAGE_DIR
        && parts[1] == PROJECT_DIR
        && parts[2] == format!("pro{project_id}")
}

fn strip_to_image_root(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    match parts
        .iter()
        .position(|part| part.eq_ignore_ascii_case(IMAGE_DIR))
    {
        Some(index) => {
            let relative = parts[index + 1..].join("/");
            if relative.is_empty() {
                IMAGE_DIR.to_owned()
            } else {
                format!("{IMAGE_DIR}/{relative}")
            }
        }
        // Directories above the file cannot be mapped onto the web root.
        None => basename(path).to_owned(),
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_windows_path_under_image_folder() {
        assert_eq!(
            normalize_image_path("C:\\Users\\me\\image\\project\\pro3\\photo.png").as_deref(),
            Some("image/project/pro3/photo.png")
        );
    }

    #[test]
    fn test_normalize_posix_path_without_image_folder() {
        assert_eq!(
            normalize_image_path("/home/me/assets/photo.png").as_deref(),
            Some("photo.png")
        );
    }

    #[test]
    fn test_normalize_image_folder_match_is_case_insensitive() {
        assert_eq!(
            normalize_image_path("D:/site/Image/gallery/a.jpg").as_deref(),
            Some("image/gallery/a.jpg")
        );
    }

    #[test]
    fn test_normalize_path_ending_at_image_folder() {
        assert_eq!(normalize_image_path("/var/www/image").as_deref(), Some("image"));
        assert_eq!(normalize_image_path("/var/www/image/").as_deref(), Some("image"));
    }

    #[test]
    fn test_normalize_relative_path_only_fixes_separators() {
        assert_eq!(
            normalize_image_path("  assets\\shots\\b.png ").as_deref(),
            Some("assets/shots/b.png")
        );
    }

    #[test]
    fn test_normalize_remote_references_untouched() {
        assert_eq!(
            normalize_image_path("  HTTPS://cdn.example.com/A.png  ").as_deref(),
            Some("HTTPS://cdn.example.com/A.png")
        );
        assert_eq!(
            normalize_image_path("data:image/png;base64,AAAA").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_empty_input_is_absent() {
        assert_eq!(normalize_image_path(""), None);
        assert_eq!(normalize_image_path("   "), None);
        assert_eq!(to_project_image_path("", 1), None);
        assert_eq!(to_project_image_path("\t\n", 1), None);
    }

    #[test]
    fn test_bare_root_normalizes_to_nothing() {
        assert_eq!(normalize_image_path("/").as_deref(), Some(""));
        assert_eq!(to_project_image_path("/", 4), None);
    }

    #[test]
    fn test_project_path_for_bare_filename() {
        assert_eq!(
            to_project_image_path("photo.png", 5).as_deref(),
            Some("image/project/pro5/photo.png")
        );
    }

    #[test]
    fn test_project_path_keeps_canonical_path_for_same_project() {
        assert_eq!(
            to_project_image_path("image/project/pro5/photo.png", 5).as_deref(),
            Some("image/project/pro5/photo.png")
        );
    }

    #[test]
    fn test_project_path_reroots_canonical_path_of_other_project() {
        assert_eq!(
            to_project_image_path("image/project/pro5/photo.png", 7).as_deref(),
            Some("image/project/pro7/photo.png")
        );
        // pro5 must not be mistaken for pro55
        assert_eq!(
            to_project_image_path("image/project/pro5/photo.png", 55).as_deref(),
            Some("image/project/pro55/photo.png")
        );
    }

    #[test]
    fn test_project_path_keeps_remote_reference() {
        assert_eq!(
            to_project_image_path("https://cdn.example.com/a.png", 5).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_project_path_from_absolute_windows_path_of_other_project() {
        assert_eq!(
            to_project_image_path("C:\\work\\site\\image\\project\\pro2\\x.webp", 9).as_deref(),
            Some("image/project/pro9/x.webp")
        );
    }

    #[test]
    fn test_project_path_drops_traversal_segments() {
        assert_eq!(
            to_project_image_path("../../etc/passwd", 3).as_deref(),
            Some("image/project/pro3/passwd")
        );
    }

    #[test]
    fn test_project_path_keeps_nested_canonical_path() {
        assert_eq!(
            to_project_image_path("image/project/pro2/thumbs/a.png", 2).as_deref(),
            Some("image/project/pro2/thumbs/a.png")
        );
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(ImagePath::classify(""), None);
        assert_eq!(
            ImagePath::classify("Data:xyz"),
            Some(ImagePath::Remote("Data:xyz"))
        );
        assert_eq!(
            ImagePath::classify("c:\\a\\b.png"),
            Some(ImagePath::Absolute("c:/a/b.png".to_owned()))
        );
        assert_eq!(
            ImagePath::classify("image/project/pro1/a.png").map(|p| p.within_project(1)),
            Some(ImagePath::Canonical("image/project/pro1/a.png".to_owned()))
        );
        assert_eq!(
            ImagePath::classify("image/project/pro1/a.png").map(|p| p.within_project(2)),
            Some(ImagePath::Relative("image/project/pro1/a.png".to_owned()))
        );
    }

    #[test]
    fn test_canonical_check_ignores_colons_in_filename() {
        assert_eq!(
            to_project_image_path("image/project/pro1/a:b/c.png", 1).as_deref(),
            Some("image/project/pro1/a:b/c.png")
        );
    }

    #[test]
    fn test_project_folder() {
        assert_eq!(project_folder(12), "image/project/pro12");
    }

    fn path_like() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[ a-zA-Z0-9./\\\\:_-]{0,40}").expect("valid regex")
    }

    proptest! {
        #[test]
        fn prop_remote_references_pass_through(
            scheme in prop_oneof![Just("http://"), Just("HTTPS://"), Just("data:")],
            rest in "[a-zA-Z0-9./\\\\:_-]{0,30}",
            pad in " {0,3}",
            id in 1u64..1000,
        ) {
            let trimmed = format!("{scheme}{rest}");
            let raw = format!("{pad}{trimmed}{pad}");
            prop_assert_eq!(normalize_image_path(&raw), Some(trimmed.clone()));
            prop_assert_eq!(to_project_image_path(&raw, id), Some(trimmed));
        }

        #[test]
        fn prop_project_path_is_idempotent(raw in path_like(), id in 1u64..1000) {
            if let Some(once) = to_project_image_path(&raw, id) {
                prop_assert_eq!(to_project_image_path(&once, id), Some(once));
            }
        }

        #[test]
        fn prop_non_remote_output_lands_in_project_folder(raw in "[a-zA-Z0-9./\\\\_-]{1,40}", id in 1u64..1000) {
            if let Some(path) = to_project_image_path(&raw, id) {
                let prefix = format!("{}/", project_folder(id));
                prop_assert!(path.starts_with(&prefix));
            }
        }
    }
}
