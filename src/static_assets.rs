//! Serves uploaded project images from the site root.

use axum::extract::{Path, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bevy_derive::{Deref, DerefMut};
use bevy_log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::api::ApiState;
use crate::error::ErrorPages;
use crate::utils::sanitize_path;

/// Extensions that get a cache header when served.
#[derive(Clone, Debug, Deref, DerefMut)]
pub struct StaticFileExtensions {
    extensions: HashSet<String>,
}

impl StaticFileExtensions {
    const DEFAULT_EXTENSIONS: [&'static str; 8] =
        ["png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "pdf"];

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive lookup by the extension of `file_path`.
    pub fn is_cacheable(&self, file_path: &std::path::Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

impl Default for StaticFileExtensions {
    fn default() -> Self {
        Self::with_extensions(Self::DEFAULT_EXTENSIONS)
    }
}

/// File serving rooted at the portfolio site directory.
#[derive(Clone, Debug)]
pub struct StaticAssets {
    root: PathBuf,
    extensions: StaticFileExtensions,
    pages: ErrorPages,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: StaticFileExtensions::default(),
            pages: ErrorPages::default(),
        }
    }

    pub fn with_extensions(mut self, extensions: StaticFileExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Reads `relative` below the root. Paths escaping it get a 403 page, missing files a 404.
    pub fn serve(&self, relative: &str) -> Response {
        let Some(safe_path) = sanitize_path(relative) else {
            debug!("Rejected asset path {:?}", relative);
            return self.pages.response(StatusCode::FORBIDDEN);
        };
        let full_path = self.root.join(&safe_path);

        match fs::read(&full_path) {
            Ok(contents) => {
                let mut headers = HeaderMap::new();
                let mime_type = mime_guess::from_path(&full_path).first_or_octet_stream();
                if let Ok(value) = HeaderValue::from_str(mime_type.essence_str()) {
                    headers.insert(header::CONTENT_TYPE, value);
                }
                if self.extensions.is_cacheable(&full_path) {
                    headers.insert(
                        header::CACHE_CONTROL,
                        HeaderValue::from_static("public, max-age=3600"),
                    );
                }
                (headers, contents).into_response()
            }
            Err(_) => {
                info!("File not found: {}", full_path.display());
                self.pages.response(StatusCode::NOT_FOUND)
            }
        }
    }
}

/// `GET /image/{*path}`
pub async fn serve_image(State(state): State<ApiState>, Path(path): Path<String>) -> Response {
    state.assets.serve(&format!("image/{}", path))
}
