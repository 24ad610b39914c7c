use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bevy_derive::{Deref, DerefMut};
use bevy_log::error;
use serde_json::json;
use std::collections::HashMap;

use super::PortfolioError;

/// HTML pages for failed static asset requests, keyed by status.
#[derive(Clone, Debug, Deref, DerefMut)]
pub struct ErrorPages(HashMap<StatusCode, String>);

impl ErrorPages {
    /// Registered page for `status`, or a generic one built from its reason phrase.
    pub fn render(&self, status: StatusCode) -> String {
        match self.0.get(&status) {
            Some(page) => page.clone(),
            None => error_page(status, "Something went wrong."),
        }
    }

    pub fn response(&self, status: StatusCode) -> Response {
        (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            self.render(status),
        )
            .into_response()
    }
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self(HashMap::from([
            (
                StatusCode::NOT_FOUND,
                error_page(StatusCode::NOT_FOUND, "That image is not part of the portfolio."),
            ),
            (
                StatusCode::FORBIDDEN,
                error_page(StatusCode::FORBIDDEN, "That path is outside the site."),
            ),
        ]))
    }
}

fn error_page(status: StatusCode, detail: &str) -> String {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{code} {reason}</title>\
         <style>body{{font-family:sans-serif;background:#0a0e27;color:#e6edf3;text-align:center;padding-top:15vh}}\
         h1{{color:#64c8ff;font-size:4rem;margin:0}}a{{color:#64c8ff}}</style></head>\
         <body><h1>{code}</h1><p>{reason}. {detail}</p><p><a href=\"/\">Back to the portfolio</a></p></body></html>\n"
    )
}

impl PortfolioError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::AuthError { .. } => StatusCode::UNAUTHORIZED,
            Self::HttpError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::BindFailed { .. }
            | Self::ServerAlreadyRunning { .. }
            | Self::IoError { .. }
            | Self::Storage { .. }
            | Self::ConfigError { .. }
            | Self::MailError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API failures are reported as `{"success": false, "error": "..."}`.
impl IntoResponse for PortfolioError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let message = match &self {
            Self::AuthError { .. } => "Unauthorized".to_string(),
            Self::HttpError { message, .. } => message.clone(),
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
