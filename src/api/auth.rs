use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use bevy_log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiJson, ApiState};
use crate::config::PortfolioConfig;
use crate::{PortfolioError, PortfolioResult};

pub(super) const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Admin login and the token handed out for it.
#[derive(Clone, Debug)]
pub struct AdminCredentials {
    username: String,
    password: String,
    token: String,
}

impl AdminCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            token: token.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }

    /// Accepts both `Bearer <token>` and the bare token.
    pub fn accepts(&self, presented: &str) -> bool {
        presented == self.token
            || presented
                .strip_prefix("Bearer ")
                .is_some_and(|token| token == self.token)
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl From<&PortfolioConfig> for AdminCredentials {
    fn from(config: &PortfolioConfig) -> Self {
        Self::new(
            config.admin_username.clone(),
            config.admin_password.clone(),
            config.admin_token.clone(),
        )
    }
}

/// Token presented by the caller: `Authorization`, or `X-Auth-Token` when that is absent or empty.
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    non_empty_header(headers, AUTHORIZATION.as_str())
        .or_else(|| non_empty_header(headers, AUTH_TOKEN_HEADER))
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Extractor guarding admin-only routes.
#[derive(Clone, Copy, Debug)]
pub struct Admin;

impl FromRequestParts<ApiState> for Admin {
    type Rejection = PortfolioError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        match presented_token(&parts.headers) {
            Some(token) if state.credentials.accepts(token) => Ok(Admin),
            Some(_) => Err(PortfolioError::auth_error("invalid admin token")),
            None => Err(PortfolioError::auth_error("missing admin token")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

pub(super) async fn login(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> PortfolioResult<Json<Value>> {
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    info!("Login attempt for user '{}'", username);

    if !state.credentials.matches(&username, &password) {
        warn!("Rejected login for user '{}'", username);
        return Err(PortfolioError::http_error(
            401,
            "Invalid credentials. Please check your username and password.",
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": state.credentials.token(),
    })))
}

pub(super) async fn logout() -> Json<Value> {
    Json(json!({ "success": true, "message": "Logged out successfully" }))
}
