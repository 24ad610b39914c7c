//! JSON API consumed by the portfolio site and its admin panel.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bevy_log::info;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::PortfolioConfig;
use crate::mail::{log_mail_setup, Outbox, SmtpMailer};
use crate::models::{default_skills, Message, Project, Skill};
use crate::static_assets::{serve_image, StaticAssets};
use crate::store::{JsonFileStore, Repository};
use crate::{PortfolioError, PortfolioResult};

mod auth;
mod messages;
mod projects;
mod skills;


pub use auth::{Admin, AdminCredentials};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct ApiState {
    pub messages: Arc<dyn Repository<Message>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub skills: Arc<dyn Repository<Skill>>,
    pub outbox: Outbox,
    pub credentials: Arc<AdminCredentials>,
    pub assets: Arc<StaticAssets>,
}

impl ApiState {
    /// Opens the JSON stores under `config.data_dir` and wires the SMTP outbox.
    pub fn from_config(config: &PortfolioConfig) -> PortfolioResult<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            PortfolioError::io_error(format!("create {}", config.data_dir.display()), e)
        })?;

        let messages = JsonFileStore::<Message>::open(config.messages_file())?;
        let projects = JsonFileStore::<Project>::open(config.projects_file())?;
        let skills = JsonFileStore::open_or_seed(config.skills_file(), default_skills())?;

        log_mail_setup(&config.mail);

        Ok(Self {
            messages: Arc::new(messages),
            projects: Arc::new(projects),
            skills: Arc::new(skills),
            outbox: Outbox::new(Arc::new(SmtpMailer::new(config.mail.clone()))),
            credentials: Arc::new(AdminCredentials::from(config)),
            assets: Arc::new(StaticAssets::new(config.site_root.clone())),
        })
    }
}

pub fn router(state: ApiState) -> Router {
    info!("Mounting portfolio API routes");

    Router::new()
        .route("/api/health", get(health))
        .route("/api/contact", post(messages::submit_contact))
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        .route("/api/messages", get(messages::list_messages))
        .route("/api/messages/{id}", axum::routing::delete(messages::delete_message))
        .route("/api/messages/{id}/read", put(messages::mark_read))
        .route("/api/messages/{id}/replied", put(messages::mark_replied))
        .route("/api/send-email", post(messages::send_reply_email))
        .route("/api/test-email-endpoint", post(messages::test_email_endpoint))
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/projects/{id}/status", put(projects::update_status))
        .route(
            "/api/skills",
            get(skills::list_skills).post(skills::create_skill),
        )
        .route(
            "/api/skills/{id}",
            put(skills::update_skill).delete(skills::delete_skill),
        )
        .route("/image/{*path}", get(serve_image))
        .layer(cors_layer())
        .with_state(state)
}

/// Mirrors the caller's origin so the admin panel can be hosted anywhere.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            ACCEPT,
            HeaderName::from_static(auth::AUTH_TOKEN_HEADER),
        ])
        .expose_headers([CONTENT_TYPE])
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// `Json` whose rejection is reported as a 400 in the API's error shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = PortfolioError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| PortfolioError::invalid_input(rejection.body_text()))?;
        Ok(Self(value))
    }
}
