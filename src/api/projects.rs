use axum::extract::{Path, Query, State};
use axum::Json;
use bevy_log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{success, Admin, ApiJson, ApiState};
use crate::models::{now, Project, ProjectPayload, ProjectStatus};
use crate::store::RecordId;
use crate::{PortfolioError, PortfolioResult};

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProjectFilter {
    status: Option<String>,
}

/// Public listing; `?status=live` narrows it to one status, `?status=` does not.
pub(super) async fn list_projects(
    State(state): State<ApiState>,
    Query(filter): Query<ProjectFilter>,
) -> PortfolioResult<Json<Value>> {
    let mut projects = state.projects.list()?;
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        projects.retain(|project| project.status.to_string() == status);
    }
    Ok(Json(json!({ "success": true, "projects": projects })))
}

pub(super) async fn get_project(
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
) -> PortfolioResult<Json<Value>> {
    let project = state
        .projects
        .get(id)?
        .ok_or_else(|| PortfolioError::not_found("Project", id))?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub(super) async fn create_project(
    _admin: Admin,
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<ProjectPayload>,
) -> PortfolioResult<Json<Value>> {
    let project = state
        .projects
        .create(&mut |id| payload.clone().into_project(id))?;
    info!(
        "Created project #{} '{}' ({}, {} image(s))",
        project.id,
        project.name,
        project.status,
        project.images.len()
    );
    Ok(Json(json!({ "success": true, "project": project })))
}

pub(super) async fn update_project(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
    ApiJson(payload): ApiJson<ProjectPayload>,
) -> PortfolioResult<Json<Value>> {
    let project = state
        .projects
        .update(id, &mut |project: &mut Project| payload.apply_to(project))?
        .ok_or_else(|| PortfolioError::not_found("Project", id))?;
    info!("Updated project #{}", project.id);
    Ok(Json(json!({ "success": true, "project": project })))
}

pub(super) async fn delete_project(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
) -> PortfolioResult<Json<Value>> {
    if state.projects.delete(id)? {
        info!("Deleted project #{}", id);
    }
    Ok(success())
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct StatusChange {
    status: Option<String>,
}

pub(super) async fn update_status(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
    ApiJson(change): ApiJson<StatusChange>,
) -> PortfolioResult<Json<Value>> {
    if state.projects.get(id)?.is_none() {
        return Err(PortfolioError::not_found("Project", id));
    }

    // A missing status means draft.
    let status = ProjectStatus::parse(change.status.as_deref().unwrap_or("draft"))
        .ok_or_else(|| PortfolioError::invalid_input("Invalid status"))?;

    let project = state
        .projects
        .update(id, &mut |project: &mut Project| {
            project.status = status;
            project.updated_at = now();
        })?
        .ok_or_else(|| PortfolioError::not_found("Project", id))?;
    Ok(Json(json!({ "success": true, "project": project })))
}
