use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::{success, Admin, ApiJson, ApiState};
use crate::models::{Skill, SkillPayload};
use crate::store::RecordId;
use crate::{PortfolioError, PortfolioResult};

pub(super) async fn list_skills(State(state): State<ApiState>) -> PortfolioResult<Json<Value>> {
    let skills = state.skills.list()?;
    Ok(Json(json!({ "success": true, "skills": skills })))
}

pub(super) async fn create_skill(
    _admin: Admin,
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<SkillPayload>,
) -> PortfolioResult<Json<Value>> {
    let skill = state
        .skills
        .create(&mut |id| payload.clone().into_skill(id))?;
    Ok(Json(json!({ "success": true, "skill": skill })))
}

pub(super) async fn update_skill(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
    ApiJson(payload): ApiJson<SkillPayload>,
) -> PortfolioResult<Json<Value>> {
    let skill = state
        .skills
        .update(id, &mut |skill: &mut Skill| payload.apply_to(skill))?
        .ok_or_else(|| PortfolioError::not_found("Skill", id))?;
    Ok(Json(json!({ "success": true, "skill": skill })))
}

pub(super) async fn delete_skill(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
) -> PortfolioResult<Json<Value>> {
    state.skills.delete(id)?;
    Ok(success())
}
