use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{Post, User};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
    pub role_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct IssueSessionRequest {
    pub user_id: String,
}

const MEMBER_ROLE_ID: i64 = 2;

fn require_admin(headers: &HeaderMap, admin_token: &str) -> Result<(), (StatusCode, String)> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".into(),
        ))?;
    let expected_token = format!("Bearer {}", admin_token);
    if auth_header != expected_token {
        return Err((StatusCode::FORBIDDEN, "Invalid Admin Token".into()));
    }
    Ok(())
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("Admin request failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    require_admin(&headers, &state.admin_token)?;
    if payload.id.trim().is_empty() || payload.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "id and name are required".into()));
    }

    let role_id = payload.role_id.unwrap_or(MEMBER_ROLE_ID);
    let user = state
        .db
        .upsert_user(&payload.id, &payload.name, role_id)
        .await
        .map_err(internal)?;
    tracing::info!("User {} saved with role {}", user.id, user.role.name);
    Ok(Json(user))
}

pub async fn issue_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<IssueSessionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    require_admin(&headers, &state.admin_token)?;

    let user = state
        .db
        .get_user(&payload.user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Unknown user".into()))?;
    let token = state.db.issue_session(&user.id).await.map_err(internal)?;
    Ok(Json(serde_json::json!({ "user_id": user.id, "token": token })))
}

pub async fn upsert_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(post): Json<Post>,
) -> Result<Json<&'static str>, (StatusCode, String)> {
    require_admin(&headers, &state.admin_token)?;
    if post.slug.is_empty() || post.slug.contains('/') {
        return Err((StatusCode::BAD_REQUEST, "Invalid post slug".into()));
    }
    state.db.upsert_post(&post).await.map_err(internal)?;
    Ok(Json("Saved"))
}
