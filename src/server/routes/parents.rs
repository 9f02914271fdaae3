use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::db::queries::{parents, progress, submissions};
use crate::db::{QuizSubmission, StudentProgress};
use crate::db::queries::parents::Child;
use crate::server::app::AppState;
use crate::server::auth::{AdminUser, AuthUser};
use crate::server::error::{ApiError, ApiResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentLink {
    parent_id: i64,
    child_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChildReport {
    progress: Vec<StudentProgress>,
    submissions: Vec<QuizSubmission>,
}

async fn list_children(user: AuthUser, State(pool): State<SqlitePool>) -> ApiResponse<Vec<Child>> {
    if !user.is_parent() && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(parents::get_children(&pool, user.id).await?))
}

/// Full report for one child. Admins can read any student; parents only
/// their linked children.
async fn child_progress(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(child_id): Path<i64>,
) -> ApiResponse<ChildReport> {
    if !user.is_admin() && !parents::is_child_of(&pool, user.id, child_id).await? {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(ChildReport {
        progress: progress::get_progress_for_user(&pool, child_id).await?,
        submissions: submissions::get_submissions_for_user(&pool, child_id).await?,
    }))
}

async fn link(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<ParentLink>,
) -> ApiResponse<Value> {
    parents::link_child(&pool, body.parent_id, body.child_id).await?;
    Ok(Json(json!({ "linked": true })))
}

async fn unlink(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<ParentLink>,
) -> ApiResponse<Value> {
    parents::unlink_child(&pool, body.parent_id, body.child_id).await?;
    Ok(Json(json!({ "linked": false })))
}

pub fn parents_router(state: AppState) -> Router {
    Router::new()
        .route("/api/parent/children", get(list_children))
        .route("/api/parent/children/{id}/progress", get(child_progress))
        .route("/api/admin/parents", post(link).delete(unlink))
        .with_state(state)
}
