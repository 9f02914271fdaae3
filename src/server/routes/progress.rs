use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::db::queries::{parents, progress, questions, submissions, users};
use crate::db::{QuizSubmission, StudentProgress};
use crate::randomize::VarValues;
use crate::server::app::AppState;
use crate::server::auth::{AdminUser, AuthUser};
use crate::server::error::{ApiError, ApiResponse};
use crate::telemetry::{ANSWER_CNTR, QUIZ_COMPLETED_CNTR};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewProgress {
    #[serde(deserialize_with = "crate::server::deserializers::deserialize_id")]
    quiz_id: i64,
    #[serde(default)]
    is_mini: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteProgress {
    score: i64,
    completed_questions: i64,
    time_spent: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewAnswer {
    progress_id: i64,
    question_id: i64,
    answer_id: Option<i64>,
    variables: Option<VarValues>,
    time_spent: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFeedback {
    progress_id: i64,
    feedback: String,
}

#[derive(Deserialize)]
struct Review {
    feedback: Option<String>,
}

async fn owned_progress(
    pool: &SqlitePool,
    user: &AuthUser,
    progress_id: i64,
) -> Result<StudentProgress, ApiError> {
    let row = progress::get_progress(pool, progress_id).await?;
    if row.user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(row)
}

async fn list_progress(
    user: AuthUser,
    State(pool): State<SqlitePool>,
) -> ApiResponse<Vec<StudentProgress>> {
    Ok(Json(progress::get_progress_for_user(&pool, user.id).await?))
}

async fn progress_for_quiz(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> ApiResponse<Option<StudentProgress>> {
    Ok(Json(
        progress::get_progress_for_quiz(&pool, user.id, quiz_id).await?,
    ))
}

async fn start_progress(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<NewProgress>,
) -> ApiResponse<StudentProgress> {
    let id = progress::create_progress(&pool, user.id, body.quiz_id, body.is_mini).await?;
    Ok(Json(progress::get_progress(&pool, id).await?))
}

/// Mark an attempt completed, record the submission and bump the counter.
async fn complete_progress(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(body): Json<CompleteProgress>,
) -> ApiResponse<StudentProgress> {
    let row = owned_progress(&pool, &user, id).await?;
    let completed_at = Utc::now().naive_utc();

    progress::complete_progress(
        &pool,
        row.id,
        body.score,
        body.completed_questions,
        body.time_spent,
        completed_at,
    )
    .await?;
    submissions::create_submission(&pool, row.user_id, row.quiz_id, row.id, completed_at, body.score)
        .await?;

    QUIZ_COMPLETED_CNTR
        .with_label_values(&[&row.quiz_id.to_string()])
        .inc();
    tracing::info!(progress = row.id, score = body.score, "quiz attempt completed");

    Ok(Json(progress::get_progress(&pool, id).await?))
}

/// Record one answered question. Correctness is graded server-side from the
/// chosen option; a missing option means the question was skipped.
async fn record_answer(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<NewAnswer>,
) -> ApiResponse<Value> {
    owned_progress(&pool, &user, body.progress_id).await?;

    let is_correct = match body.answer_id {
        Some(answer_id) => {
            let answer = questions::get_answer(&pool, answer_id)
                .await?
                .ok_or(ApiError::NotFound("Answer"))?;
            if answer.question_id != body.question_id {
                return Err(ApiError::BadRequest(
                    "Answer does not belong to the question".to_owned(),
                ));
            }
            Some(answer.is_correct)
        }
        None => None,
    };

    let id = progress::record_answer(
        &pool,
        body.progress_id,
        body.question_id,
        body.answer_id,
        is_correct,
        body.variables.as_ref(),
        body.time_spent,
    )
    .await?;

    ANSWER_CNTR
        .with_label_values(&[match is_correct {
            Some(true) => "true",
            Some(false) => "false",
            None => "skipped",
        }])
        .inc();

    Ok(Json(json!({ "id": id, "isCorrect": is_correct })))
}

/// Spend one hint credit against an attempt.
async fn use_hint(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<Value> {
    let row = owned_progress(&pool, &user, id).await?;
    if user.hint_credits <= 0 {
        return Err(ApiError::BadRequest("No hint credits left".to_owned()));
    }

    progress::increment_hints_used(&pool, row.id).await?;
    users::adjust_hint_credits(&pool, user.id, -1).await?;

    Ok(Json(json!({ "hintCredits": user.hint_credits - 1 })))
}

async fn results(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(progress_id): Path<i64>,
) -> ApiResponse<progress::QuizResult> {
    let row = progress::get_progress(&pool, progress_id).await?;
    let is_own = row.user_id == user.id;
    let is_parent_of_owner = parents::is_child_of(&pool, user.id, row.user_id).await?;
    if !is_own && !is_parent_of_owner && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(progress::get_results(&pool, progress_id).await?))
}

async fn get_feedback(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(progress_id): Path<i64>,
) -> ApiResponse<Value> {
    owned_progress(&pool, &user, progress_id).await?;
    let feedback = submissions::get_feedback(&pool, progress_id).await?;
    Ok(Json(json!({ "feedback": feedback })))
}

async fn quiz_submissions(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> ApiResponse<Vec<QuizSubmission>> {
    Ok(Json(submissions::get_submissions_for_quiz(&pool, quiz_id).await?))
}

async fn review_submission(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(body): Json<Review>,
) -> ApiResponse<Value> {
    submissions::mark_reviewed(&pool, id, body.feedback.as_deref()).await?;
    Ok(Json(json!({ "reviewed": true })))
}

async fn save_feedback(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<NewFeedback>,
) -> ApiResponse<Value> {
    owned_progress(&pool, &user, body.progress_id).await?;
    submissions::save_feedback(&pool, body.progress_id, &body.feedback).await?;
    Ok(Json(json!({ "message": "Feedback saved" })))
}

pub fn progress_router(state: AppState) -> Router {
    Router::new()
        .route("/api/progress", get(list_progress).post(start_progress))
        .route("/api/progress/{id}", get(progress_for_quiz))
        .route("/api/progress/{id}/complete", post(complete_progress))
        .route("/api/progress/{id}/hint", post(use_hint))
        .route("/api/answers", post(record_answer))
        .route("/api/results/{progress_id}", get(results))
        .route("/api/feedback", post(save_feedback))
        .route("/api/feedback/{progress_id}", get(get_feedback))
        .route("/api/admin/quizzes/{id}/submissions", get(quiz_submissions))
        .route("/api/admin/submissions/{id}/review", post(review_submission))
        .with_state(state)
}
