use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::queries::questions;
use crate::db::{Answer, Question};
use crate::randomize::VarRanges;
use crate::server::app::AppState;
use crate::server::auth::AdminUser;
use crate::server::error::{ApiError, ApiResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewAnswer {
    content: String,
    is_correct: bool,
    explanation: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewQuestion {
    quiz_id: i64,
    content: String,
    #[serde(rename = "type")]
    question_type: String,
    difficulty: i64,
    #[serde(default = "default_points")]
    points: i64,
    variables: Option<VarRanges>,
    image_url: Option<String>,
    hint1: Option<String>,
    hint2: Option<String>,
    hint3: Option<String>,
    #[serde(default)]
    answers: Vec<NewAnswer>,
}

fn default_points() -> i64 {
    5
}

#[derive(Deserialize)]
struct QuestionFilter {
    quiz_id: Option<i64>,
}

#[derive(Serialize)]
struct QuestionWithAnswers {
    #[serde(flatten)]
    question: Question,
    answers: Vec<Answer>,
}

fn validate(body: &NewQuestion) -> Result<(), ApiError> {
    if !(1..=3).contains(&body.difficulty) {
        return Err(ApiError::BadRequest(
            "Difficulty must be between 1 and 3".to_owned(),
        ));
    }
    if !body.answers.is_empty() && !body.answers.iter().any(|a| a.is_correct) {
        return Err(ApiError::BadRequest(
            "At least one answer must be marked correct".to_owned(),
        ));
    }
    Ok(())
}

async fn list_questions(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Query(filter): Query<QuestionFilter>,
) -> ApiResponse<Vec<QuestionWithAnswers>> {
    let listed = match filter.quiz_id {
        Some(quiz_id) => questions::get_questions_by_quiz(&pool, quiz_id).await?,
        None => questions::get_questions(&pool).await?,
    };

    let mut out = Vec::with_capacity(listed.len());
    for question in listed {
        let answers = questions::get_answers_by_question(&pool, question.id).await?;
        out.push(QuestionWithAnswers { question, answers });
    }
    Ok(Json(out))
}

async fn create_question(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<NewQuestion>,
) -> ApiResponse<QuestionWithAnswers> {
    validate(&body)?;

    let id = questions::create_question(
        &pool,
        body.quiz_id,
        &body.content,
        &body.question_type,
        body.difficulty,
        body.points,
        body.variables.as_ref(),
        body.image_url.as_deref(),
        [
            body.hint1.as_deref(),
            body.hint2.as_deref(),
            body.hint3.as_deref(),
        ],
    )
    .await?;

    for answer in &body.answers {
        questions::create_answer(
            &pool,
            id,
            &answer.content,
            answer.is_correct,
            answer.explanation.as_deref(),
        )
        .await?;
    }

    let question = questions::get_question(&pool, id).await?;
    let answers = questions::get_answers_by_question(&pool, id).await?;
    Ok(Json(QuestionWithAnswers { question, answers }))
}

async fn update_question(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(body): Json<NewQuestion>,
) -> ApiResponse<QuestionWithAnswers> {
    validate(&body)?;
    let existing = questions::get_question(&pool, id).await?;
    questions::update_question(
        &pool,
        &Question {
            id: existing.id,
            quiz_id: body.quiz_id,
            content: body.content,
            question_type: body.question_type,
            difficulty: body.difficulty,
            points: body.points,
            variables: body.variables.map(sqlx::types::Json),
            image_url: body.image_url,
            hint1: body.hint1,
            hint2: body.hint2,
            hint3: body.hint3,
        },
    )
    .await?;

    let question = questions::get_question(&pool, id).await?;
    let answers = questions::get_answers_by_question(&pool, id).await?;
    Ok(Json(QuestionWithAnswers { question, answers }))
}

async fn delete_question(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    questions::delete_question(&pool, id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(difficulty: i64, answers: Vec<NewAnswer>) -> NewQuestion {
        NewQuestion {
            quiz_id: 1,
            content: "Resuelve {a}x + {b} = {c}".to_owned(),
            question_type: "equation".to_owned(),
            difficulty,
            points: 5,
            variables: None,
            image_url: None,
            hint1: None,
            hint2: None,
            hint3: None,
            answers,
        }
    }

    fn answer(is_correct: bool) -> NewAnswer {
        NewAnswer {
            content: "x = {answer}".to_owned(),
            is_correct,
            explanation: None,
        }
    }

    #[test]
    fn out_of_range_difficulty_is_rejected() {
        assert!(validate(&question(0, vec![])).is_err());
        assert!(validate(&question(4, vec![])).is_err());
        assert!(validate(&question(2, vec![])).is_ok());
    }

    #[test]
    fn provided_answers_need_a_correct_one() {
        assert!(validate(&question(1, vec![answer(false), answer(false)])).is_err());
        assert!(validate(&question(1, vec![answer(true), answer(false)])).is_ok());
    }
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/questions", get(list_questions).post(create_question))
        .route(
            "/api/admin/questions/{id}",
            put(update_question).delete(delete_question),
        )
        .with_state(state)
}
