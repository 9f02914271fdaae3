use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::content::{self, Segment};
use crate::db::queries::{questions, quizzes};
use crate::db::{Answer, Question, Quiz};
use crate::randomize::{self, VarValues};
use crate::selection;
use crate::server::app::AppState;
use crate::server::auth::{AdminUser, AuthUser};
use crate::server::error::{ApiError, ApiResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewQuiz {
    title: String,
    description: String,
    category_id: i64,
    subcategory_id: Option<i64>,
    time_limit: i64,
    difficulty: String,
    total_questions: i64,
    #[serde(default)]
    is_public: bool,
}

#[derive(Deserialize)]
struct AttemptParams {
    #[serde(default)]
    mini: bool,
}

/// A question as served for one attempt: placeholders resolved, drawn
/// variable values attached, options shuffled.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttemptQuestion {
    id: i64,
    quiz_id: i64,
    content: String,
    /// The prompt split into text and math segments, ready to render.
    segments: Vec<Segment>,
    #[serde(rename = "type")]
    question_type: String,
    difficulty: i64,
    points: i64,
    image_url: Option<String>,
    hint1: Option<String>,
    hint2: Option<String>,
    hint3: Option<String>,
    variables: VarValues,
    answers: Vec<Answer>,
}

fn validate(body: &NewQuiz) -> Result<(), ApiError> {
    if body.total_questions < 1 {
        return Err(ApiError::BadRequest(
            "Quiz must serve at least one question".to_owned(),
        ));
    }
    if body.time_limit < 0 {
        return Err(ApiError::BadRequest(
            "Time limit must not be negative".to_owned(),
        ));
    }
    Ok(())
}

async fn list_quizzes(State(pool): State<SqlitePool>) -> ApiResponse<Vec<Quiz>> {
    Ok(Json(quizzes::get_quizzes(&pool).await?))
}

async fn list_public_quizzes(State(pool): State<SqlitePool>) -> ApiResponse<Vec<Quiz>> {
    Ok(Json(quizzes::get_public_quizzes(&pool).await?))
}

async fn quiz(State(pool): State<SqlitePool>, Path(id): Path<i64>) -> ApiResponse<Quiz> {
    Ok(Json(quizzes::get_quiz(&pool, id).await?))
}

async fn quizzes_by_category(
    State(pool): State<SqlitePool>,
    Path(category_id): Path<i64>,
) -> ApiResponse<Vec<Quiz>> {
    Ok(Json(quizzes::get_quizzes_by_category(&pool, category_id).await?))
}

/// Assemble the question set for an attempt. All data is fetched first, then
/// selection and randomization run on it synchronously.
async fn quiz_questions(
    _user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Query(params): Query<AttemptParams>,
) -> ApiResponse<Vec<AttemptQuestion>> {
    let quiz = quizzes::get_quiz(&pool, quiz_id).await?;
    let pool_questions = questions::get_questions_by_quiz(&pool, quiz_id).await?;

    let mut with_answers = Vec::with_capacity(pool_questions.len());
    for question in pool_questions {
        let answers = questions::get_answers_by_question(&pool, question.id).await?;
        with_answers.push((question, answers));
    }

    // The mini variant serves half the configured count, rounded up. A
    // non-positive configured count serves nothing rather than panicking.
    let configured = usize::try_from(quiz.total_questions).unwrap_or(0);
    let target = if params.mini {
        configured.div_ceil(2)
    } else {
        configured
    };

    let mut rng = StdRng::from_entropy();
    let selected =
        selection::select_by_difficulty(with_answers, target, |(q, _)| q.difficulty, &mut rng);

    let served = selected
        .into_iter()
        .map(|(question, answers)| instantiate(question, answers, &mut rng))
        .collect();

    Ok(Json(served))
}

fn instantiate(question: Question, answers: Vec<Answer>, rng: &mut StdRng) -> AttemptQuestion {
    let ranges = question.variables.as_ref().map(|v| &v.0);
    let values = ranges
        .map(|r| randomize::draw_values(r, rng))
        .unwrap_or_default();

    let content = randomize::substitute(&question.content, &values);
    let answers = answers
        .into_iter()
        .map(|mut answer| {
            answer.content = randomize::resolve_answer(
                &answer.content,
                &question.question_type,
                answer.is_correct,
                &values,
                rng,
            );
            if let Some(explanation) = answer.explanation.take() {
                answer.explanation = Some(randomize::substitute(&explanation, &values));
            }
            answer
        })
        .collect();

    let segments = content::parse_content(&content);
    AttemptQuestion {
        id: question.id,
        quiz_id: question.quiz_id,
        content,
        segments,
        question_type: question.question_type,
        difficulty: question.difficulty,
        points: question.points,
        image_url: question.image_url,
        hint1: question.hint1,
        hint2: question.hint2,
        hint3: question.hint3,
        variables: values,
        answers: selection::shuffled(answers, rng),
    }
}

async fn create_quiz(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<NewQuiz>,
) -> ApiResponse<Quiz> {
    validate(&body)?;
    let id = quizzes::create_quiz(
        &pool,
        &body.title,
        &body.description,
        body.category_id,
        body.subcategory_id,
        body.time_limit,
        &body.difficulty,
        body.total_questions,
        body.is_public,
    )
    .await?;
    Ok(Json(quizzes::get_quiz(&pool, id).await?))
}

async fn update_quiz(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(body): Json<NewQuiz>,
) -> ApiResponse<Quiz> {
    validate(&body)?;
    let existing = quizzes::get_quiz(&pool, id).await?;
    quizzes::update_quiz(
        &pool,
        Quiz {
            id: existing.id,
            title: body.title,
            description: body.description,
            category_id: body.category_id,
            subcategory_id: body.subcategory_id,
            time_limit: body.time_limit,
            difficulty: body.difficulty,
            total_questions: body.total_questions,
            is_public: body.is_public,
        },
    )
    .await?;
    Ok(Json(quizzes::get_quiz(&pool, id).await?))
}

async fn delete_quiz(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    quizzes::delete_quiz(&pool, id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(total_questions: i64) -> NewQuiz {
        NewQuiz {
            title: "Álgebra básica".to_owned(),
            description: "Ecuaciones lineales".to_owned(),
            category_id: 1,
            subcategory_id: None,
            time_limit: 20,
            difficulty: "basic".to_owned(),
            total_questions,
            is_public: false,
        }
    }

    #[test]
    fn non_positive_question_count_is_rejected() {
        assert!(validate(&quiz(-1)).is_err());
        assert!(validate(&quiz(0)).is_err());
        assert!(validate(&quiz(12)).is_ok());
    }

    #[test]
    fn negative_time_limit_is_rejected() {
        let mut body = quiz(12);
        body.time_limit = -5;
        assert!(validate(&body).is_err());
    }
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/api/quizzes", get(list_quizzes))
        .route("/api/public/quizzes", get(list_public_quizzes))
        .route("/api/quizzes/{id}", get(quiz))
        .route("/api/quizzes/{id}/questions", get(quiz_questions))
        .route("/api/categories/{id}/quizzes", get(quizzes_by_category))
        .route("/api/admin/quizzes", post(create_quiz))
        .route(
            "/api/admin/quizzes/{id}",
            delete(delete_quiz).put(update_quiz),
        )
        .with_state(state)
}
