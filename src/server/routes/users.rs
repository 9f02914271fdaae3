use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::db::queries::{categories, quizzes, users};
use crate::db::{Category, Quiz, User};
use crate::server::app::AppState;
use crate::server::auth::{AdminUser, AuthUser};
use crate::server::deserializers::Stri64;
use crate::server::error::{ApiError, ApiResponse};
use crate::tour::{tour_by_key, tour_for_path, TourFlags, TourSequencer, TourState, TourStep};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserUpdate {
    name: Option<String>,
    email: Option<String>,
    tour_status: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct TourQuery {
    path: String,
    /// Comma-separated element ids the page actually rendered; absent means
    /// every step target is available.
    targets: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TourView {
    key: String,
    seen: bool,
    steps: Vec<TourStep>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryAssignment {
    category_ids: Vec<Stri64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizAssignment {
    user_id: i64,
    quiz_id: i64,
}

#[derive(Deserialize)]
struct RoleUpdate {
    role: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserWithCategories {
    #[serde(flatten)]
    user: User,
    categories: Vec<Category>,
}

/// Seen flags backed by the user's `tour_status` JSON column.
struct UserTourFlags(Map<String, Value>);

impl UserTourFlags {
    fn of(user: &User) -> Self {
        UserTourFlags(
            user.tour_status
                .as_ref()
                .map(|j| j.0.clone())
                .unwrap_or_default(),
        )
    }
}

impl TourFlags for UserTourFlags {
    fn is_seen(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn mark_seen(&mut self, key: &str) {
        self.0.insert(key.to_owned(), Value::Bool(true));
    }
}

async fn current_user(user: AuthUser) -> ApiResponse<User> {
    Ok(Json(user.0))
}

/// Partial profile update; tour flags merge into the stored map instead of
/// replacing it.
async fn update_user(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<UserUpdate>,
) -> ApiResponse<User> {
    if body.name.is_some() || body.email.is_some() {
        let name = body.name.as_deref().unwrap_or(&user.name);
        let email = body.email.as_deref().or(user.email.as_deref());
        users::update_profile(&pool, user.id, name, email).await?;
    }

    if let Some(incoming) = body.tour_status {
        let mut merged = user
            .tour_status
            .as_ref()
            .map(|j| j.0.clone())
            .unwrap_or_default();
        merged.extend(incoming);
        users::set_tour_status(&pool, user.id, &merged).await?;
    }

    Ok(Json(users::get_user(&pool, user.id).await?))
}

async fn user_categories(
    user: AuthUser,
    State(pool): State<SqlitePool>,
) -> ApiResponse<Vec<Category>> {
    Ok(Json(categories::get_categories_for_user(&pool, user.id).await?))
}

async fn user_quizzes(user: AuthUser, State(pool): State<SqlitePool>) -> ApiResponse<Vec<Quiz>> {
    Ok(Json(quizzes::get_quizzes_for_user(&pool, user.id).await?))
}

/// The tour the frontend should run for a page, already filtered down to the
/// targets the page reported as present, or `seen: true` when the user has
/// closed it before.
async fn user_tour(user: AuthUser, Query(query): Query<TourQuery>) -> ApiResponse<Option<TourView>> {
    let Some((key, steps)) = tour_for_path(&query.path) else {
        return Ok(Json(None));
    };

    let mut flags = UserTourFlags::of(&user);
    if flags.is_seen(key) {
        return Ok(Json(Some(TourView {
            key: key.to_owned(),
            seen: true,
            steps: Vec::new(),
        })));
    }

    let present: Option<Vec<&str>> = query
        .targets
        .as_deref()
        .map(|t| t.split(',').map(str::trim).collect());
    let mut tour = TourSequencer::new(key, steps, |target| {
        present.as_ref().is_none_or(|p| p.contains(&target))
    });
    tour.start(&mut flags);

    let mut steps = Vec::new();
    while let Some(step) = tour.current_step() {
        steps.push(step.clone());
        tour.next(&mut flags);
    }
    debug_assert_eq!(tour.state(), TourState::Finished);

    Ok(Json(Some(TourView {
        key: key.to_owned(),
        seen: false,
        steps,
    })))
}

/// Close (or finish) a tour: persist the seen flag so it is not shown again.
async fn close_tour(
    user: AuthUser,
    State(pool): State<SqlitePool>,
    Path(key): Path<String>,
) -> ApiResponse<Value> {
    let steps = tour_by_key(&key).ok_or(ApiError::NotFound("Tour"))?;

    let mut flags = UserTourFlags::of(&user);
    let mut tour = TourSequencer::new(&key, steps, |_| true);
    tour.start(&mut flags);
    tour.close(&mut flags);

    users::set_tour_status(&pool, user.id, &flags.0).await?;
    Ok(Json(Value::Object(flags.0)))
}

async fn list_users(_admin: AdminUser, State(pool): State<SqlitePool>) -> ApiResponse<Vec<User>> {
    Ok(Json(users::get_users(&pool).await?))
}

async fn users_with_categories(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
) -> ApiResponse<Vec<UserWithCategories>> {
    let listed = users::get_users(&pool).await?;
    let mut out = Vec::with_capacity(listed.len());
    for user in listed {
        let categories = categories::get_categories_for_user(&pool, user.id).await?;
        out.push(UserWithCategories { user, categories });
    }
    Ok(Json(out))
}

async fn categories_of_user(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> ApiResponse<Vec<Category>> {
    Ok(Json(categories::get_categories_for_user(&pool, user_id).await?))
}

async fn set_user_categories(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
    Json(body): Json<CategoryAssignment>,
) -> ApiResponse<Vec<Category>> {
    let ids: Vec<i64> = body.category_ids.into_iter().map(|v| v.0).collect();
    categories::set_categories_for_user(&pool, user_id, &ids).await?;
    Ok(Json(categories::get_categories_for_user(&pool, user_id).await?))
}

async fn assign_quiz(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<QuizAssignment>,
) -> ApiResponse<Vec<Quiz>> {
    quizzes::assign_quiz(&pool, body.user_id, body.quiz_id).await?;
    Ok(Json(quizzes::get_quizzes_for_user(&pool, body.user_id).await?))
}

async fn unassign_quiz(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<QuizAssignment>,
) -> ApiResponse<Vec<Quiz>> {
    quizzes::unassign_quiz(&pool, body.user_id, body.quiz_id).await?;
    Ok(Json(quizzes::get_quizzes_for_user(&pool, body.user_id).await?))
}

async fn quiz_assignees(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> ApiResponse<Vec<i64>> {
    Ok(Json(quizzes::get_assignees(&pool, quiz_id).await?))
}

async fn set_role(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
    Json(body): Json<RoleUpdate>,
) -> ApiResponse<User> {
    if !["student", "admin", "parent"].contains(&body.role.as_str()) {
        return Err(ApiError::BadRequest("Unknown role".to_owned()));
    }
    users::update_role(&pool, user_id, &body.role).await?;
    Ok(Json(users::get_user(&pool, user_id).await?))
}

pub fn users_router(state: AppState) -> Router {
    Router::new()
        .route("/api/user", get(current_user).patch(update_user))
        .route("/api/user/categories", get(user_categories))
        .route("/api/user/quizzes", get(user_quizzes))
        .route("/api/user/tour", get(user_tour))
        .route("/api/user/tour/{key}/close", post(close_tour))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users-with-categories", get(users_with_categories))
        .route(
            "/api/users/{id}/categories",
            get(categories_of_user).put(set_user_categories),
        )
        .route("/api/admin/users/quizzes", post(assign_quiz).delete(unassign_quiz))
        .route("/api/admin/users/quizzes/{id}", get(quiz_assignees))
        .route("/api/admin/users/{id}/role", put(set_role))
        .with_state(state)
}
