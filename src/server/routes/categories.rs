use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::queries::categories::{self, get_all_categories, get_category};
use crate::db::{Category, Subcategory};
use crate::server::app::AppState;
use crate::server::auth::AdminUser;
use crate::server::error::ApiResponse;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewCategory {
    name: String,
    description: String,
    color_class: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSubcategory {
    name: String,
    description: Option<String>,
    category_id: i64,
    color_class: Option<String>,
}

async fn list_categories(State(pool): State<SqlitePool>) -> ApiResponse<Vec<Category>> {
    Ok(Json(get_all_categories(&pool).await?))
}

async fn category(State(pool): State<SqlitePool>, Path(id): Path<i64>) -> ApiResponse<Category> {
    Ok(Json(get_category(&pool, id).await?))
}

async fn list_subcategories(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<Vec<Subcategory>> {
    Ok(Json(categories::get_subcategories(&pool, id).await?))
}

async fn create_category(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(new_category): Json<NewCategory>,
) -> ApiResponse<Category> {
    let id = categories::create_category(
        &pool,
        &new_category.name,
        &new_category.description,
        &new_category.color_class,
    )
    .await?;

    Ok(Json(get_category(&pool, id).await?))
}

async fn update_category(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(category): Json<NewCategory>,
) -> ApiResponse<Category> {
    categories::update_category(
        &pool,
        id,
        &category.name,
        &category.description,
        &category.color_class,
    )
    .await?;
    Ok(Json(get_category(&pool, id).await?))
}

async fn delete_category(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, crate::server::error::ApiError> {
    categories::delete_category(&pool, id).await?;
    Ok(StatusCode::OK)
}

async fn create_subcategory(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Json(body): Json<NewSubcategory>,
) -> ApiResponse<Vec<Subcategory>> {
    categories::create_subcategory(
        &pool,
        &body.name,
        body.description.as_deref(),
        body.category_id,
        body.color_class.as_deref(),
    )
    .await?;
    Ok(Json(categories::get_subcategories(&pool, body.category_id).await?))
}

async fn delete_subcategory(
    _admin: AdminUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, crate::server::error::ApiError> {
    categories::delete_subcategory(&pool, id).await?;
    Ok(StatusCode::OK)
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/categories/{id}", get(category))
        .route("/api/categories/{id}/subcategories", get(list_subcategories))
        .route("/api/admin/categories", post(create_category))
        .route(
            "/api/admin/categories/{id}",
            delete(delete_category).put(update_category),
        )
        .route("/api/admin/subcategories", post(create_subcategory))
        .route("/api/admin/subcategories/{id}", delete(delete_subcategory))
        .with_state(state)
}
