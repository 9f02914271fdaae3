use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub color_class: Option<String>,
}

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> sqlx::Result<Category> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn create_category(
    pool: &SqlitePool,
    name: &str,
    description: &str,
    color_class: &str,
) -> anyhow::Result<i64> {
    let id = sqlx::query(
        "INSERT INTO categories (name, description, color_class) VALUES (?1, ?2, ?3)",
    )
    .bind(name)
    .bind(description)
    .bind(color_class)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_category(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    description: &str,
    color_class: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE categories SET name = ?1, description = ?2, color_class = ?3 WHERE id = ?4",
    )
    .bind(name)
    .bind(description)
    .bind(color_class)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_category(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM user_categories WHERE category_id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM categories WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_subcategories(pool: &SqlitePool, category_id: i64) -> sqlx::Result<Vec<Subcategory>> {
    sqlx::query_as::<_, Subcategory>(
        "SELECT * FROM subcategories WHERE category_id = ?1 ORDER BY id",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await
}

pub async fn create_subcategory(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
    category_id: i64,
    color_class: Option<&str>,
) -> anyhow::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO subcategories (name, description, category_id, color_class)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(category_id)
    .bind(color_class)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn delete_subcategory(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM subcategories WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Categories a student has been granted access to.
pub async fn get_categories_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT categories.* FROM categories
        JOIN user_categories ON user_categories.category_id = categories.id
        WHERE user_categories.user_id = ?1
        ORDER BY categories.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Replace a user's category grants with the given set.
pub async fn set_categories_for_user(
    pool: &SqlitePool,
    user_id: i64,
    category_ids: &[i64],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_categories WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    for category_id in category_ids {
        sqlx::query("INSERT INTO user_categories (user_id, category_id) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}
