//! Tag repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::Tag;

/// Tag repository; every query is scoped to the owning user
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tags of `user_id` ordered by name, descending
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        assigned_only: bool,
    ) -> DatabaseResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.user_id, t.name
            FROM tags t
            WHERE t.user_id = $1
              AND (NOT $2 OR EXISTS (
                  SELECT 1 FROM recipe_tags rt WHERE rt.tag_id = t.id
              ))
            ORDER BY t.name DESC
            "#,
        )
        .bind(user_id)
        .bind(assigned_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    pub async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, user_id, name
            FROM tags
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    pub async fn create(&self, user_id: Uuid, name: &str) -> DatabaseResult<Tag> {
        info!("Creating tag {:?} for user {}", name, user_id);

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(tag)
    }

    /// Rename a tag; `None` when the user owns no such tag
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: Option<&str>,
    ) -> DatabaseResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET name = COALESCE($3, name)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    /// Delete a tag; `false` when the user owns no such tag
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Find the user's tag called `name`, creating it if missing
pub(crate) async fn get_or_create(
    conn: &mut PgConnection,
    user_id: Uuid,
    name: &str,
) -> Result<Tag, sqlx::Error> {
    let existing = sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, user_id, name
        FROM tags
        WHERE user_id = $1 AND name = $2
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(tag) = existing {
        return Ok(tag);
    }

    sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (user_id, name)
        VALUES ($1, $2)
        RETURNING id, user_id, name
        "#,
    )
    .bind(user_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await
}
