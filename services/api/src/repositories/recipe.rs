//! Recipe repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgConnection, PgPool, Row};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::tag::get_or_create;
use crate::models::{Recipe, RecipePatch, RecipePayload, Tag, TagPayload};

const RECIPE_COLUMNS: &str =
    "id, user_id, title, description, time_minutes, price::TEXT AS price, link";

/// Recipe repository; every query is scoped to the owning user
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

/// Load the tags of each recipe, keyed by recipe id
async fn tags_by_recipe(
    conn: &mut PgConnection,
    recipe_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT rt.recipe_id, t.id, t.user_id, t.name
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        tags.entry(row.try_get("recipe_id")?).or_default().push(Tag {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
        });
    }

    Ok(tags)
}

async fn attach_tags(conn: &mut PgConnection, recipes: &mut [Recipe]) -> Result<(), sqlx::Error> {
    let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let mut tags = tags_by_recipe(conn, &ids).await?;

    for recipe in recipes.iter_mut() {
        recipe.tags = tags.remove(&recipe.id).unwrap_or_default();
    }

    Ok(())
}

/// Replace the tag set of a recipe with the named tags of its owner
async fn set_tags(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
    tags: &[TagPayload],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    for payload in tags {
        let tag = get_or_create(conn, user_id, payload.name.trim()).await?;
        sqlx::query(
            r#"
            INSERT INTO recipe_tags (recipe_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(recipe_id)
        .bind(tag.id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

impl RecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recipes of `user_id`, newest first. A non-empty `tag_ids` keeps only
    /// recipes carrying at least one of those tags.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        tag_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Recipe>> {
        let mut conn = self.pool.acquire().await?;

        let mut recipes = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes r
            WHERE r.user_id = $1
              AND (cardinality($2::UUID[]) = 0 OR EXISTS (
                  SELECT 1 FROM recipe_tags rt
                  WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)
              ))
            ORDER BY r.created_at DESC, r.id DESC
            "#
        ))
        .bind(user_id)
        .bind(tag_ids)
        .fetch_all(&mut *conn)
        .await?;

        attach_tags(&mut conn, &mut recipes).await?;
        Ok(recipes)
    }

    pub async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<Option<Recipe>> {
        let mut conn = self.pool.acquire().await?;

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(recipe) = recipe else {
            return Ok(None);
        };

        let mut recipes = [recipe];
        attach_tags(&mut conn, &mut recipes).await?;
        let [recipe] = recipes;
        Ok(Some(recipe))
    }

    /// Insert a recipe and its tags in one transaction
    pub async fn create(&self, user_id: Uuid, payload: &RecipePayload) -> DatabaseResult<Recipe> {
        info!("Creating recipe {:?} for user {}", payload.title, user_id);

        let mut tx = self.pool.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (user_id, title, description, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5::NUMERIC, $6)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.time_minutes)
        .bind(payload.price.to_string())
        .bind(&payload.link)
        .fetch_one(&mut *tx)
        .await?;

        set_tags(&mut tx, user_id, recipe.id, &payload.tags).await?;

        let mut recipes = [recipe];
        attach_tags(&mut tx, &mut recipes).await?;
        tx.commit().await?;

        let [recipe] = recipes;
        Ok(recipe)
    }

    /// Apply a partial update; `None` when the user owns no such recipe
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &RecipePatch,
    ) -> DatabaseResult<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            UPDATE recipes
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                time_minutes = COALESCE($5, time_minutes),
                price = COALESCE($6::NUMERIC, price),
                link = COALESCE($7, link),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.time_minutes)
        .bind(patch.price.map(|p| p.to_string()))
        .bind(patch.link.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(recipe) = recipe else {
            return Ok(None);
        };

        if let Some(tags) = &patch.tags {
            set_tags(&mut tx, user_id, recipe.id, tags).await?;
        }

        let mut recipes = [recipe];
        attach_tags(&mut tx, &mut recipes).await?;
        tx.commit().await?;

        info!("Updated recipe {} for user {}", id, user_id);
        let [recipe] = recipes;
        Ok(Some(recipe))
    }

    /// Delete a recipe; `false` when the user owns no such recipe
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
