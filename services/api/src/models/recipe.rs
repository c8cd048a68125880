//! Recipe models

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use std::fmt;
use uuid::Uuid;

use super::{
    price::Price,
    tag::{Tag, TagPayload},
};

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_LINK_LENGTH: usize = 1000;

/// A recipe with its tags, as returned by the detail endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<Tag>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Rows must select `price` cast to text; tags are loaded separately.
impl<'r> FromRow<'r, PgRow> for Recipe {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let price: String = row.try_get("price")?;
        let price = price.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "price".to_string(),
            source: Box::new(e),
        })?;

        Ok(Recipe {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            time_minutes: row.try_get("time_minutes")?,
            price,
            link: row.try_get("link")?,
            tags: Vec::new(),
        })
    }
}

/// List representation: everything but the description
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<Tag>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
        }
    }
}

/// Body of recipe creation and full replacement
#[derive(Debug, Clone, Deserialize)]
pub struct RecipePayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub time_minutes: i32,
    pub price: Price,
    #[serde(default)]
    pub link: String,
    /// Tags by name; missing ones are created for the owner
    #[serde(default)]
    pub tags: Vec<TagPayload>,
}

impl RecipePayload {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_link(&self.link)?;
        self.tags.iter().try_for_each(TagPayload::validate)
    }
}

/// Body of a partial recipe update. `tags`, when present, replaces the set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub tags: Option<Vec<TagPayload>>,
}

impl RecipePatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(link) = self.link.as_deref() {
            validate_link(link)?;
        }
        match &self.tags {
            Some(tags) => tags.iter().try_for_each(TagPayload::validate),
            None => Ok(()),
        }
    }
}

impl From<RecipePayload> for RecipePatch {
    fn from(payload: RecipePayload) -> Self {
        Self {
            title: Some(payload.title),
            description: Some(payload.description),
            time_minutes: Some(payload.time_minutes),
            price: Some(payload.price),
            link: Some(payload.link),
            tags: Some(payload.tags),
        }
    }
}

/// Query parameters of the recipe list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeQuery {
    /// Comma-separated tag ids; recipes carrying any of them are kept
    pub tags: Option<String>,
}

impl RecipeQuery {
    pub fn tag_ids(&self) -> Result<Vec<Uuid>, String> {
        let Some(raw) = self.tags.as_deref() else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<Uuid>()
                    .map_err(|_| format!("Invalid tag id: {}", part))
            })
            .collect()
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title may not be blank".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title must be at most {} characters long",
            MAX_TITLE_LENGTH
        ));
    }
    Ok(())
}

fn validate_link(link: &str) -> Result<(), String> {
    if link.chars().count() > MAX_LINK_LENGTH {
        return Err(format!(
            "Link must be at most {} characters long",
            MAX_LINK_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        Recipe {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            title: "Sample Recipe".to_string(),
            description: "This is a test recipe".to_string(),
            time_minutes: 10,
            price: "5.99".parse().unwrap(),
            link: String::new(),
            tags: vec![],
        }
    }

    #[test]
    fn test_recipe_str() {
        let recipe = sample_recipe();
        assert_eq!(recipe.to_string(), recipe.title);
    }

    #[test]
    fn test_summary_omits_description() {
        let json = serde_json::to_value(RecipeSummary::from(sample_recipe())).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["price"], "5.99");
        assert_eq!(json["time_minutes"], 10);
    }

    #[test]
    fn test_payload_defaults_and_validation() {
        let payload: RecipePayload = serde_json::from_value(serde_json::json!({
            "title": "Chocolate cheesecake",
            "time_minutes": 30,
            "price": "5.00"
        }))
        .unwrap();

        assert!(payload.description.is_empty());
        assert!(payload.link.is_empty());
        assert!(payload.tags.is_empty());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_payload_rejects_blank_title_and_blank_tag() {
        let payload: RecipePayload = serde_json::from_value(serde_json::json!({
            "title": " ",
            "time_minutes": 5,
            "price": 1
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: RecipePayload = serde_json::from_value(serde_json::json!({
            "title": "Soup",
            "time_minutes": 5,
            "price": 1,
            "tags": [{"name": ""}]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_payload_rejects_out_of_range_price() {
        let result = serde_json::from_value::<RecipePayload>(serde_json::json!({
            "title": "Caviar",
            "time_minutes": 5,
            "price": "1000.00"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_from_payload_replaces_everything() {
        let payload: RecipePayload = serde_json::from_value(serde_json::json!({
            "title": "Soup",
            "time_minutes": 5,
            "price": "2.50"
        }))
        .unwrap();

        let patch = RecipePatch::from(payload);
        assert_eq!(patch.title.as_deref(), Some("Soup"));
        assert_eq!(patch.description.as_deref(), Some(""));
        assert_eq!(patch.tags.map(|t| t.len()), Some(0));
    }

    #[test]
    fn test_patch_validation() {
        assert!(RecipePatch::default().validate().is_ok());

        let patch = RecipePatch {
            link: Some("x".repeat(MAX_LINK_LENGTH + 1)),
            ..RecipePatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_tag_filter_parsing() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let query = RecipeQuery {
            tags: Some(format!("{}, {},", first, second)),
        };
        assert_eq!(query.tag_ids().unwrap(), vec![first, second]);

        assert!(RecipeQuery::default().tag_ids().unwrap().is_empty());

        let query = RecipeQuery {
            tags: Some("1,2".to_string()),
        };
        assert!(query.tag_ids().is_err());
    }
}
