//! Tag models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub const MAX_TAG_NAME_LENGTH: usize = 200;

/// A label owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub name: String,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Body of tag creation and full replacement
#[derive(Debug, Clone, Deserialize)]
pub struct TagPayload {
    pub name: String,
}

impl TagPayload {
    pub fn validate(&self) -> Result<(), String> {
        validate_tag_name(&self.name)
    }
}

/// Body of a partial tag update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
}

impl TagPatch {
    pub fn validate(&self) -> Result<(), String> {
        match self.name.as_deref() {
            Some(name) => validate_tag_name(name),
            None => Ok(()),
        }
    }
}

/// Query parameters of the tag list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagQuery {
    /// `1` limits the list to tags attached to at least one recipe
    pub assigned_only: Option<u8>,
}

impl TagQuery {
    pub fn assigned_only(&self) -> bool {
        self.assigned_only.unwrap_or(0) != 0
    }
}

pub fn validate_tag_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Tag name may not be blank".to_string());
    }
    if name.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(format!(
            "Tag name must be at most {} characters long",
            MAX_TAG_NAME_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_str() {
        let tag = Tag {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Tag1".to_string(),
        };
        assert_eq!(tag.to_string(), tag.name);
    }

    #[test]
    fn test_tag_json_hides_owner() {
        let tag = Tag {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            name: "Vegan".to_string(),
        };

        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "00000000-0000-0000-0000-000000000000", "name": "Vegan"})
        );
    }

    #[test]
    fn test_tag_name_validation() {
        assert!(validate_tag_name("Dessert").is_ok());
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name("   ").is_err());
        assert!(validate_tag_name(&"x".repeat(MAX_TAG_NAME_LENGTH)).is_ok());
        assert!(validate_tag_name(&"x".repeat(MAX_TAG_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_patch_without_name_is_valid() {
        assert!(TagPatch::default().validate().is_ok());
        assert!(TagPatch { name: Some(String::new()) }.validate().is_err());
    }

    #[test]
    fn test_assigned_only_flag() {
        assert!(!TagQuery::default().assigned_only());
        assert!(!TagQuery { assigned_only: Some(0) }.assigned_only());
        assert!(TagQuery { assigned_only: Some(1) }.assigned_only());
    }
}
