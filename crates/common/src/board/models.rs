//! Board post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Row as listed on the board; content stays hidden until unlocked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub title: String,
    pub affiliation: Option<String>,
}

/// Full post, never including its password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub title: String,
    pub content: String,
    pub affiliation: Option<String>,
    pub contact: Option<String>,
}

/// New post as written to the backend
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 20000))]
    pub content: String,

    pub affiliation: Option<String>,

    pub contact: Option<String>,

    #[validate(length(min = 4))]
    pub password: String,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Replaces the stored password when present
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 4))]
    pub password: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.affiliation.is_none()
            && self.contact.is_none()
            && self.password.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(password: &str) -> NewPost {
        NewPost {
            name: "Choi".into(),
            title: "Add Busan".into(),
            content: "Please add Busan contracts".into(),
            affiliation: Some("Credit team".into()),
            contact: None,
            password: password.into(),
        }
    }

    #[test]
    fn test_new_post_password_length() {
        assert!(new_post("1234").validate().is_ok());
        assert!(new_post("123").validate().is_err());
    }

    #[test]
    fn test_new_post_requires_title() {
        let mut post = new_post("1234");
        post.title.clear();
        let errors = post.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_changes_serialize_only_present_fields() {
        let changes = PostChanges {
            title: Some("Updated".into()),
            ..PostChanges::default()
        };
        assert!(!changes.is_empty());
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            serde_json::json!({ "title": "Updated" })
        );
        assert!(PostChanges::default().is_empty());
    }
}
