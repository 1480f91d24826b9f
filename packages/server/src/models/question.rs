use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::question;
use crate::error::AppError;

use super::shared::validate_title;

pub const DIFFICULTIES: &[&str] = &["Easy", "Medium", "Hard"];

const MAX_TAGS: usize = 10;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQuestionRequest {
    /// Lowercase letters, digits and hyphens (1-64 chars).
    #[schema(example = "two-sum")]
    pub slug: String,
    #[schema(example = "Two Sum")]
    pub title: String,
    /// `Easy`, `Medium` or `Hard`.
    #[schema(example = "Easy")]
    pub difficulty: String,
    #[serde(default)]
    #[schema(example = json!(["Array", "Hash Table"]))]
    pub tags: Vec<String>,
    /// Problem statement in Markdown.
    pub description: String,
}

pub fn validate_create_question(req: &CreateQuestionRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;

    let slug = req.slug.as_str();
    if slug.is_empty()
        || slug.len() > 64
        || slug.starts_with('-')
        || slug.ends_with('-')
        || !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::Validation(
            "Slug must be 1-64 lowercase letters, digits, or inner hyphens".into(),
        ));
    }

    if !DIFFICULTIES.contains(&req.difficulty.as_str()) {
        return Err(AppError::Validation(
            "Difficulty must be one of Easy, Medium, Hard".into(),
        ));
    }

    if req.tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!("At most {MAX_TAGS} tags allowed")));
    }
    if req
        .tags
        .iter()
        .any(|t| t.trim().is_empty() || t.chars().count() > 32)
    {
        return Err(AppError::Validation("Tags must be 1-32 characters".into()));
    }

    if req.description.trim().is_empty() || req.description.len() > 1_000_000 {
        return Err(AppError::Validation(
            "Description must be non-empty and at most 1MB".into(),
        ));
    }
    Ok(())
}

/// Question reference embedded in duel responses.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct QuestionSummary {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Two Sum")]
    pub title: String,
    #[schema(example = "Easy")]
    pub difficulty: String,
}

impl From<&question::Model> for QuestionSummary {
    fn from(q: &question::Model) -> Self {
        Self {
            id: q.id,
            title: q.title.clone(),
            difficulty: q.difficulty.clone(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionListItem {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "two-sum")]
    pub slug: String,
    #[schema(example = "Two Sum")]
    pub title: String,
    #[schema(example = "Easy")]
    pub difficulty: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "two-sum")]
    pub slug: String,
    #[schema(example = "Two Sum")]
    pub title: String,
    #[schema(example = "Easy")]
    pub difficulty: String,
    pub tags: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

fn tags_of(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

impl From<question::Model> for QuestionListItem {
    fn from(q: question::Model) -> Self {
        Self {
            id: q.id,
            slug: q.slug,
            title: q.title,
            difficulty: q.difficulty,
            tags: tags_of(q.tags),
        }
    }
}

impl From<question::Model> for QuestionResponse {
    fn from(q: question::Model) -> Self {
        Self {
            id: q.id,
            slug: q.slug,
            title: q.title,
            difficulty: q.difficulty,
            tags: tags_of(q.tags),
            description: q.description,
            created_at: q.created_at,
        }
    }
}
