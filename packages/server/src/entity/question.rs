use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// URL slug, e.g. `two-sum`.
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    /// One of `Easy`, `Medium`, `Hard`.
    pub difficulty: String,
    /// JSON array of tag strings.
    #[sea_orm(column_type = "Json")]
    pub tags: serde_json::Value,
    #[sea_orm(column_type = "Text")]
    pub description: String, // in Markdown

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
