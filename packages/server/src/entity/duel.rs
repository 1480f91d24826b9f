use common::DuelStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "duel")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub status: DuelStatus,

    pub created_by: i32,
    /// The second participant, set when the duel becomes active.
    pub opponent_id: Option<i32>,
    pub question_id: i32,

    pub time_limit: i32, // in minutes
    pub start_time: Option<DateTimeUtc>,
    pub end_time: Option<DateTimeUtc>,

    pub is_public: bool,
    #[sea_orm(unique)]
    pub invite_code: String,

    /// Bumped by every state-changing write; writers claim the row by matching it.
    pub version: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
