use common::{ParticipantSnapshot, ParticipantStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "duel_participant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub duel_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,

    /// 1 for the creator, 2 for the opponent. Unique per duel.
    pub slot: i32,
    pub joined_at: DateTimeUtc,

    pub submission_id: Option<i32>,
    pub completed_at: Option<DateTimeUtc>,

    pub result_status: ParticipantStatus,
    pub execution_time: Option<i32>, // in milliseconds
    pub memory_used: Option<i32>,    // in kilobytes
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn has_submitted(&self) -> bool {
        self.submission_id.is_some()
    }

    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            user_id: self.user_id,
            result: self.result_status,
            execution_time: self.execution_time,
        }
    }
}
