use common::SubmissionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub question_id: i32,

    /// Judge0 language id (e.g. 71 for Python 3, 54 for C++).
    pub language_id: i32,
    #[sea_orm(column_type = "Text")]
    pub source_code: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub stdin: Option<String>,

    pub status: SubmissionStatus,
    /// Wall time reported by the judge, in milliseconds.
    pub execution_time: Option<i32>,
    /// Peak memory reported by the judge, in kilobytes.
    pub memory_used: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub stdout: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub stderr: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub compile_output: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
