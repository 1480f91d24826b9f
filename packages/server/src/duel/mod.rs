//! Duel lifecycle: create, join, submit, cancel, and the derived views.
//!
//! Every mutation reads the duel under a row lock, checks its preconditions,
//! then claims the row by bumping `version` with a guarded update. A claim that
//! matches no row means another writer committed first; the whole operation is
//! retried against fresh state up to `max_write_attempts` times.

pub mod expiry;
pub mod view;

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use common::retry::calculate_backoff;
use common::{
    DuelConfig, DuelStatus, Outcome, ParticipantSnapshot, ParticipantStatus, compute_outcome,
};
use sea_orm::sea_query::{Expr, LockType, Query as SeaQuery};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, QueryOrder, QuerySelect, RuntimeErr, Set, SqlErr,
    TransactionSession, TransactionTrait, UpdateMany,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::entity::{duel, duel_participant, question, submission};
use crate::utils::invite::generate_invite_code;

pub const MAX_PARTICIPANTS: usize = 2;

const INVITE_CODE_ATTEMPTS: usize = 5;

const RETRY_BASE_MS: u64 = 20;
const RETRY_MAX_MS: u64 = 250;

const NOT_ACCEPTING: &str = "This duel is no longer accepting participants";
const DUEL_FULL: &str = "This duel already has the maximum number of participants";
const NOT_ACTIVE: &str = "This duel is not active";
const NOT_PENDING: &str = "Only pending duels can be cancelled";
const ILLEGAL_TRANSITION: &str = "This duel cannot move to the requested state";

#[derive(Debug, Error)]
pub enum DuelError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("already a participant in this duel")]
    AlreadyJoined,
    #[error("solution already submitted for this duel")]
    AlreadySubmitted,
    #[error("{0}")]
    Validation(String),
    /// The version claim kept losing to concurrent writers.
    #[error("duel was modified concurrently")]
    Contended,
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl DuelError {
    /// Turn a backend write conflict into [`DuelError::Contended`].
    fn classify(self, backend: DbBackend) -> Self {
        match self {
            DuelError::Db(e) if is_write_conflict(backend, &e) => DuelError::Contended,
            other => other,
        }
    }
}

fn is_write_conflict(backend: DbBackend, err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(e))
    | DbErr::Query(RuntimeErr::SqlxError(e))
    | DbErr::Conn(RuntimeErr::SqlxError(e))) = err
    else {
        return false;
    };
    let Some(code) = e.as_database_error().and_then(|db| db.code()) else {
        return false;
    };
    match backend {
        // Primary result code in the low byte: SQLITE_BUSY (5), SQLITE_LOCKED (6).
        DbBackend::Sqlite => code.parse::<i32>().is_ok_and(|c| matches!(c & 0xff, 5 | 6)),
        // serialization_failure, deadlock_detected
        DbBackend::Postgres => matches!(&*code, "40001" | "40P01"),
        _ => false,
    }
}

/// How a caller addresses a duel.
#[derive(Debug, Clone, Copy)]
pub enum DuelRef<'a> {
    Id(i32),
    InviteCode(&'a str),
}

/// Validated input for a new duel.
#[derive(Debug, Clone)]
pub struct NewDuel {
    pub title: String,
    pub question_id: i32,
    pub time_limit: i32,
    pub is_public: bool,
}

/// A duel together with its participant rows, ordered by slot.
#[derive(Debug, Clone)]
pub struct DuelWithParticipants {
    pub duel: duel::Model,
    pub participants: Vec<duel_participant::Model>,
}

impl DuelWithParticipants {
    pub fn is_participant(&self, user_id: i32) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Whether `user_id` may see this duel (and its invite code).
    pub fn is_insider(&self, user_id: i32) -> bool {
        self.duel.created_by == user_id || self.is_participant(user_id)
    }

    pub fn outcome_for(&self, user_id: i32) -> Option<Outcome> {
        let snapshots: Vec<_> = self.participants.iter().map(|p| p.snapshot()).collect();
        compute_outcome(self.duel.status, &snapshots, user_id)
    }
}

/// Outcome counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DuelStats {
    /// Duels the user takes part in, any status.
    #[schema(example = 12)]
    pub total: u64,
    #[schema(example = 9)]
    pub completed: u64,
    #[schema(example = 5)]
    pub won: u64,
    #[schema(example = 3)]
    pub lost: u64,
    #[schema(example = 1)]
    pub drawn: u64,
}

pub struct DuelService<'a, C: ConnectionTrait + TransactionTrait> {
    db: &'a C,
    config: &'a DuelConfig,
}

impl<'a, C: ConnectionTrait + TransactionTrait> DuelService<'a, C> {
    pub fn new(db: &'a C, config: &'a DuelConfig) -> Self {
        Self { db, config }
    }

    /// Run `op` until it stops losing the duel claim, backing off between attempts.
    ///
    /// Write conflicts reported by the backend itself (SQLite busy/locked,
    /// Postgres serialization failures) count as a lost claim.
    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T, DuelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DuelError>>,
    {
        let backend = self.db.get_database_backend();
        let max_attempts = self.config.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f().await.map_err(|e| e.classify(backend)) {
                Err(DuelError::Contended) if attempt < max_attempts => {
                    debug!(op, attempt, "Lost the duel claim, retrying");
                    tokio::time::sleep(calculate_backoff(attempt, RETRY_BASE_MS, RETRY_MAX_MS))
                        .await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Create a pending duel with the creator in slot 1.
    #[instrument(skip(self, input), fields(question_id = input.question_id))]
    pub async fn create(&self, input: NewDuel, creator_id: i32) -> Result<duel::Model, DuelError> {
        question::Entity::find_by_id(input.question_id)
            .one(self.db)
            .await?
            .ok_or(DuelError::NotFound("Question not found"))?;

        let input = &input;
        self.with_retry("create", move || self.try_create(input, creator_id))
            .await
    }

    async fn try_create(&self, input: &NewDuel, creator_id: i32) -> Result<duel::Model, DuelError> {
        for attempt in 1..=INVITE_CODE_ATTEMPTS {
            let now = Utc::now();
            let txn = self.db.begin().await?;

            let new_duel = duel::ActiveModel {
                id: NotSet,
                title: Set(input.title.trim().to_string()),
                status: Set(DuelStatus::Pending),
                created_by: Set(creator_id),
                opponent_id: Set(None),
                question_id: Set(input.question_id),
                time_limit: Set(input.time_limit),
                start_time: Set(None),
                end_time: Set(None),
                is_public: Set(input.is_public),
                invite_code: Set(generate_invite_code()),
                version: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
            };

            let model = match new_duel.insert(&txn).await {
                Ok(model) => model,
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    debug!(attempt, "Invite code collision, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            insert_participant(&txn, model.id, creator_id, 1, now).await?;
            txn.commit().await?;

            info!(duel_id = model.id, creator_id, "Duel created");
            return Ok(model);
        }

        Err(DuelError::Db(DbErr::Custom(
            "could not allocate a unique invite code".into(),
        )))
    }

    /// Join a pending duel as the next participant.
    ///
    /// Filling the last slot activates the duel and starts its clock.
    #[instrument(skip(self))]
    pub async fn join(&self, target: DuelRef<'_>, user_id: i32) -> Result<duel::Model, DuelError> {
        self.with_retry("join", move || self.try_join(target, user_id))
            .await
    }

    async fn try_join(&self, target: DuelRef<'_>, user_id: i32) -> Result<duel::Model, DuelError> {
        let txn = self.db.begin().await?;
        let duel = find_duel_for_update(&txn, target).await?;

        if duel.status != DuelStatus::Pending {
            return Err(DuelError::InvalidState(NOT_ACCEPTING));
        }

        let participants = load_participants(&txn, duel.id).await?;
        if participants.iter().any(|p| p.user_id == user_id) {
            return Err(DuelError::AlreadyJoined);
        }
        if participants.len() >= MAX_PARTICIPANTS {
            return Err(DuelError::InvalidState(DUEL_FULL));
        }

        let now = Utc::now();
        let slot = participants.len() + 1;
        let fills = slot == MAX_PARTICIPANTS;
        let next = if fills { DuelStatus::Active } else { DuelStatus::Pending };
        let mut claim = claim(&duel, next, now)?;
        if fills {
            claim = claim
                .col_expr(duel::Column::OpponentId, Expr::value(user_id))
                .col_expr(duel::Column::StartTime, Expr::value(now))
                .col_expr(
                    duel::Column::EndTime,
                    Expr::value(now + Duration::minutes(i64::from(duel.time_limit))),
                );
        }
        exec_claim(claim, &txn).await?;

        insert_participant(&txn, duel.id, user_id, slot as i32, now)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => DuelError::Contended,
                _ => DuelError::Db(e),
            })?;

        let updated = reload(&txn, duel.id).await?;
        txn.commit().await?;

        info!(duel_id = duel.id, user_id, slot, status = %updated.status, "Joined duel");
        Ok(updated)
    }

    /// Record the caller's judged submission against an active duel.
    #[instrument(skip(self))]
    pub async fn submit(
        &self,
        duel_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<duel::Model, DuelError> {
        self.with_retry("submit", move || self.try_submit(duel_id, user_id, submission_id))
            .await
    }

    async fn try_submit(
        &self,
        duel_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<duel::Model, DuelError> {
        let txn = self.db.begin().await?;
        let duel = find_duel_for_update(&txn, DuelRef::Id(duel_id)).await?;

        if duel.status != DuelStatus::Active {
            return Err(DuelError::InvalidState(NOT_ACTIVE));
        }

        let participants = load_participants(&txn, duel.id).await?;
        let me = participants
            .iter()
            .find(|p| p.user_id == user_id)
            .ok_or(DuelError::Forbidden("You are not a participant in this duel"))?;
        if me.has_submitted() {
            return Err(DuelError::AlreadySubmitted);
        }

        let submission = submission::Entity::find_by_id(submission_id)
            .one(&txn)
            .await?
            .ok_or(DuelError::NotFound("Submission not found"))?;
        if submission.user_id != user_id {
            return Err(DuelError::Forbidden("This submission belongs to another user"));
        }
        if submission.question_id != duel.question_id {
            return Err(DuelError::Validation(
                "Submission is for a different question than this duel".into(),
            ));
        }
        if !submission.status.is_final() {
            return Err(DuelError::InvalidState("Submission has not been judged yet"));
        }

        let now = Utc::now();
        let late = self.config.enforce_deadline && duel.end_time.is_some_and(|end| now > end);
        let result = if late {
            ParticipantStatus::Timeout
        } else {
            ParticipantStatus::from_verdict(submission.status.is_accepted())
        };

        let everyone_done = participants
            .iter()
            .filter(|p| p.user_id != user_id)
            .all(|p| p.completed_at.is_some());

        let next = if everyone_done { DuelStatus::Completed } else { DuelStatus::Active };
        let mut claim = claim(&duel, next, now)?;
        if everyone_done {
            claim = claim.col_expr(duel::Column::EndTime, Expr::value(now));
        }
        exec_claim(claim, &txn).await?;

        let mut entry = me.clone().into_active_model();
        entry.submission_id = Set(Some(submission.id));
        entry.completed_at = Set(Some(now));
        entry.result_status = Set(result);
        entry.execution_time = Set(submission.execution_time);
        entry.memory_used = Set(submission.memory_used);
        entry.update(&txn).await?;

        let updated = reload(&txn, duel.id).await?;
        txn.commit().await?;

        info!(
            duel_id = duel.id,
            user_id,
            submission_id,
            result = %result,
            completed = everyone_done,
            "Duel submission recorded"
        );
        Ok(updated)
    }

    /// Cancel a pending duel. Only its creator may do so.
    #[instrument(skip(self))]
    pub async fn cancel(&self, duel_id: i32, user_id: i32) -> Result<duel::Model, DuelError> {
        self.with_retry("cancel", move || self.try_cancel(duel_id, user_id))
            .await
    }

    async fn try_cancel(&self, duel_id: i32, user_id: i32) -> Result<duel::Model, DuelError> {
        let txn = self.db.begin().await?;
        let duel = find_duel_for_update(&txn, DuelRef::Id(duel_id)).await?;

        if duel.created_by != user_id {
            return Err(DuelError::Forbidden("Only the creator can cancel this duel"));
        }
        if duel.status != DuelStatus::Pending {
            return Err(DuelError::InvalidState(NOT_PENDING));
        }

        let claim = claim(&duel, DuelStatus::Cancelled, Utc::now())?;
        exec_claim(claim, &txn).await?;

        let updated = reload(&txn, duel.id).await?;
        txn.commit().await?;

        info!(duel_id, "Duel cancelled");
        Ok(updated)
    }

    /// Close an active duel whose deadline plus grace has passed.
    ///
    /// Participants without a submission are marked `timeout`. Returns `false`
    /// when the duel is no longer eligible, e.g. it completed in the meantime.
    #[instrument(skip(self))]
    pub async fn expire(&self, duel_id: i32, now: DateTime<Utc>) -> Result<bool, DuelError> {
        self.with_retry("expire", move || self.try_expire(duel_id, now))
            .await
    }

    async fn try_expire(&self, duel_id: i32, now: DateTime<Utc>) -> Result<bool, DuelError> {
        let txn = self.db.begin().await?;
        let duel = find_duel_for_update(&txn, DuelRef::Id(duel_id)).await?;

        let grace = Duration::seconds(self.config.expiry_grace_secs);
        let overdue = duel.end_time.is_some_and(|end| end + grace <= now);
        if duel.status != DuelStatus::Active || !overdue {
            txn.rollback().await?;
            return Ok(false);
        }

        let claim = claim(&duel, DuelStatus::Completed, now)?;
        exec_claim(claim, &txn).await?;

        let timed_out = duel_participant::Entity::update_many()
            .col_expr(
                duel_participant::Column::ResultStatus,
                Expr::value(ParticipantStatus::Timeout),
            )
            .filter(duel_participant::Column::DuelId.eq(duel.id))
            .filter(duel_participant::Column::SubmissionId.is_null())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            duel_id,
            timed_out = timed_out.rows_affected,
            "Expired overdue duel"
        );
        Ok(true)
    }

    /// Look up a duel for `viewer`. Private duels are visible to insiders only.
    pub async fn find(
        &self,
        target: DuelRef<'_>,
        viewer_id: i32,
    ) -> Result<DuelWithParticipants, DuelError> {
        let duel = match target {
            DuelRef::Id(id) => duel::Entity::find_by_id(id).one(self.db).await?,
            DuelRef::InviteCode(code) => {
                duel::Entity::find()
                    .filter(duel::Column::InviteCode.eq(code))
                    .one(self.db)
                    .await?
            }
        }
        .ok_or(DuelError::NotFound("Duel not found"))?;

        let participants = load_participants(self.db, duel.id).await?;
        let found = DuelWithParticipants { duel, participants };

        if !found.duel.is_public && !found.is_insider(viewer_id) {
            return Err(DuelError::Forbidden("You do not have access to this duel"));
        }
        Ok(found)
    }

    /// Public duels that are still open or running, newest first.
    pub async fn list_public(&self) -> Result<Vec<duel::Model>, DuelError> {
        Ok(duel::Entity::find()
            .filter(duel::Column::IsPublic.eq(true))
            .filter(
                duel::Column::Status.is_in(
                    DuelStatus::ALL.iter().copied().filter(DuelStatus::is_listed),
                ),
            )
            .order_by_desc(duel::Column::CreatedAt)
            .order_by_desc(duel::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Every duel `user_id` takes part in, newest first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<duel::Model>, DuelError> {
        Ok(duel::Entity::find()
            .filter(
                duel::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(duel_participant::Column::DuelId)
                        .from(duel_participant::Entity)
                        .and_where(duel_participant::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_desc(duel::Column::CreatedAt)
            .order_by_desc(duel::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn stats_for_user(&self, user_id: i32) -> Result<DuelStats, DuelError> {
        let duels = self.list_for_user(user_id).await?;
        let ids: Vec<i32> = duels.iter().map(|d| d.id).collect();
        let mut by_duel: HashMap<i32, Vec<ParticipantSnapshot>> = HashMap::new();
        for p in duel_participant::Entity::find()
            .filter(duel_participant::Column::DuelId.is_in(ids))
            .all(self.db)
            .await?
        {
            by_duel.entry(p.duel_id).or_default().push(p.snapshot());
        }

        let mut stats = DuelStats::default();
        for duel in duels {
            let snapshots = by_duel.remove(&duel.id).unwrap_or_default();
            stats.total += 1;
            if duel.status == DuelStatus::Completed {
                stats.completed += 1;
            }
            match compute_outcome(duel.status, &snapshots, user_id) {
                Some(Outcome::Win) => stats.won += 1,
                Some(Outcome::Loss) => stats.lost += 1,
                Some(Outcome::Draw) => stats.drawn += 1,
                Some(Outcome::Pending) | None => {}
            }
        }
        Ok(stats)
    }
}

/// Guarded update that succeeds only if nobody wrote the duel since it was read.
///
/// Moves the duel to `next`, which must equal its current status or be a legal
/// successor of it.
fn claim(
    duel: &duel::Model,
    next: DuelStatus,
    now: DateTime<Utc>,
) -> Result<UpdateMany<duel::Entity>, DuelError> {
    let current = duel.status;
    if next != current && !current.can_transition_to(next) {
        return Err(DuelError::InvalidState(ILLEGAL_TRANSITION));
    }

    let mut update = duel::Entity::update_many()
        .col_expr(duel::Column::Version, Expr::value(duel.version + 1))
        .col_expr(duel::Column::UpdatedAt, Expr::value(now))
        .filter(duel::Column::Id.eq(duel.id))
        .filter(duel::Column::Version.eq(duel.version))
        .filter(duel::Column::Status.eq(current));
    if next != current {
        update = update.col_expr(duel::Column::Status, Expr::value(next));
    }
    Ok(update)
}

async fn exec_claim<T: ConnectionTrait>(
    claim: UpdateMany<duel::Entity>,
    conn: &T,
) -> Result<(), DuelError> {
    let result = claim.exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(DuelError::Contended);
    }
    Ok(())
}

async fn find_duel_for_update<T: ConnectionTrait>(
    conn: &T,
    target: DuelRef<'_>,
) -> Result<duel::Model, DuelError> {
    let select = match target {
        DuelRef::Id(id) => duel::Entity::find_by_id(id),
        DuelRef::InviteCode(code) => {
            duel::Entity::find().filter(duel::Column::InviteCode.eq(code))
        }
    };
    select
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(DuelError::NotFound("Duel not found"))
}

async fn reload<T: ConnectionTrait>(conn: &T, duel_id: i32) -> Result<duel::Model, DuelError> {
    duel::Entity::find_by_id(duel_id)
        .one(conn)
        .await?
        .ok_or(DuelError::NotFound("Duel not found"))
}

async fn load_participants<T: ConnectionTrait>(
    conn: &T,
    duel_id: i32,
) -> Result<Vec<duel_participant::Model>, DbErr> {
    duel_participant::Entity::find()
        .filter(duel_participant::Column::DuelId.eq(duel_id))
        .order_by_asc(duel_participant::Column::Slot)
        .all(conn)
        .await
}

async fn insert_participant<T: ConnectionTrait>(
    conn: &T,
    duel_id: i32,
    user_id: i32,
    slot: i32,
    now: DateTime<Utc>,
) -> Result<duel_participant::Model, DbErr> {
    duel_participant::ActiveModel {
        duel_id: Set(duel_id),
        user_id: Set(user_id),
        slot: Set(slot),
        joined_at: Set(now),
        submission_id: Set(None),
        completed_at: Set(None),
        result_status: Set(ParticipantStatus::Pending),
        execution_time: Set(None),
        memory_used: Set(None),
    }
    .insert(conn)
    .await
}
