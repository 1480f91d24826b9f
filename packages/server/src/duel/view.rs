//! Batch hydration of duel rows into API responses.

use std::collections::{HashMap, HashSet};

use common::winner;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::{duel, duel_participant, question, user};
use crate::models::duel::{DuelResponse, ParticipantResponse};
use crate::models::question::QuestionSummary;
use crate::models::shared::UserSummary;

use super::DuelWithParticipants;

const MISSING: &str = "[deleted]";

/// Resolve users, questions and participants for `duels` in three queries.
///
/// Order of `duels` is preserved.
pub async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    duels: Vec<duel::Model>,
    viewer_id: i32,
) -> Result<Vec<DuelResponse>, DbErr> {
    if duels.is_empty() {
        return Ok(Vec::new());
    }

    let duel_ids: Vec<i32> = duels.iter().map(|d| d.id).collect();
    let mut participants: HashMap<i32, Vec<duel_participant::Model>> = HashMap::new();
    for p in duel_participant::Entity::find()
        .filter(duel_participant::Column::DuelId.is_in(duel_ids))
        .order_by_asc(duel_participant::Column::Slot)
        .all(conn)
        .await?
    {
        participants.entry(p.duel_id).or_default().push(p);
    }

    let found: Vec<DuelWithParticipants> = duels
        .into_iter()
        .map(|duel| {
            let participants = participants.remove(&duel.id).unwrap_or_default();
            DuelWithParticipants { duel, participants }
        })
        .collect();

    hydrate_loaded(conn, found, viewer_id).await
}

/// Hydrate duels whose participants are already loaded.
pub async fn hydrate_loaded<C: ConnectionTrait>(
    conn: &C,
    found: Vec<DuelWithParticipants>,
    viewer_id: i32,
) -> Result<Vec<DuelResponse>, DbErr> {
    let mut user_ids = HashSet::new();
    let mut question_ids = HashSet::new();
    for item in &found {
        user_ids.insert(item.duel.created_by);
        user_ids.extend(item.duel.opponent_id);
        user_ids.extend(item.participants.iter().map(|p| p.user_id));
        question_ids.insert(item.duel.question_id);
    }

    let users: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let questions: HashMap<i32, question::Model> = question::Entity::find()
        .filter(question::Column::Id.is_in(question_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let summary = |id: i32| UserSummary {
        id,
        username: users
            .get(&id)
            .map_or_else(|| MISSING.to_string(), |u| u.username.clone()),
    };

    Ok(found
        .into_iter()
        .map(|item| {
            let snapshots: Vec<_> = item.participants.iter().map(|p| p.snapshot()).collect();
            let winner_id = winner(item.duel.status, &snapshots);
            let outcome = item.outcome_for(viewer_id);
            let invite_code = item
                .is_insider(viewer_id)
                .then(|| item.duel.invite_code.clone());
            let question = questions.get(&item.duel.question_id).map_or_else(
                || QuestionSummary {
                    id: item.duel.question_id,
                    title: MISSING.to_string(),
                    difficulty: String::new(),
                },
                QuestionSummary::from,
            );

            let DuelWithParticipants { duel, participants } = item;
            DuelResponse {
                id: duel.id,
                title: duel.title,
                status: duel.status,
                created_by: summary(duel.created_by),
                opponent: duel.opponent_id.map(&summary),
                question,
                time_limit: duel.time_limit,
                start_time: duel.start_time,
                end_time: duel.end_time,
                is_public: duel.is_public,
                invite_code,
                participants: participants
                    .into_iter()
                    .map(|p| ParticipantResponse {
                        user: summary(p.user_id),
                        slot: p.slot,
                        joined_at: p.joined_at,
                        submission_id: p.submission_id,
                        completed_at: p.completed_at,
                        result: p.result_status,
                        execution_time: p.execution_time,
                        memory_used: p.memory_used,
                    })
                    .collect(),
                winner_id,
                outcome,
                created_at: duel.created_at,
                updated_at: duel.updated_at,
            }
        })
        .collect())
}

pub async fn hydrate_one<C: ConnectionTrait>(
    conn: &C,
    duel: duel::Model,
    viewer_id: i32,
) -> Result<DuelResponse, DbErr> {
    hydrate(conn, vec![duel], viewer_id)
        .await?
        .pop()
        .ok_or_else(|| DbErr::RecordNotFound("duel vanished during hydration".into()))
}
