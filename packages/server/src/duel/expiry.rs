use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{DuelConfig, DuelStatus};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use tracing::{error, info};

use super::DuelService;
use crate::entity::duel;

/// Periodically close active duels whose deadline has passed.
pub async fn run_expiry_sweeper(db: DatabaseConnection, config: DuelConfig) {
    let scan_interval = Duration::from_secs(config.expiry_sweep_interval_secs);

    info!(
        interval_secs = config.expiry_sweep_interval_secs,
        grace_secs = config.expiry_grace_secs,
        "Starting duel expiry sweeper"
    );

    let mut interval = tokio::time::interval(scan_interval);

    loop {
        interval.tick().await;

        if let Err(e) = sweep_expired_duels(&db, &config, Utc::now()).await {
            error!(error = %e, "Duel expiry sweep failed");
        }
    }
}

/// Expire every overdue active duel as of `now`. Returns how many were closed.
pub async fn sweep_expired_duels(
    db: &DatabaseConnection,
    config: &DuelConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let threshold = now - chrono::Duration::seconds(config.expiry_grace_secs);

    let overdue: Vec<i32> = duel::Entity::find()
        .select_only()
        .column(duel::Column::Id)
        .filter(duel::Column::Status.eq(DuelStatus::Active))
        .filter(duel::Column::EndTime.lte(threshold))
        .into_tuple()
        .all(db)
        .await?;

    if overdue.is_empty() {
        return Ok(0);
    }

    let service = DuelService::new(db, config);
    let mut closed = 0;
    for duel_id in overdue {
        match service.expire(duel_id, now).await {
            Ok(true) => closed += 1,
            Ok(false) => {}
            Err(e) => error!(duel_id, error = %e, "Failed to expire duel"),
        }
    }

    if closed > 0 {
        info!(closed, "Closed overdue duels");
    }
    Ok(closed)
}
