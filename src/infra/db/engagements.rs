use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::application::repos::{EngagementStore, RepoError};
use crate::domain::{TargetKind, TargetRef};

use super::{PostgresEngagements, map_sqlx_error};

// "Engaged" means present and not explicitly false: rows written before the
// flag existed carry NULL and still count.
const ENGAGED_PREDICATE: &str = "active IS DISTINCT FROM FALSE";

#[async_trait]
impl EngagementStore for PostgresEngagements {
    async fn toggle(&self, user_id: &str, target: &TargetRef) -> Result<bool, RepoError> {
        // Single-statement upsert so the check-then-set cannot lose updates:
        // two concurrent toggles on the same pair serialize on the row and
        // each returns the value it actually persisted. A legacy NULL flag
        // counts as engaged, so toggling it lands on FALSE.
        let active: bool = sqlx::query_scalar(
            r#"
            INSERT INTO engagements (id, user_id, target_kind, target_id, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, now(), now())
            ON CONFLICT (user_id, target_kind, target_id)
            DO UPDATE SET
                active = (engagements.active IS NOT DISTINCT FROM FALSE),
                updated_at = now()
            RETURNING COALESCE(active, TRUE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(target.kind.as_str())
        .bind(&target.id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(active)
    }

    async fn is_active(&self, user_id: &str, target: &TargetRef) -> Result<bool, RepoError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM engagements
                WHERE user_id = $1
                  AND target_kind = $2
                  AND target_id = $3
                  AND active IS DISTINCT FROM FALSE
            )
            "#,
        )
        .bind(user_id)
        .bind(target.kind.as_str())
        .bind(&target.id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_active(&self, target: &TargetRef) -> Result<i64, RepoError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM engagements
            WHERE target_kind = $1
              AND target_id = $2
              AND active IS DISTINCT FROM FALSE
            "#,
        )
        .bind(target.kind.as_str())
        .bind(&target.id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn batch_is_active(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, bool>, RepoError> {
        if targets.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT target_kind, target_id FROM engagements WHERE user_id = ",
        );
        qb.push_bind(user_id);
        qb.push(" AND ");
        qb.push(ENGAGED_PREDICATE);
        qb.push(" AND (target_kind, target_id) IN ");
        qb.push_tuples(targets, |mut b, target| {
            b.push_bind(target.kind.as_str());
            b.push_bind(target.id.as_str());
        });

        let rows = qb
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut engaged = HashMap::with_capacity(rows.len());
        for row in rows {
            engaged.insert(decode_target(&row)?, true);
        }
        Ok(engaged)
    }

    async fn batch_count_active(
        &self,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, i64>, RepoError> {
        if targets.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT target_kind, target_id, COUNT(*) AS engaged FROM engagements WHERE ",
        );
        qb.push(ENGAGED_PREDICATE);
        qb.push(" AND (target_kind, target_id) IN ");
        qb.push_tuples(targets, |mut b, target| {
            b.push_bind(target.kind.as_str());
            b.push_bind(target.id.as_str());
        });
        qb.push(" GROUP BY target_kind, target_id");

        let rows = qb
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut counted = HashMap::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.try_get("engaged").map_err(map_sqlx_error)?;
            counted.insert(decode_target(&row)?, count);
        }

        // Explicit zero-fill: callers must be able to tell "zero
        // engagements" from "not queried".
        let mut result = HashMap::with_capacity(targets.len());
        for target in targets {
            let count = counted.get(target).copied().unwrap_or(0);
            result.insert(target.clone(), count);
        }
        Ok(result)
    }
}

fn decode_target(row: &sqlx::postgres::PgRow) -> Result<TargetRef, RepoError> {
    let kind: String = row.try_get("target_kind").map_err(map_sqlx_error)?;
    let id: String = row.try_get("target_id").map_err(map_sqlx_error)?;
    let kind = TargetKind::parse(&kind).ok_or_else(|| RepoError::Integrity {
        message: format!("unknown target kind `{kind}`"),
    })?;
    Ok(TargetRef { kind, id })
}
