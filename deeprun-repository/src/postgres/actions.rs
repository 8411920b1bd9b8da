//! PostgreSQL implementation of the action queue.
//!
//! Provides a production-ready PostgreSQL backend for the `ActionQueue` trait
//! with connection pooling and lock-free claim semantics.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Idempotent enqueue with `ON CONFLICT DO UPDATE` on `(signer, idempotency_key)`
//! - Atomic claim using `FOR UPDATE SKIP LOCKED` so workers never block each other
//! - Conflict-key fencing: at most one running action per key, oldest waiter first
//!
//! ## Database Tables
//!
//! - `action_submissions`: Queued, running, and settled action submissions
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deeprun_shared::types::{ActionInput, ActionReceipt, ActionStatus, ActionSubmission};
use uuid::Uuid;

use crate::conflict::derive_conflict_key;
use crate::{ActionQueue, ActionQueueError};

const CLAIM_NEXT_SQL: &str = r#"
WITH candidate AS (
  SELECT queued.action_id
  FROM action_submissions AS queued
  WHERE queued.status IN ('queued', 'retry')
    AND (
      queued.conflict_key IS NULL OR (
        NOT EXISTS (
          SELECT 1
          FROM action_submissions AS running
          WHERE running.status = 'running'
            AND running.conflict_key = queued.conflict_key
        )
        AND NOT EXISTS (
          SELECT 1
          FROM action_submissions AS earlier
          WHERE earlier.status IN ('queued', 'retry')
            AND earlier.conflict_key = queued.conflict_key
            AND (
              earlier.created_at < queued.created_at
              OR (earlier.created_at = queued.created_at AND earlier.action_id < queued.action_id)
            )
        )
      )
    )
  ORDER BY queued.created_at ASC, queued.action_id ASC
  FOR UPDATE OF queued SKIP LOCKED
  LIMIT 1
)
UPDATE action_submissions AS target
SET status = 'running',
    attempts = attempts + 1,
    updated_at = NOW()
FROM candidate
WHERE target.action_id = candidate.action_id
  AND target.status IN ('queued', 'retry')
RETURNING target.*
"#;

/// PostgreSQL implementation of the action queue.
///
/// Provides enqueue, claim, and status-transition operations over the
/// `action_submissions` table using PostgreSQL with connection pooling.
pub struct PostgresActionQueue {
    pool: sqlx::PgPool,
}

impl PostgresActionQueue {
    /// Creates a new PostgreSQL action queue instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with required schema
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionQueue for PostgresActionQueue {
    async fn enqueue(
        &self,
        signer: &str,
        idempotency_key: Option<&str>,
        action: &ActionInput,
    ) -> Result<ActionSubmission, ActionQueueError> {
        let action_id = Uuid::new_v4();
        let idempotency_key = idempotency_key
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let request = serde_json::to_value(action)?;

        // The no-op DO UPDATE makes RETURNING yield the existing row on a
        // duplicate (signer, idempotency_key) instead of nothing.
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO action_submissions(
              action_id, signer, idempotency_key, action_type, request, conflict_key, status
            ) VALUES ($1, $2, $3, $4, $5, $6, 'queued')
            ON CONFLICT (signer, idempotency_key) DO UPDATE
              SET signer = EXCLUDED.signer
            RETURNING *
            "#,
        )
        .bind(action_id)
        .bind(signer.to_lowercase())
        .bind(&idempotency_key)
        .bind(action.kind())
        .bind(&request)
        .bind(derive_conflict_key(action))
        .fetch_one(&self.pool)
        .await?;

        row.into_submission()
    }

    async fn claim_next(&self) -> Result<Option<ActionSubmission>, ActionQueueError> {
        let row = sqlx::query_as::<_, SubmissionRow>(CLAIM_NEXT_SQL)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn mark_succeeded(
        &self,
        action_id: Uuid,
        receipt: &ActionReceipt,
    ) -> Result<(), ActionQueueError> {
        let result = serde_json::to_value(receipt)?;

        sqlx::query(
            r#"
            UPDATE action_submissions
            SET status = 'succeeded',
                result = $2,
                tx_hashes = $3,
                error_code = NULL,
                error_message = NULL,
                updated_at = NOW()
            WHERE action_id = $1
            "#,
        )
        .bind(action_id)
        .bind(&result)
        .bind(&receipt.tx_hashes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_retry(
        &self,
        action_id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), ActionQueueError> {
        sqlx::query(
            r#"
            UPDATE action_submissions
            SET status = 'retry',
                error_code = $2,
                error_message = $3,
                updated_at = NOW()
            WHERE action_id = $1
            "#,
        )
        .bind(action_id)
        .bind(error_code)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(
        &self,
        action_id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), ActionQueueError> {
        sqlx::query(
            r#"
            UPDATE action_submissions
            SET status = 'failed',
                error_code = $2,
                error_message = $3,
                updated_at = NOW()
            WHERE action_id = $1
            "#,
        )
        .bind(action_id)
        .bind(error_code)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(
        &self,
        action_id: Uuid,
    ) -> Result<Option<ActionSubmission>, ActionQueueError> {
        let row =
            sqlx::query_as::<_, SubmissionRow>("SELECT * FROM action_submissions WHERE action_id = $1")
                .bind(action_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn get_by_signer_and_key(
        &self,
        signer: &str,
        idempotency_key: &str,
    ) -> Result<Option<ActionSubmission>, ActionQueueError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM action_submissions WHERE signer = $1 AND idempotency_key = $2",
        )
        .bind(signer.to_lowercase())
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    async fn get_latest_by_character(
        &self,
        character_id: i64,
    ) -> Result<Option<ActionSubmission>, ActionQueueError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT *
            FROM action_submissions
            WHERE jsonb_exists(request, 'characterId')
              AND (request->>'characterId')::bigint = $1
            ORDER BY created_at DESC, action_id DESC
            LIMIT 1
            "#,
        )
        .bind(character_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }
}

/// Raw database row for a submission, decoded before payload deserialization.
#[derive(sqlx::FromRow)]
struct SubmissionRow {
    action_id: Uuid,
    signer: String,
    idempotency_key: String,
    action_type: String,
    request: serde_json::Value,
    conflict_key: Option<String>,
    status: String,
    result: Option<serde_json::Value>,
    error_code: Option<String>,
    error_message: Option<String>,
    attempts: i32,
    tx_hashes: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubmissionRow {
    fn into_submission(self) -> Result<ActionSubmission, ActionQueueError> {
        let status = parse_status(&self.status)?;
        let request: ActionInput = serde_json::from_value(self.request)?;

        Ok(ActionSubmission {
            action_id: self.action_id,
            signer: self.signer,
            idempotency_key: self.idempotency_key,
            action_type: self.action_type,
            request,
            conflict_key: self.conflict_key,
            status,
            result: self.result,
            error_code: self.error_code,
            error_message: self.error_message,
            attempts: self.attempts,
            tx_hashes: self.tx_hashes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_status(raw: &str) -> Result<ActionStatus, ActionQueueError> {
    match raw {
        "queued" => Ok(ActionStatus::Queued),
        "running" => Ok(ActionStatus::Running),
        "retry" => Ok(ActionStatus::Retry),
        "succeeded" => Ok(ActionStatus::Succeeded),
        "failed" => Ok(ActionStatus::Failed),
        other => Err(ActionQueueError::InvalidStatus(other.to_string())),
    }
}
