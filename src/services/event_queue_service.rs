use crate::database::unit_of_work::PgUnitOfWork;
use crate::error::{Error, Result};
use crate::models::events::DomainEvent;
use crate::utils::time::{now, retry_backoff_secs};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A claim older than this is treated as abandoned by a crashed worker.
pub const STALE_CLAIM_SECS: i64 = 300;

/// What happens to an event whose handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAt(DateTime<Utc>),
    GiveUp,
}

/// Domain errors and missing rows will fail the same way on every attempt
/// and are not retried.
pub fn retry_decision(error: &Error, attempts: i32, max_attempts: i32, failed_at: DateTime<Utc>) -> RetryDecision {
    let retryable = !error.is_domain_error() && !matches!(error, Error::NotFound(_));
    if retryable && attempts < max_attempts {
        RetryDecision::RetryAt(failed_at + Duration::seconds(retry_backoff_secs(attempts)))
    } else {
        RetryDecision::GiveUp
    }
}

/// Transactional outbox for domain events.
#[derive(Clone)]
pub struct EventQueueService {
    pool: PgPool,
}

impl EventQueueService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records the event in the caller's unit of work so it is only
    /// published if that work commits.
    pub async fn enqueue(&self, uow: &PgUnitOfWork, event: &DomainEvent) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let payload = serde_json::to_value(event)?;
        let mut guard = uow.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO domain_events (id, event_type, payload, status)
            VALUES ($1, $2, $3, 'pending')
            "#,
        )
        .bind(id)
        .bind(event.event_type())
        .bind(payload)
        .execute(guard.conn())
        .await?;
        tracing::debug!(event_id = %id, event_type = event.event_type(), "Event enqueued");
        Ok(id)
    }

    /// Claims and handles the oldest due event. Events left in `processing`
    /// for longer than `STALE_CLAIM_SECS` are claimed again. Returns `false`
    /// when nothing was due.
    pub async fn run_once(&self, app_state: &crate::AppState) -> Result<bool> {
        let rec = sqlx::query(
            r#"
            UPDATE domain_events
            SET status = 'processing', attempts = attempts + 1, claimed_at = NOW()
            WHERE id = (
                SELECT id FROM domain_events
                WHERE (status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW()))
                   OR (status = 'processing' AND claimed_at < NOW() - make_interval(secs => $1))
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, payload, attempts, max_attempts
            "#,
        )
        .bind(STALE_CLAIM_SECS as f64)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = rec else { return Ok(false) };
        let event_id: Uuid = row.try_get("id")?;
        let payload: JsonValue = row.try_get("payload")?;
        let attempts: i32 = row.try_get("attempts")?;
        let max_attempts: i32 = row.try_get("max_attempts")?;

        let event: DomainEvent = match serde_json::from_value(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(%event_id, error = %e, "Undecodable event, giving up");
                self.mark_failed(event_id, &e.to_string()).await?;
                return Ok(true);
            }
        };

        match app_state.dispatch(&event).await {
            Ok(()) => {
                sqlx::query(
                    "UPDATE domain_events SET status = 'done', last_error = NULL, processed_at = NOW() WHERE id = $1",
                )
                .bind(event_id)
                .execute(&self.pool)
                .await?;
            }
            Err(e) => match retry_decision(&e, attempts, max_attempts, now()) {
                RetryDecision::RetryAt(next_retry_at) => {
                    tracing::warn!(
                        %event_id,
                        event_type = event.event_type(),
                        attempts,
                        %next_retry_at,
                        error = %e,
                        "Event handling failed, will retry"
                    );
                    sqlx::query(
                        r#"
                        UPDATE domain_events
                        SET status = 'pending', last_error = $2, next_retry_at = $3
                        WHERE id = $1
                        "#,
                    )
                    .bind(event_id)
                    .bind(e.to_string())
                    .bind(next_retry_at)
                    .execute(&self.pool)
                    .await?;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(
                        %event_id,
                        event_type = event.event_type(),
                        attempts,
                        error = %e,
                        "Event handling failed permanently"
                    );
                    self.mark_failed(event_id, &e.to_string()).await?;
                }
            },
        }
        Ok(true)
    }

    async fn mark_failed(&self, event_id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE domain_events SET status = 'failed', last_error = $2, processed_at = NOW() WHERE id = $1",
        )
        .bind(event_id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
