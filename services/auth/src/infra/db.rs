use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use bookly_auth_schema::{otp_challenges, outbox_events, users};

use crate::domain::repository::{OtpChallengeRepository, OutboxRepository, UserRepository};
use crate::domain::types::{AuthUser, OtpChallenge, OutboxEvent, PendingOutboxEvent};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_or_create_by_email(&self, email: &str) -> Result<AuthUser, AuthServiceError> {
        if let Some(user) = self.find_by_email(email).await? {
            return Ok(user);
        }

        // Two first sign-ins may race; the unique index keeps one row.
        users::Entity::insert(users::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_owned()),
            onboarded_at: Set(None),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::column(users::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("create user")?;

        self.find_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {email} missing after insert").into())
    }
}

fn user_from_model(model: users::Model) -> AuthUser {
    AuthUser {
        id: model.id,
        email: model.email,
        onboarded_at: model.onboarded_at,
        created_at: model.created_at,
    }
}

// ── OTP challenge repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpChallengeRepository {
    pub db: DatabaseConnection,
}

impl OtpChallengeRepository for DbOtpChallengeRepository {
    async fn issue_with_outbox(
        &self,
        challenge: &OtpChallenge,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let challenge = challenge.clone();
                let event = event.clone();
                Box::pin(async move {
                    revoke_active(txn, &challenge.email, challenge.created_at).await?;
                    insert_challenge(txn, &challenge).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("issue otp challenge with outbox")?;
        Ok(())
    }

    async fn find_active(&self, email: &str) -> Result<Option<OtpChallenge>, AuthServiceError> {
        let now = Utc::now();
        let model = otp_challenges::Entity::find()
            .filter(otp_challenges::Column::Email.eq(email))
            .filter(otp_challenges::Column::ConsumedAt.is_null())
            .filter(otp_challenges::Column::RevokedAt.is_null())
            .filter(otp_challenges::Column::ExpiresAt.gt(now))
            .order_by_desc(otp_challenges::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find active otp challenge")?;
        Ok(model.map(challenge_from_model))
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let now = Utc::now();
        let result = otp_challenges::Entity::update_many()
            .col_expr(otp_challenges::Column::ConsumedAt, Expr::value(now))
            .filter(otp_challenges::Column::Id.eq(id))
            .filter(otp_challenges::Column::ConsumedAt.is_null())
            .filter(otp_challenges::Column::RevokedAt.is_null())
            .filter(otp_challenges::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .context("consume otp challenge")?;
        Ok(result.rows_affected == 1)
    }
}

async fn revoke_active(
    txn: &DatabaseTransaction,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(), sea_orm::DbErr> {
    otp_challenges::Entity::update_many()
        .col_expr(otp_challenges::Column::RevokedAt, Expr::value(now))
        .filter(otp_challenges::Column::Email.eq(email))
        .filter(otp_challenges::Column::ConsumedAt.is_null())
        .filter(otp_challenges::Column::RevokedAt.is_null())
        .exec(txn)
        .await?;
    Ok(())
}

async fn insert_challenge(
    txn: &DatabaseTransaction,
    challenge: &OtpChallenge,
) -> Result<(), sea_orm::DbErr> {
    otp_challenges::ActiveModel {
        id: Set(challenge.id),
        email: Set(challenge.email.clone()),
        code: Set(challenge.code.clone()),
        expires_at: Set(challenge.expires_at),
        consumed_at: Set(None),
        revoked_at: Set(None),
        created_at: Set(challenge.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), sea_orm::DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn challenge_from_model(model: otp_challenges::Model) -> OtpChallenge {
    OtpChallenge {
        id: model.id,
        email: model.email,
        code: model.code,
        expires_at: model.expires_at,
        consumed_at: model.consumed_at,
        revoked_at: model.revoked_at,
        created_at: model.created_at,
    }
}

// ── Outbox repository ─────────────────────────────────────────────────────────

/// Assumes a single relay instance; rows are not locked while in flight.
#[derive(Clone)]
pub struct DbOutboxRepository {
    pub db: DatabaseConnection,
}

impl OutboxRepository for DbOutboxRepository {
    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<PendingOutboxEvent>, AuthServiceError> {
        let models = outbox_events::Entity::find()
            .filter(outbox_events::Column::ProcessedAt.is_null())
            .filter(outbox_events::Column::FailedAt.is_null())
            .filter(outbox_events::Column::NextAttemptAt.lte(now))
            .order_by_asc(outbox_events::Column::NextAttemptAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list due outbox events")?;
        Ok(models
            .into_iter()
            .map(|m| PendingOutboxEvent {
                id: m.id,
                kind: m.kind,
                payload: m.payload,
                idempotency_key: m.idempotency_key,
                attempts: m.attempts,
            })
            .collect())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), AuthServiceError> {
        outbox_events::ActiveModel {
            id: Set(id),
            processed_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark outbox event processed")?;
        Ok(())
    }

    async fn schedule_retry(
        &self,
        id: Uuid,
        attempts: i32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), AuthServiceError> {
        outbox_events::ActiveModel {
            id: Set(id),
            attempts: Set(attempts),
            next_attempt_at: Set(next_attempt_at),
            last_error: Set(Some(error.to_owned())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("schedule outbox retry")?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
    ) -> Result<(), AuthServiceError> {
        outbox_events::ActiveModel {
            id: Set(id),
            attempts: Set(attempts),
            failed_at: Set(Some(Utc::now())),
            last_error: Set(Some(error.to_owned())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark outbox event failed")?;
        Ok(())
    }
}
