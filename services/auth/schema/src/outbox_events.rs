use sea_orm::entity::prelude::*;

/// `otp_issued` deliveries waiting for the relay.
///
/// Rows are inserted in the same transaction as their `otp_challenges` row and
/// end in exactly one of `processed_at` or `failed_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    /// `{ "email", "code" }` for `otp_issued`.
    pub payload: Json,
    /// `{kind}:{challenge id}`. Sent to the email provider on every attempt.
    #[sea_orm(unique)]
    pub idempotency_key: String,
    /// Failed deliveries so far.
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTimeUtc,
    pub next_attempt_at: DateTimeUtc,
    pub processed_at: Option<DateTimeUtc>,
    pub failed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
