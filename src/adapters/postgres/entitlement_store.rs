//! PostgreSQL implementation of EntitlementStore.
//!
//! The balance lives in `profiles.credits`. All mutations are single
//! server-side arithmetic statements; the conditional debit carries its
//! sufficiency check in the WHERE clause so concurrent requests cannot drive
//! the balance negative.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::credits::{PlanTier, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{
    CreditPurchase, DebitOutcome, Entitlement, EntitlementStore, SubscriptionRecord,
};

/// PostgreSQL implementation of the EntitlementStore port.
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    credits: i64,
    plan: String,
    subscription_status: Option<String>,
}

fn parse_plan(s: &str) -> Result<PlanTier, DomainError> {
    match s {
        "free" => Ok(PlanTier::Free),
        "pro" => Ok(PlanTier::Pro),
        "enterprise" => Ok(PlanTier::Enterprise),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid plan value: {}", s),
        )),
    }
}

fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )),
    }
}

fn parse_user_id_as_uuid(user_id: &UserId) -> Result<Uuid, DomainError> {
    Uuid::parse_str(user_id.as_str()).map_err(|e| {
        DomainError::new(
            ErrorCode::InvalidRequest,
            format!("User ID must be a valid UUID: {}", e),
        )
    })
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn credit_balance(&self, user_id: &UserId) -> Result<Option<i64>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let credits: Option<i64> =
            sqlx::query_scalar("SELECT credits FROM profiles WHERE user_id = $1")
                .bind(user_uuid)
                .fetch_optional(&self.pool)
                .await?;

        Ok(credits)
    }

    async fn entitlement(&self, user_id: &UserId) -> Result<Option<Entitlement>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT credits, plan, subscription_status
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Entitlement {
                user_id: user_id.clone(),
                credits: row.credits,
                plan: parse_plan(&row.plan)?,
                subscription_status: row
                    .subscription_status
                    .as_deref()
                    .map(parse_subscription_status)
                    .transpose()?,
            })
        })
        .transpose()
    }

    async fn debit_credits(
        &self,
        user_id: &UserId,
        amount: u32,
    ) -> Result<DebitOutcome, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        // Conditional decrement; returns no row when the balance is short.
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE profiles
            SET credits = credits - $2, updated_at = now()
            WHERE user_id = $1 AND credits >= $2
            RETURNING credits
            "#,
        )
        .bind(user_uuid)
        .bind(i64::from(amount))
        .fetch_optional(&self.pool)
        .await?;

        match remaining {
            Some(remaining) => Ok(DebitOutcome::Debited { remaining }),
            None => {
                let available = self.credit_balance(user_id).await?.unwrap_or(0);
                Ok(DebitOutcome::InsufficientCredits { available })
            }
        }
    }

    async fn grant_credits(&self, user_id: &UserId, amount: u32) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET credits = credits + $2, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .bind(i64::from(amount))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NotFound,
                format!("No profile for user {}", user_id),
            ));
        }

        Ok(())
    }

    async fn apply_credit_purchase(&self, purchase: CreditPurchase) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&purchase.user_id)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET credits = credits + $2, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .bind(i64::from(purchase.credits))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::new(
                ErrorCode::NotFound,
                format!("No profile for user {}", purchase.user_id),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO credit_purchases (user_id, credits, amount_cents, payment_intent_id, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_uuid)
        .bind(i64::from(purchase.credits))
        .bind(purchase.amount_cents)
        .bind(&purchase.payment_intent_id)
        .bind(purchase.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn upsert_subscription(&self, record: SubscriptionRecord) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&record.user_id)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, stripe_customer_id, stripe_subscription_id, plan, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stripe_subscription_id) DO UPDATE
            SET plan = EXCLUDED.plan, status = EXCLUDED.status, updated_at = now()
            "#,
        )
        .bind(user_uuid)
        .bind(&record.stripe_customer_id)
        .bind(&record.stripe_subscription_id)
        .bind(record.plan.as_str())
        .bind(record.status.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET plan = $2, subscription_status = $3, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .bind(record.plan.as_str())
        .bind(record.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_subscription_user(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let user_uuid: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM subscriptions WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .fetch_optional(&self.pool)
        .await?;

        user_uuid
            .map(|id| {
                UserId::new(id.to_string()).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
                })
            })
            .transpose()
    }

    async fn cancel_subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let mut tx = self.pool.begin().await?;

        let user_uuid: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE subscriptions
            SET status = 'canceled', updated_at = now()
            WHERE stripe_subscription_id = $1
            RETURNING user_id
            "#,
        )
        .bind(stripe_subscription_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_uuid) = user_uuid else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE profiles
            SET plan = 'free', subscription_status = 'canceled', updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_uuid)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        UserId::new(user_uuid.to_string())
            .map(Some)
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })
    }

    async fn mark_subscription_active(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'active', updated_at = now()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
