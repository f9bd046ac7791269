//! PostgreSQL implementation of ResultStore.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{ResultStore, SavedResult};

/// PostgreSQL implementation of the ResultStore port.
pub struct PostgresResultStore {
    pool: PgPool,
}

impl PostgresResultStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    async fn save_result(&self, result: SavedResult) -> Result<(), DomainError> {
        let user_uuid = Uuid::parse_str(result.user_id.as_str()).map_err(|e| {
            DomainError::new(
                ErrorCode::InvalidRequest,
                format!("User ID must be a valid UUID: {}", e),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO saved_results (user_id, service, report, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_uuid)
        .bind(result.service)
        .bind(&result.report)
        .bind(result.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
