use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::user::User;

const USER_COLUMNS: &str = "id, id_no, name, password_hash, created_at, updated_at";

pub async fn find_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_by_id_no(pool: &PgPool, id_no: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id_no = $1"
    ))
    .bind(id_no)
    .fetch_optional(pool)
    .await
}

/// User lookup seam consumed by the auth engine. Mockable for orchestration
/// tests; the Postgres implementation delegates to the query helpers above.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AppError>;
    async fn find_by_id_no(&self, id_no: String) -> Result<Option<User>, AppError>;
}

pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AppError> {
        find_user_by_id(&self.pool, user_id)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_id_no(&self, id_no: String) -> Result<Option<User>, AppError> {
        find_user_by_id_no(&self.pool, &id_no)
            .await
            .map_err(AppError::from)
    }
}
