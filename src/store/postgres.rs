//! Postgres-backed [`UserStore`] implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::user::{NewUser, User};

use super::{StoreError, UserStore};

const USER_COLUMNS: &str = "id, email, user_name, full_name, password_hash, avatar_url, \
     cover_image_url, refresh_token_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateHandle;
        }
    }
    StoreError::Backend(err.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError> {
        let handle = handle.to_lowercase();
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR user_name = $1"
        ))
        .bind(&handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = User::new(
            new_user.full_name,
            new_user.email,
            new_user.user_name,
            new_user.password_hash,
            new_user.avatar_url,
            new_user.cover_image_url,
        );
        sqlx::query(
            "INSERT INTO users (id, email, user_name, full_name, password_hash, avatar_url, \
             cover_image_url, refresh_token_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $9)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn set_refresh_token_id(
        &self,
        id: &str,
        token_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET refresh_token_id = $1, updated_at = $2 WHERE id = $3")
                .bind(token_id)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn swap_refresh_token_id(
        &self,
        id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        // The WHERE clause is the compare half of the CAS; concurrent
        // rotations for the same user serialize on this row update.
        let result = sqlx::query(
            "UPDATE users SET refresh_token_id = $1, updated_at = $2 \
             WHERE id = $3 AND refresh_token_id = $4",
        )
        .bind(new)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(hash)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_account(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<User, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET full_name = $1, email = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(full_name)
        .bind(email.to_lowercase())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.fetch_by_id(id).await
    }

    async fn update_avatar_url(&self, id: &str, url: &str) -> Result<User, StoreError> {
        let result =
            sqlx::query("UPDATE users SET avatar_url = $1, updated_at = $2 WHERE id = $3")
                .bind(url)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.fetch_by_id(id).await
    }

    async fn update_cover_image_url(&self, id: &str, url: &str) -> Result<User, StoreError> {
        let result =
            sqlx::query("UPDATE users SET cover_image_url = $1, updated_at = $2 WHERE id = $3")
                .bind(url)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.fetch_by_id(id).await
    }
}
