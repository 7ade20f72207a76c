//! User-record store contract.
//!
//! The auth core talks to persistence only through [`UserStore`], so the
//! session manager and middleware are testable against the in-memory
//! implementation and deployable against Postgres.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::{NewUser, User};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email or username already taken")]
    DuplicateHandle,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Point lookup by either unique handle. The handle is matched against
    /// both the email and username columns, lowercased.
    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::DuplicateHandle`] when email or username is
    /// already taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Unconditional write of the session binding: `Some` on login,
    /// `None` on logout or reuse-hardening.
    async fn set_refresh_token_id(
        &self,
        id: &str,
        token_id: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Atomic compare-and-set used by rotation. Returns `Ok(false)` when the
    /// stored identifier no longer equals `expected` (a concurrent refresh
    /// already rotated it); errors are reserved for backend failure.
    async fn swap_refresh_token_id(
        &self,
        id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError>;

    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<(), StoreError>;

    /// Updates the mutable profile handles; email uniqueness is re-validated.
    async fn update_account(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<User, StoreError>;

    async fn update_avatar_url(&self, id: &str, url: &str) -> Result<User, StoreError>;

    async fn update_cover_image_url(&self, id: &str, url: &str) -> Result<User, StoreError>;
}
