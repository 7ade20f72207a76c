//! In-memory [`UserStore`] for tests and local development.
//!
//! A single mutex guards the map, so `swap_refresh_token_id` gets the same
//! atomicity the Postgres conditional UPDATE provides.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::user::{NewUser, User};

use super::{StoreError, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut User) -> T,
    ) -> Result<T, StoreError> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        let out = f(user);
        user.updated_at = Utc::now();
        Ok(out)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError> {
        let handle = handle.to_lowercase();
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users
            .values()
            .find(|u| u.email == handle || u.user_name == handle)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.get(id).cloned())
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
        let mut users = self.users.lock().expect("user store lock poisoned");
        if users
            .values()
            .any(|u| u.email == user.email || u.user_name == user.user_name)
        {
            return Err(StoreError::DuplicateHandle);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn set_refresh_token_id(
        &self,
        id: &str,
        token_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.with_user(id, |u| u.refresh_token_id = token_id.map(str::to_string))
    }

    async fn swap_refresh_token_id(
        &self,
        id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        self.with_user(id, |u| {
            if u.refresh_token_id.as_deref() == Some(expected) {
                u.refresh_token_id = Some(new.to_string());
                true
            } else {
                false
            }
        })
    }

    async fn update_password_hash(&self, id: &str, hash: &str) -> Result<(), StoreError> {
        self.with_user(id, |u| u.password_hash = hash.to_string())
    }

    async fn update_account(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<User, StoreError> {
        let email = email.to_lowercase();
        {
            let users = self.users.lock().expect("user store lock poisoned");
            if users.values().any(|u| u.email == email && u.id != id) {
                return Err(StoreError::DuplicateHandle);
            }
        }
        self.with_user(id, |u| {
            u.full_name = full_name.to_string();
            u.email = email.clone();
            u.clone()
        })
    }

    async fn update_avatar_url(&self, id: &str, url: &str) -> Result<User, StoreError> {
        self.with_user(id, |u| {
            u.avatar_url = url.to_string();
            u.clone()
        })
    }

    async fn update_cover_image_url(&self, id: &str, url: &str) -> Result<User, StoreError> {
        self.with_user(id, |u| {
            u.cover_image_url = Some(url.to_string());
            u.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, user_name: &str) -> NewUser {
        NewUser {
            full_name: "Jane Doe".into(),
            email: email.into(),
            user_name: user_name.into(),
            password_hash: "hash".into(),
            avatar_url: "https://cdn.example/a.png".into(),
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn find_by_handle_matches_email_or_username() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com", "alice")).await.unwrap();

        assert!(store.find_by_handle("a@x.com").await.unwrap().is_some());
        assert!(store.find_by_handle("alice").await.unwrap().is_some());
        assert!(store.find_by_handle("ALICE").await.unwrap().is_some());
        assert!(store.find_by_handle("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_handles() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com", "alice")).await.unwrap();

        let err = store
            .create(new_user("a@x.com", "other"))
            .await
            .expect_err("duplicate email");
        assert!(matches!(err, StoreError::DuplicateHandle));

        let err = store
            .create(new_user("b@x.com", "alice"))
            .await
            .expect_err("duplicate username");
        assert!(matches!(err, StoreError::DuplicateHandle));
    }

    #[tokio::test]
    async fn swap_is_a_compare_and_set() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@x.com", "alice")).await.unwrap();
        store
            .set_refresh_token_id(&user.id, Some("r0"))
            .await
            .unwrap();

        assert!(store.swap_refresh_token_id(&user.id, "r0", "r1").await.unwrap());
        // Stale expectation loses.
        assert!(!store.swap_refresh_token_id(&user.id, "r0", "r2").await.unwrap());

        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_id.as_deref(), Some("r1"));
    }
}
