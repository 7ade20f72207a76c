//! Session manager: the login / refresh / logout state machine.
//!
//! Per user the session state is `NoSession` or `Active(refresh_token_id)`.
//! Login writes the binding unconditionally, refresh rotates it through a
//! compare-and-set, logout clears it. Expiry is never stored; the token
//! codec enforces it at verification time.

use std::sync::Arc;

use chrono::Duration;

use crate::config::Config;
use crate::error::AuthError;
use crate::models::user::{
    ChangePasswordRequest, LoginRequest, NewUser, RegisterInput, UpdateAccountRequest, User,
    UserResponse,
};
use crate::services::assets::{AssetStore, TempAsset};
use crate::store::UserStore;
use crate::utils::jwt::{create_access_token, create_refresh_token, verify_refresh_token};
use crate::utils::password::{hash_password, verify_password};
use crate::validation::rules;
use crate::validation::Validate;

/// Secrets and TTLs for the two token kinds.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
        }
    }
}

/// Token pair handed back by login and refresh.
#[derive(Debug)]
pub struct IssuedSession {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    assets: Arc<dyn AssetStore>,
    tokens: TokenSettings,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        assets: Arc<dyn AssetStore>,
        tokens: TokenSettings,
    ) -> Self {
        Self {
            store,
            assets,
            tokens,
        }
    }

    pub fn token_settings(&self) -> &TokenSettings {
        &self.tokens
    }

    /// Creates a user. The avatar upload happens before the store insert so
    /// a failed upload never leaves a partial record behind.
    pub async fn register(
        &self,
        input: RegisterInput,
        avatar: TempAsset,
        cover_image: Option<TempAsset>,
    ) -> Result<UserResponse, AuthError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let user_name = input.user_name.trim().to_lowercase();

        if self.store.find_by_handle(&email).await?.is_some()
            || self.store.find_by_handle(&user_name).await?.is_some()
        {
            return Err(AuthError::DuplicateHandle);
        }

        let password_hash = hash_password(&input.password)?;

        let avatar_url = self.upload_or_fail(&avatar, "Avatar upload failed").await?;
        let cover_image_url = match cover_image {
            Some(asset) => Some(
                self.upload_or_fail(&asset, "Cover image upload failed")
                    .await?,
            ),
            None => None,
        };

        let user = self
            .store
            .create(NewUser {
                full_name: input.full_name.trim().to_string(),
                email,
                user_name,
                password_hash,
                avatar_url,
                cover_image_url,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    /// Resolves the handle (email or username, either field may match),
    /// verifies the password, and opens a session. An unknown handle and a
    /// wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedSession, AuthError> {
        let handles: Vec<&str> = [request.email.as_deref(), request.user_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .collect();
        if handles.is_empty() {
            return Err(AuthError::Validation(vec![
                "email or userName is required".to_string(),
            ]));
        }

        let mut user = None;
        for handle in handles {
            if let Some(found) = self.store.find_by_handle(handle).await? {
                user = Some(found);
                break;
            }
        }
        let user = user.ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let (access_token, minted) = self.mint_pair(&user)?;
        // NoSession/Active -> Active: login is an unconditional overwrite.
        self.store
            .set_refresh_token_id(&user.id, Some(&minted.token_id))
            .await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(IssuedSession {
            user: user.into(),
            access_token,
            refresh_token: minted.token,
        })
    }

    /// Rotate-or-reject. A verified token whose rotation id no longer
    /// matches the stored binding has been used before (or stolen); the
    /// session is torn down entirely and the caller must log in again.
    pub async fn refresh(&self, presented: &str) -> Result<IssuedSession, AuthError> {
        let claims = verify_refresh_token(presented, &self.tokens.refresh_secret).map_err(|e| {
            tracing::debug!(reason = %e, "refresh token rejected");
            AuthError::Unauthorized("Invalid or expired refresh token".to_string())
        })?;

        let user = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid refresh token".to_string()))?;

        if user.refresh_token_id.as_deref() != Some(claims.jti.as_str()) {
            if user.refresh_token_id.is_some() {
                tracing::warn!(user_id = %user.id, "refresh token reuse detected, revoking session");
                self.store.set_refresh_token_id(&user.id, None).await?;
            }
            return Err(AuthError::Unauthorized(
                "Refresh token is expired or already used".to_string(),
            ));
        }

        let (access_token, minted) = self.mint_pair(&user)?;
        let rotated = self
            .store
            .swap_refresh_token_id(&user.id, &claims.jti, &minted.token_id)
            .await?;
        if !rotated {
            // Lost the rotation race to a concurrent refresh.
            return Err(AuthError::Unauthorized(
                "Refresh token is expired or already used".to_string(),
            ));
        }

        Ok(IssuedSession {
            user: user.into(),
            access_token,
            refresh_token: minted.token,
        })
    }

    /// Active -> NoSession. Clearing an already-clear binding is fine.
    pub async fn logout(&self, user_id: &str) -> Result<(), AuthError> {
        self.store.set_refresh_token_id(user_id, None).await?;
        tracing::info!(user_id = %user_id, "user logged out");
        Ok(())
    }

    /// Verifies the old password before storing a new hash. Existing
    /// sessions stay valid.
    pub async fn change_password(
        &self,
        user_id: &str,
        request: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        rules::validate_password(&request.new_password)
            .map_err(|e| AuthError::Validation(vec![format!("newPassword: {}", e.code)]))?;

        let user = self.fetch_user(user_id).await?;
        if !verify_password(&request.old_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = hash_password(&request.new_password)?;
        self.store.update_password_hash(user_id, &new_hash).await?;
        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }

    pub async fn update_account(
        &self,
        user_id: &str,
        request: UpdateAccountRequest,
    ) -> Result<UserResponse, AuthError> {
        request.validate()?;
        let user = self
            .store
            .update_account(user_id, request.full_name.trim(), request.email.trim())
            .await?;
        Ok(user.into())
    }

    pub async fn update_avatar(
        &self,
        user_id: &str,
        avatar: TempAsset,
    ) -> Result<UserResponse, AuthError> {
        let url = self.upload_or_fail(&avatar, "Avatar upload failed").await?;
        let user = self.store.update_avatar_url(user_id, &url).await?;
        Ok(user.into())
    }

    pub async fn update_cover_image(
        &self,
        user_id: &str,
        cover_image: TempAsset,
    ) -> Result<UserResponse, AuthError> {
        let url = self
            .upload_or_fail(&cover_image, "Cover image upload failed")
            .await?;
        let user = self.store.update_cover_image_url(user_id, &url).await?;
        Ok(user.into())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<User, AuthError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }

    async fn upload_or_fail(
        &self,
        asset: &TempAsset,
        message: &str,
    ) -> Result<String, AuthError> {
        match self.assets.upload(asset).await {
            Ok(uploaded) => Ok(uploaded.url),
            Err(err) => {
                tracing::warn!(error = %err, "asset upload failed");
                Err(AuthError::AssetUpload(message.to_string()))
            }
        }
    }

    fn mint_pair(
        &self,
        user: &User,
    ) -> Result<(String, crate::utils::jwt::MintedRefreshToken), AuthError> {
        let access_token =
            create_access_token(user, &self.tokens.access_secret, self.tokens.access_ttl)?;
        let minted =
            create_refresh_token(&user.id, &self.tokens.refresh_secret, self.tokens.refresh_ttl)?;
        Ok((access_token, minted))
    }
}
