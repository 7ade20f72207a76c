//! User record and the request/response payloads of the auth API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::rules;

/// Persistent representation of a registered user.
///
/// `refresh_token_id` is the single piece of mutable session state: it holds
/// the identifier of the most recently issued refresh token, or `None` when
/// no session is active. It is overwritten on login/refresh and cleared on
/// logout, which is what revokes an otherwise still-valid refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    /// Unique handle, stored lowercase.
    pub email: String,
    /// Unique handle, stored lowercase.
    pub user_name: String,
    pub full_name: String,
    /// Argon2 hash; never serialized outward (see `UserResponse`).
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub refresh_token_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        full_name: String,
        email: String,
        user_name: String,
        password_hash: String,
        avatar_url: String,
        cover_image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            user_name: user_name.to_lowercase(),
            full_name,
            password_hash,
            avatar_url,
            cover_image_url,
            refresh_token_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields required to create a user; the session manager builds this after
/// hashing the password and uploading the avatar.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub user_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

/// Registration form fields (the avatar arrives as a separate multipart
/// file). All fields must be non-blank after trimming.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(custom(function = rules::validate_not_blank))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = rules::validate_username))]
    pub user_name: String,
    #[validate(custom(function = rules::validate_password))]
    pub password: String,
}

/// Login credentials; at least one of the two handles must be present and
/// either one may match (OR semantics).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(custom(function = rules::validate_not_blank))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Public-facing user: everything except the password hash and the refresh
/// token binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub user_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    #[serde(rename = "coverImage")]
    pub cover_image_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            user_name: user.user_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
        }
    }
}

/// Token pair plus sanitized user, returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_never_carries_credentials() {
        let user = User::new(
            "Jane Doe".into(),
            "Jane@X.com".into(),
            "Jane".into(),
            "$argon2$…".into(),
            "https://cdn.example/a.png".into(),
            None,
        );
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refreshTokenId").is_none());
        assert_eq!(json["email"], "jane@x.com");
        assert_eq!(json["userName"], "jane");
    }

    #[test]
    fn handles_are_normalized_to_lowercase_at_construction() {
        let user = User::new(
            "Jane Doe".into(),
            "JANE@X.COM".into(),
            "JaNe".into(),
            "hash".into(),
            "url".into(),
            None,
        );
        assert_eq!(user.email, "jane@x.com");
        assert_eq!(user.user_name, "jane");
    }

    #[test]
    fn login_request_accepts_either_handle() {
        let by_email: LoginRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"pw"}"#).unwrap();
        assert_eq!(by_email.email.as_deref(), Some("a@x.com"));
        assert!(by_email.user_name.is_none());

        let by_name: LoginRequest =
            serde_json::from_str(r#"{"userName":"alice","password":"pw"}"#).unwrap();
        assert_eq!(by_name.user_name.as_deref(), Some("alice"));
    }
}
