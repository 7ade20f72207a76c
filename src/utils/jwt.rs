//! Token codec: signs and verifies the two token kinds.
//!
//! Access and refresh tokens are signed with independent secrets so that a
//! leaked access secret cannot mint refresh tokens (and vice versa). Access
//! tokens carry denormalized profile claims for downstream handlers; refresh
//! tokens carry only the subject id plus the rotation identifier (`jti`)
//! that the store binds server-side.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::User;

/// Why a presented token was rejected. Callers decide whether the failure
/// means "re-login" (expiry) or "reject outright" (tampering, garbage).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token malformed")]
    Malformed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    /// Rotation identifier, compared against the user record's stored id.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly minted refresh token together with the identifier the store
/// must record to honor it later.
#[derive(Debug)]
pub struct MintedRefreshToken {
    pub token: String,
    pub token_id: String,
}

pub fn create_access_token(user: &User, secret: &str, ttl: Duration) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user.id.clone(),
        email: user.email.clone(),
        user_name: user.user_name.clone(),
        full_name: user.full_name.clone(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

pub fn create_refresh_token(
    user_id: &str,
    secret: &str,
    ttl: Duration,
) -> anyhow::Result<MintedRefreshToken> {
    let now = Utc::now();
    let token_id = Uuid::new_v4().to_string();
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        jti: token_id.clone(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(MintedRefreshToken { token, token_id })
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<AccessClaims, TokenError> {
    verify_token(token, secret)
}

pub fn verify_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, TokenError> {
    verify_token(token, secret)
}

fn verify_token<C: DeserializeOwned>(token: &str, secret: &str) -> Result<C, TokenError> {
    // Zero leeway: a token with TTL t is dead at exactly t past issuance.
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map_err(classify)?;
    Ok(token_data.claims)
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::ImmatureSignature => TokenError::SignatureInvalid,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "Jane Doe".into(),
            "jane@x.com".into(),
            "jane".into(),
            "hash".into(),
            "https://cdn.example/avatar.png".into(),
            None,
        )
    }

    #[test]
    fn access_token_round_trips_profile_claims() {
        let user = sample_user();
        let token = create_access_token(&user, "access-secret", Duration::minutes(15))
            .expect("create token");
        let claims = verify_access_token(&token, "access-secret").expect("verify token");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "jane@x.com");
        assert_eq!(claims.user_name, "jane");
        assert_eq!(claims.full_name, "Jane Doe");
    }

    #[test]
    fn refresh_token_carries_subject_and_rotation_id() {
        let minted =
            create_refresh_token("user-1", "refresh-secret", Duration::days(7)).expect("mint");
        let claims = verify_refresh_token(&minted.token, "refresh-secret").expect("verify");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.jti, minted.token_id);
    }

    #[test]
    fn secrets_are_scoped_per_kind() {
        let user = sample_user();
        let token =
            create_access_token(&user, "access-secret", Duration::minutes(15)).expect("create");
        let err = verify_access_token(&token, "refresh-secret").expect_err("wrong secret");
        assert_eq!(err, TokenError::SignatureInvalid);
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        let user = sample_user();
        let token =
            create_access_token(&user, "access-secret", Duration::seconds(-5)).expect("create");
        let err = verify_access_token(&token, "access-secret").expect_err("must be expired");
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn garbage_token_is_malformed() {
        let err = verify_access_token("definitely.not.a-jwt", "access-secret")
            .expect_err("must be rejected");
        assert_eq!(err, TokenError::Malformed);
    }
}
