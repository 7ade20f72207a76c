//! Request authenticator: turns a bearer/cookie token into a caller
//! identity for downstream handlers.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AuthError,
    models::user::User,
    state::AppState,
    utils::{
        cookies::{extract_cookie_value, ACCESS_COOKIE_NAME},
        jwt::verify_access_token,
    },
};

/// The resolved caller, attached to request extensions. Carries no password
/// hash and no refresh binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            user_name: user.user_name,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
        }
    }
}

impl From<AuthenticatedUser> for crate::models::user::UserResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            user_name: user.user_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| AuthError::Unauthorized("Unauthorized request".to_string()))?;

    // All verification failures collapse to 401; the kind is logged only.
    let claims =
        verify_access_token(&token, &state.config.access_token_secret).map_err(|e| {
            tracing::debug!(reason = %e, "access token rejected");
            AuthError::Unauthorized("Invalid access token".to_string())
        })?;

    // A still-valid token for a deleted account must not authenticate.
    let user = state
        .store
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AuthError::Unauthorized("Invalid access token".to_string()))?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(user));
    Ok(next.run(request).await)
}

/// Cookie takes precedence over the Authorization header.
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, ACCESS_COOKIE_NAME));
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .map(str::to_string)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("BEARER  abc"), Some("abc"));
        assert_eq!(parse_bearer_token("Basic abc"), None);
        assert_eq!(parse_bearer_token("Bearer"), None);
    }

    #[test]
    fn cookie_wins_over_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("accessToken=from-cookie"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn header_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
        assert!(extract_token(&HeaderMap::new()).is_none());
    }
}
