//! HTTP adapters for the session lifecycle: register, login, refresh,
//! logout, change-password. Handlers stay thin; the session manager owns
//! the semantics.

use axum::{
    extract::{Extension, Multipart, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use std::time::Duration;

use crate::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        api::ApiResponse,
        user::{ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterInput, SessionResponse},
    },
    services::{assets::TempAsset, session::IssuedSession},
    state::AppState,
    utils::cookies::{
        build_auth_cookie, build_clear_cookie, extract_cookie_value, ACCESS_COOKIE_NAME,
        REFRESH_COOKIE_NAME,
    },
};

/// Multipart form: text fields + required `avatar` file + optional
/// `coverImage` file.
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AuthError> {
    let (input, avatar, cover_image) = parse_register_form(multipart).await?;
    let avatar = avatar.ok_or_else(|| {
        AuthError::Validation(vec!["avatar: file is required".to_string()])
    })?;

    let user = state.sessions.register(input, avatar, cover_image).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(201, user, "User registered successfully")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let session = state.sessions.login(payload).await?;
    Ok(session_response(&state, session, "User logged in successfully"))
}

/// Refresh token comes from the `refreshToken` cookie or the request body;
/// an empty body is fine when the cookie is present.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, AuthError> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, REFRESH_COOKIE_NAME));
    let from_body = serde_json::from_slice::<RefreshRequest>(&body)
        .ok()
        .and_then(|payload| payload.refresh_token);

    let presented = from_cookie
        .or(from_body)
        .ok_or_else(|| AuthError::Unauthorized("Unauthorized request".to_string()))?;

    let session = state.sessions.refresh(&presented).await?;
    Ok(session_response(&state, session, "Access token refreshed"))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AuthError> {
    state.sessions.logout(&user.id).await?;

    let options = state.cookie_options();
    let headers = AppendHeaders([
        set_cookie(build_clear_cookie(ACCESS_COOKIE_NAME, options)),
        set_cookie(build_clear_cookie(REFRESH_COOKIE_NAME, options)),
    ]);
    Ok((
        StatusCode::OK,
        headers,
        Json(ApiResponse::new(200, serde_json::json!({}), "User logged out")),
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state.sessions.change_password(&user.id, payload).await?;
    Ok(Json(ApiResponse::new(
        200,
        serde_json::json!({}),
        "Password changed successfully",
    )))
}

/// Tokens go out twice: as cookies for browsers and in the body for
/// non-cookie clients.
fn session_response(
    state: &AppState,
    session: IssuedSession,
    message: &str,
) -> impl IntoResponse {
    let options = state.cookie_options();
    let access_max_age =
        Duration::from_secs((state.config.access_token_ttl_minutes * 60).max(0) as u64);
    let refresh_max_age =
        Duration::from_secs((state.config.refresh_token_ttl_days * 24 * 3600).max(0) as u64);

    let headers = AppendHeaders([
        set_cookie(build_auth_cookie(
            ACCESS_COOKIE_NAME,
            &session.access_token,
            access_max_age,
            options,
        )),
        set_cookie(build_auth_cookie(
            REFRESH_COOKIE_NAME,
            &session.refresh_token,
            refresh_max_age,
            options,
        )),
    ]);

    let body = SessionResponse {
        user: session.user,
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    };
    (
        StatusCode::OK,
        headers,
        Json(ApiResponse::new(200, body, message)),
    )
}

fn set_cookie(value: String) -> (HeaderName, String) {
    (header::SET_COOKIE, value)
}

async fn parse_register_form(
    mut multipart: Multipart,
) -> Result<(RegisterInput, Option<TempAsset>, Option<TempAsset>), AuthError> {
    let mut full_name = String::new();
    let mut email = String::new();
    let mut user_name = String::new();
    let mut password = String::new();
    let mut avatar = None;
    let mut cover_image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AuthError::Validation(vec![format!("multipart: {}", e)]))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "fullName" => full_name = read_text(field).await?,
            "email" => email = read_text(field).await?,
            "userName" => user_name = read_text(field).await?,
            "password" => password = read_text(field).await?,
            "avatar" => avatar = Some(read_file(field).await?),
            "coverImage" => cover_image = Some(read_file(field).await?),
            // Unknown fields are ignored rather than rejected.
            _ => {}
        }
    }

    Ok((
        RegisterInput {
            full_name,
            email,
            user_name,
            password,
        },
        avatar,
        cover_image,
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AuthError> {
    field
        .text()
        .await
        .map_err(|e| AuthError::Validation(vec![format!("multipart: {}", e)]))
}

pub(crate) async fn read_file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<TempAsset, AuthError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AuthError::Validation(vec![format!("multipart: {}", e)]))?;
    if bytes.is_empty() {
        return Err(AuthError::Validation(vec![format!(
            "{}: file is empty",
            file_name
        )]));
    }
    TempAsset::from_bytes(&file_name, &bytes).map_err(AuthError::Internal)
}
