//! Account maintenance endpoints for the authenticated user.

use axum::{
    extract::{Extension, Multipart, State},
    response::IntoResponse,
    Json,
};

use crate::{
    error::AuthError,
    handlers::auth::read_file,
    middleware::AuthenticatedUser,
    models::{api::ApiResponse, user::UpdateAccountRequest},
    state::AppState,
};

pub async fn current_user(
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(ApiResponse::new(
        200,
        crate::models::user::UserResponse::from(user),
        "Current user fetched successfully",
    )))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let updated = state.sessions.update_account(&user.id, payload).await?;
    Ok(Json(ApiResponse::new(
        200,
        updated,
        "Account details updated",
    )))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AuthError> {
    let asset = single_file(multipart, "avatar").await?;
    let updated = state.sessions.update_avatar(&user.id, asset).await?;
    Ok(Json(ApiResponse::new(200, updated, "Avatar updated")))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AuthError> {
    let asset = single_file(multipart, "coverImage").await?;
    let updated = state.sessions.update_cover_image(&user.id, asset).await?;
    Ok(Json(ApiResponse::new(200, updated, "Cover image updated")))
}

async fn single_file(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<crate::services::assets::TempAsset, AuthError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AuthError::Validation(vec![format!("multipart: {}", e)]))?
    {
        if field.name() == Some(field_name) {
            return read_file(field).await;
        }
    }
    Err(AuthError::Validation(vec![format!(
        "{}: file is required",
        field_name
    )]))
}
