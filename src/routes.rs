//! Route table. Public routes carry no middleware; everything else goes
//! through the request authenticator.

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::require_auth, state::AppState};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/users/register", post(handlers::auth::register))
        .route("/api/v1/users/login", post(handlers::auth::login))
        .route("/api/v1/users/refresh-token", post(handlers::auth::refresh));

    let protected_routes = Router::new()
        .route("/api/v1/users/logout", post(handlers::auth::logout))
        .route(
            "/api/v1/users/change-password",
            post(handlers::auth::change_password),
        )
        .route(
            "/api/v1/users/current-user",
            get(handlers::users::current_user),
        )
        .route(
            "/api/v1/users/update-account",
            patch(handlers::users::update_account),
        )
        .route("/api/v1/users/avatar", patch(handlers::users::update_avatar))
        .route(
            "/api/v1/users/cover-image",
            patch(handlers::users::update_cover_image),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
