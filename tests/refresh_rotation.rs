//! Rotation, reuse detection, and the concurrent-refresh race.

use std::sync::Arc;

use chrono::Duration;

use vidstream_backend::error::AuthError;
use vidstream_backend::models::user::{LoginRequest, RegisterInput};
use vidstream_backend::services::assets::StaticAssetStore;
use vidstream_backend::services::session::{SessionManager, TokenSettings};
use vidstream_backend::store::{MemoryUserStore, UserStore};
use vidstream_backend::utils::jwt::create_refresh_token;

const REFRESH_SECRET: &str = "refresh-secret";

fn settings() -> TokenSettings {
    TokenSettings {
        access_secret: "access-secret".into(),
        refresh_secret: REFRESH_SECRET.into(),
        access_ttl: Duration::minutes(15),
        refresh_ttl: Duration::days(7),
    }
}

async fn logged_in_session() -> (Arc<MemoryUserStore>, Arc<SessionManager>, String, String) {
    let store = Arc::new(MemoryUserStore::new());
    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        Arc::new(StaticAssetStore::new("https://cdn.test")),
        settings(),
    ));

    let avatar = vidstream_backend::services::assets::TempAsset::from_bytes("a.png", b"png")
        .expect("temp asset");
    sessions
        .register(
            RegisterInput {
                full_name: "Jane Doe".into(),
                email: "jane@x.com".into(),
                user_name: "jane".into(),
                password: "p@ss1234".into(),
            },
            avatar,
            None,
        )
        .await
        .expect("register");

    let session = sessions
        .login(LoginRequest {
            email: None,
            user_name: Some("jane".into()),
            password: "p@ss1234".into(),
        })
        .await
        .expect("login");

    (store, sessions, session.user.id, session.refresh_token)
}

#[tokio::test]
async fn refresh_rotates_exactly_once() {
    let (_, sessions, _, r0) = logged_in_session().await;

    let first = sessions.refresh(&r0).await.expect("first refresh");
    let r1 = first.refresh_token;

    // R0 was rotated out and is permanently dead.
    assert!(matches!(
        sessions.refresh(&r0).await,
        Err(AuthError::Unauthorized(_))
    ));

    // Reuse of R0 tore the session down, so even R1 is now rejected and the
    // caller must log in again.
    assert!(matches!(
        sessions.refresh(&r1).await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn fresh_token_keeps_working_when_no_reuse_happens() {
    let (_, sessions, _, r0) = logged_in_session().await;

    let r1 = sessions.refresh(&r0).await.expect("rotate").refresh_token;
    let r2 = sessions.refresh(&r1).await.expect("rotate again").refresh_token;
    assert_ne!(r1, r2);
}

#[tokio::test]
async fn reuse_detection_clears_the_stored_binding() {
    let (store, sessions, user_id, r0) = logged_in_session().await;

    sessions.refresh(&r0).await.expect("rotate");
    let _ = sessions.refresh(&r0).await.expect_err("reuse");

    let user = store.find_by_id(&user_id).await.unwrap().unwrap();
    assert!(
        user.refresh_token_id.is_none(),
        "reuse must force re-login by clearing the binding"
    );
}

#[tokio::test]
async fn logout_invalidates_an_unexpired_refresh_token() {
    let (_, sessions, user_id, r0) = logged_in_session().await;

    sessions.logout(&user_id).await.expect("logout");
    // Logging out twice is not an error.
    sessions.logout(&user_id).await.expect("logout is idempotent");

    assert!(matches!(
        sessions.refresh(&r0).await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_even_if_bound() {
    let (store, sessions, user_id, _) = logged_in_session().await;

    let expired = create_refresh_token(&user_id, REFRESH_SECRET, Duration::seconds(-5))
        .expect("mint expired token");
    store
        .set_refresh_token_id(&user_id, Some(&expired.token_id))
        .await
        .unwrap();

    assert!(matches!(
        sessions.refresh(&expired.token).await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn forged_refresh_token_is_rejected() {
    let (store, sessions, user_id, _) = logged_in_session().await;

    let forged = create_refresh_token(&user_id, "attacker-secret", Duration::days(7))
        .expect("mint forged token");
    store
        .set_refresh_token_id(&user_id, Some(&forged.token_id))
        .await
        .unwrap();

    assert!(matches!(
        sessions.refresh(&forged.token).await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn concurrent_refreshes_yield_exactly_one_winner() {
    let (_, sessions, _, r0) = logged_in_session().await;

    let a = tokio::spawn({
        let sessions = sessions.clone();
        let token = r0.clone();
        async move { sessions.refresh(&token).await }
    });
    let b = tokio::spawn({
        let sessions = sessions.clone();
        let token = r0.clone();
        async move { sessions.refresh(&token).await }
    });

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "the CAS admits exactly one rotation");

    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(AuthError::Unauthorized(_))));
}
