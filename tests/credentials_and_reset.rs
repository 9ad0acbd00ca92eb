use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::Set;
use serde_json::json;

use rbac_server::{
    auth::bootstrap::seed_admin,
    db::dao::DaoBase,
    error::AppError,
    services::{
        ServiceContext,
        password_reset_service::ResetMode,
        user_service::{NewUser, UserChanges},
    },
    state::AppState,
    test_helpers::{ADMIN_EMAIL, ADMIN_PASSWORD, memory_db, test_state},
};

async fn setup() -> (Arc<AppState>, ServiceContext) {
    let state = test_state(memory_db().await, json!({}));
    let services = ServiceContext::from_state(&state);
    (state, services)
}

fn alice() -> NewUser {
    NewUser {
        name: "Alice".to_string(),
        email: "Alice@X.com".to_string(),
        password: Some("secret1".to_string()),
        image: None,
        status: true,
        role_id: None,
    }
}

#[tokio::test]
async fn register_then_login_normalizes_email() {
    let (state, services) = setup().await;
    let auth = services.auth(&state.jwt, &state.auth);

    let details = auth.register(alice()).await.expect("register should succeed");
    assert_eq!(details.user.email, "alice@x.com");
    assert!(details.role.role_id.is_none());

    let session = auth
        .login("ALICE@x.com", "secret1")
        .await
        .expect("login should succeed");
    assert_eq!(session.tokens.token_type, "Bearer");
    let claims = auth
        .verify(&session.tokens.access_token)
        .expect("access token should verify");
    assert_eq!(claims.sub, details.user.id.to_string());

    let err = auth
        .login("alice@x.com", "wrong-password")
        .await
        .expect_err("bad password should fail");
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn email_is_unique_ignoring_case() {
    let (state, services) = setup().await;
    let auth = services.auth(&state.jwt, &state.auth);
    auth.register(alice()).await.expect("first register should succeed");

    let mut again = alice();
    again.email = "alice@x.COM".to_string();
    let err = auth.register(again).await.expect_err("duplicate should fail");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn otp_reset_is_single_use() {
    let (state, services) = setup().await;
    let auth = services.auth(&state.jwt, &state.auth);
    auth.register(alice()).await.expect("register should succeed");
    let resets = services.password_reset();

    let issued = resets
        .issue("alice@x.com", ResetMode::Otp, None)
        .await
        .expect("issue should succeed");
    assert_eq!(issued.token.len(), 6);
    assert!(issued.reset_link.contains("token="));

    let row = resets.verify(&issued.token).await.expect("token should verify");
    assert_eq!(row.email, "alice@x.com");

    resets
        .consume("alice@x.com", "newpass1")
        .await
        .expect("reset should succeed");

    auth.login("alice@x.com", "newpass1")
        .await
        .expect("new password should work");
    assert!(auth.login("alice@x.com", "secret1").await.is_err());
    assert!(matches!(
        resets.verify(&issued.token).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn reissuing_invalidates_the_previous_token() {
    let (state, services) = setup().await;
    services
        .auth(&state.jwt, &state.auth)
        .register(alice())
        .await
        .expect("register should succeed");
    let resets = services.password_reset();

    let first = resets
        .issue("alice@x.com", ResetMode::Url, Some("https://app.test/reset".to_string()))
        .await
        .expect("issue should succeed");
    assert_eq!(first.token.len(), 64);
    assert!(first.reset_link.starts_with("https://app.test/reset?token="));

    let second = resets
        .issue("alice@x.com", ResetMode::Otp, None)
        .await
        .expect("second issue should succeed");

    assert!(resets.verify(&first.token).await.is_err());
    resets.verify(&second.token).await.expect("latest token should verify");
}

#[tokio::test]
async fn reset_token_lives_ten_minutes_then_expires() {
    let (state, services) = setup().await;
    services
        .auth(&state.jwt, &state.auth)
        .register(alice())
        .await
        .expect("register should succeed");
    let resets = services.password_reset();

    let issued = resets
        .issue("alice@x.com", ResetMode::Otp, None)
        .await
        .expect("issue should succeed");
    let remaining = (issued.expires_at - Utc::now().fixed_offset()).num_seconds();
    assert!((590..=600).contains(&remaining), "unexpected lifetime: {remaining}s");

    let row = services
        .daos()
        .password_reset()
        .find_by_token(&issued.token)
        .await
        .expect("lookup should succeed")
        .expect("token row should exist");
    let past = (Utc::now() - Duration::seconds(1)).fixed_offset();
    services
        .daos()
        .password_reset()
        .update(row.id, move |active| active.expires_at = Set(past))
        .await
        .expect("expiry should update");

    match resets.verify(&issued.token).await {
        Err(AppError::BadRequest(message)) => assert_eq!(message, "Token expired"),
        other => panic!("expected an expired token, got {other:?}"),
    }
    match resets.verify("000000-unknown").await {
        Err(AppError::BadRequest(message)) => assert_eq!(message, "Invalid token"),
        other => panic!("expected an invalid token, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_for_unknown_email_is_not_found() {
    let (_state, services) = setup().await;
    let err = services
        .password_reset()
        .issue("nobody@x.com", ResetMode::Otp, None)
        .await
        .expect_err("unknown email should fail");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn refresh_rotates_and_logout_revokes() {
    let (state, services) = setup().await;
    let auth = services.auth(&state.jwt, &state.auth);
    let details = auth.register(alice()).await.expect("register should succeed");
    let session = auth
        .login("alice@x.com", "secret1")
        .await
        .expect("login should succeed");

    let rotated = auth
        .refresh(&session.tokens.refresh_token)
        .await
        .expect("refresh should succeed");
    assert_ne!(rotated.tokens.refresh_token, session.tokens.refresh_token);
    assert!(auth.refresh(&session.tokens.refresh_token).await.is_err());

    auth.logout(details.user.id).await.expect("logout should succeed");
    assert!(matches!(
        auth.refresh(&rotated.tokens.refresh_token).await,
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn admin_seed_is_idempotent_and_manages_everything() {
    let (state, services) = setup().await;
    seed_admin(&services, &state.auth).await.expect("first seed should succeed");
    seed_admin(&services, &state.auth).await.expect("second seed should be a no-op");

    let session = services
        .auth(&state.jwt, &state.auth)
        .login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("admin should log in");
    assert_eq!(session.user.role.is_manage_all, Some(true));
    let admin = services
        .user()
        .find_live(session.user.user.id)
        .await
        .expect("admin should be live");
    services
        .access()
        .check(&admin, "Role", "delete")
        .await
        .expect("admin should pass every check");
}

#[tokio::test]
async fn admin_password_change_ends_open_sessions() {
    let (state, services) = setup().await;
    let auth = services.auth(&state.jwt, &state.auth);
    let details = auth.register(alice()).await.expect("register should succeed");
    let session = auth
        .login("alice@x.com", "secret1")
        .await
        .expect("login should succeed");

    services
        .user()
        .update(
            details.user.id,
            UserChanges {
                password: Some("changed1".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("update should succeed");

    assert!(matches!(
        auth.refresh(&session.tokens.refresh_token).await,
        Err(AppError::Unauthorized(_))
    ));
    auth.login("alice@x.com", "changed1")
        .await
        .expect("new password should work");
}

#[tokio::test]
async fn disabling_an_account_drops_its_refresh_token() {
    let (state, services) = setup().await;
    let auth = services.auth(&state.jwt, &state.auth);
    let details = auth.register(alice()).await.expect("register should succeed");
    auth.login("alice@x.com", "secret1")
        .await
        .expect("login should succeed");
    let before = services
        .user()
        .find_live(details.user.id)
        .await
        .expect("user should be live");
    assert!(before.refresh_token_hash.is_some());

    services
        .user()
        .update(
            details.user.id,
            UserChanges {
                name: Some("Alice Renamed".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("rename should succeed");
    let renamed = services
        .user()
        .find_live(details.user.id)
        .await
        .expect("user should be live");
    assert!(renamed.refresh_token_hash.is_some());

    services
        .user()
        .update(
            details.user.id,
            UserChanges {
                status: Some(false),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("disable should succeed");
    let disabled = services
        .user()
        .find_live(details.user.id)
        .await
        .expect("disabled user is still live");
    assert!(!disabled.status);
    assert!(disabled.refresh_token_hash.is_none());
    assert!(disabled.refresh_expires_at.is_none());
}
