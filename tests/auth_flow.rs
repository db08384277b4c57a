use std::sync::Arc;

use eco_market_api::{
    db::create_pool,
    dto::auth::{LoginRequest, RegisterRequest, TokenLoginRequest, VerifyRequest},
    error::AppError,
    middleware::auth::{AuthUser, UserKind},
    notify::LogNotifier,
    services::auth_service,
    state::AppState,
};
use uuid::Uuid;

// Integration flow: register -> verify -> login with remember -> exchange the
// remember token -> logout invalidates it.
#[tokio::test]
async fn register_verify_login_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    if std::env::var("JWT_SECRET").is_err() {
        unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
    }

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let state = AppState {
        pool: pool.clone(),
        notifier: Arc::new(LogNotifier),
    };

    let email = format!("auth-{}@example.com", Uuid::new_v4().simple());

    let register = |email: &str, password: &str, confirm: &str| RegisterRequest {
        kind: UserKind::Consumer,
        email: email.to_string(),
        name: "Auth Flow Buyer".to_string(),
        city: "Istanbul".to_string(),
        district: "Kadikoy".to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
    };

    let err = auth_service::register(&state, register(&email, "secret1", "secret2"))
        .await
        .expect_err("mismatched passwords must be rejected");
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Passwords do not match"));

    let resp = auth_service::register(&state, register(&email, "secret1", "secret1")).await?;
    assert!(resp.success);
    assert_eq!(resp.message, "Verification code sent");

    let err = auth_service::register(&state, register(&email, "secret1", "secret1"))
        .await
        .expect_err("duplicate email must be rejected");
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Email already exists"));

    // Unverified accounts cannot log in.
    let err = auth_service::login(
        &state,
        LoginRequest {
            kind: UserKind::Consumer,
            email: email.clone(),
            password: "secret1".to_string(),
            remember: false,
        },
    )
    .await
    .expect_err("unverified login must fail");
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid email or password"));

    let (user_id, code): (Uuid, Option<String>) =
        sqlx::query_as("SELECT id, verification_code FROM consumers WHERE email = $1")
            .bind(email.as_str())
            .fetch_one(&pool)
            .await?;
    let code = code.expect("pending account keeps its verification code");

    let wrong = if code == "000000" { "000001" } else { "000000" };
    let err = auth_service::verify(
        &state,
        VerifyRequest {
            kind: UserKind::Consumer,
            email: email.clone(),
            code: wrong.to_string(),
        },
    )
    .await
    .expect_err("wrong code must be rejected");
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid verification code"));

    let resp = auth_service::verify(
        &state,
        VerifyRequest {
            kind: UserKind::Consumer,
            email: email.clone(),
            code,
        },
    )
    .await?;
    assert!(resp.success);

    let resp = auth_service::login(
        &state,
        LoginRequest {
            kind: UserKind::Consumer,
            email: email.clone(),
            password: "secret1".to_string(),
            remember: true,
        },
    )
    .await?;
    let login = resp.data.unwrap();
    assert!(login.token.starts_with("Bearer "));
    let remember_token = login.remember_token.expect("remember token issued");

    // A market cannot use a consumer's remember token.
    let err = auth_service::token_login(
        &state,
        TokenLoginRequest {
            kind: UserKind::Market,
            token: remember_token.clone(),
        },
    )
    .await
    .expect_err("token is bound to its account kind");
    assert!(matches!(err, AppError::Unauthorized));

    let resp = auth_service::token_login(
        &state,
        TokenLoginRequest {
            kind: UserKind::Consumer,
            token: remember_token.clone(),
        },
    )
    .await?;
    assert!(resp.data.unwrap().token.starts_with("Bearer "));

    auth_service::logout(
        &state,
        &AuthUser {
            user_id,
            kind: UserKind::Consumer,
        },
    )
    .await?;

    let err = auth_service::token_login(
        &state,
        TokenLoginRequest {
            kind: UserKind::Consumer,
            token: remember_token,
        },
    )
    .await
    .expect_err("logout must invalidate the remember token");
    assert!(matches!(err, AppError::Unauthorized));

    Ok(())
}
