use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        LoginRequest, LoginResponse, RegisterRequest, RegisteredResponse, ResendCodeRequest,
        TokenLoginRequest, VerifyRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Claims, UserKind},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

fn generate_verification_code() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}

fn issue_jwt(user_id: Uuid, kind: UserKind) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        kind,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisteredResponse>> {
    let RegisterRequest {
        kind,
        email,
        name,
        city,
        district,
        password,
        confirm_password,
    } = payload;

    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest(
            "Valid email address is required".to_string(),
        ));
    }
    if name.trim().is_empty() {
        let message = match kind {
            UserKind::Market => "Market name is required",
            UserKind::Consumer => "Full name is required",
        };
        return Err(AppError::BadRequest(message.to_string()));
    }
    if city.trim().is_empty() {
        return Err(AppError::BadRequest("City is required".to_string()));
    }
    if district.trim().is_empty() {
        return Err(AppError::BadRequest("District is required".to_string()));
    }
    if password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if password != confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    let exists: Option<(Uuid,)> = match kind {
        UserKind::Market => sqlx::query_as("SELECT id FROM markets WHERE email = $1"),
        UserKind::Consumer => sqlx::query_as("SELECT id FROM consumers WHERE email = $1"),
    }
    .bind(email.as_str())
    .fetch_optional(&state.pool)
    .await?;

    if exists.is_some() {
        return Err(AppError::BadRequest("Email already exists".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let code = generate_verification_code();
    let id = Uuid::new_v4();

    match kind {
        UserKind::Market => sqlx::query(
            r#"
            INSERT INTO markets (id, email, name, password_hash, city, district, verification_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        ),
        UserKind::Consumer => sqlx::query(
            r#"
            INSERT INTO consumers (id, email, fullname, password_hash, city, district, verification_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        ),
    }
    .bind(id)
    .bind(email.as_str())
    .bind(name.trim())
    .bind(password_hash)
    .bind(city.trim())
    .bind(district.trim())
    .bind(code.as_str())
    .execute(&state.pool)
    .await?;

    state.notifier.send_verification_code(&email, &code);

    log_audit(
        &state.pool,
        Some(id),
        "register",
        Some(kind.as_str()),
        Some(serde_json::json!({ "email": email.as_str() })),
    )
    .await;

    Ok(ApiResponse::success(
        "Verification code sent",
        RegisteredResponse { email, kind },
        Some(Meta::empty()),
    ))
}

pub async fn verify(
    state: &AppState,
    payload: VerifyRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let VerifyRequest { kind, email, code } = payload;

    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "Invalid verification code format".to_string(),
        ));
    }

    let result = match kind {
        UserKind::Market => sqlx::query(
            "UPDATE markets SET verified = TRUE, verification_code = NULL WHERE email = $1 AND verification_code = $2",
        ),
        UserKind::Consumer => sqlx::query(
            "UPDATE consumers SET verified = TRUE, verification_code = NULL WHERE email = $1 AND verification_code = $2",
        ),
    }
    .bind(email.as_str())
    .bind(code.as_str())
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "Invalid verification code".to_string(),
        ));
    }

    Ok(ApiResponse::success(
        "Account verified",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn resend_code(
    state: &AppState,
    payload: ResendCodeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let ResendCodeRequest { kind, email } = payload;
    let code = generate_verification_code();

    let result = match kind {
        UserKind::Market => {
            sqlx::query("UPDATE markets SET verification_code = $2 WHERE email = $1 AND verified = FALSE")
        }
        UserKind::Consumer => {
            sqlx::query("UPDATE consumers SET verification_code = $2 WHERE email = $1 AND verified = FALSE")
        }
    }
    .bind(email.as_str())
    .bind(code.as_str())
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    state.notifier.send_verification_code(&email, &code);

    Ok(ApiResponse::success(
        "A new verification code has been sent to your email",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest {
        kind,
        email,
        password,
        remember,
    } = payload;

    // Only verified accounts can log in; unknown email, unverified account
    // and wrong password all answer the same way.
    let account: Option<(Uuid, String)> = match kind {
        UserKind::Market => {
            sqlx::query_as("SELECT id, password_hash FROM markets WHERE email = $1 AND verified = TRUE")
        }
        UserKind::Consumer => {
            sqlx::query_as("SELECT id, password_hash FROM consumers WHERE email = $1 AND verified = TRUE")
        }
    }
    .bind(email.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let (user_id, password_hash) =
        account.ok_or_else(|| AppError::BadRequest("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest(
            "Invalid email or password".to_string(),
        ));
    }

    let token = issue_jwt(user_id, kind)?;

    let remember_token = if remember {
        let value = Uuid::new_v4().simple().to_string();
        match kind {
            UserKind::Market => sqlx::query("UPDATE markets SET remember_token = $2 WHERE id = $1"),
            UserKind::Consumer => {
                sqlx::query("UPDATE consumers SET remember_token = $2 WHERE id = $1")
            }
        }
        .bind(user_id)
        .bind(value.as_str())
        .execute(&state.pool)
        .await?;
        Some(value)
    } else {
        None
    };

    log_audit(&state.pool, Some(user_id), "login", Some(kind.as_str()), None).await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {token}"),
            remember_token,
        },
        Some(Meta::empty()),
    ))
}

/// Exchange a persistent remember token for a fresh JWT.
pub async fn token_login(
    state: &AppState,
    payload: TokenLoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let TokenLoginRequest { kind, token } = payload;

    let account: Option<(Uuid,)> = match kind {
        UserKind::Market => sqlx::query_as("SELECT id FROM markets WHERE remember_token = $1"),
        UserKind::Consumer => sqlx::query_as("SELECT id FROM consumers WHERE remember_token = $1"),
    }
    .bind(token.as_str())
    .fetch_optional(&state.pool)
    .await?;

    let (user_id,) = account.ok_or(AppError::Unauthorized)?;
    let jwt = issue_jwt(user_id, kind)?;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {jwt}"),
            remember_token: Some(token),
        },
        Some(Meta::empty()),
    ))
}

/// Drop the remember token so the persistent login stops working.
pub async fn logout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    match user.kind {
        UserKind::Market => sqlx::query("UPDATE markets SET remember_token = NULL WHERE id = $1"),
        UserKind::Consumer => {
            sqlx::query("UPDATE consumers SET remember_token = NULL WHERE id = $1")
        }
    }
    .bind(user.user_id)
    .execute(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
