use crate::{
    audit::log_audit,
    db::DbPool,
    dto::profile::{ProfileDto, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, UserKind},
    models::{Consumer, Market},
    response::{ApiResponse, Meta},
    services::auth_service::hash_password,
};

async fn fetch_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ProfileDto> {
    let dto = match user.kind {
        UserKind::Market => {
            let market: Option<Market> = sqlx::query_as("SELECT * FROM markets WHERE id = $1")
                .bind(user.user_id)
                .fetch_optional(pool)
                .await?;
            market.map(|m| ProfileDto {
                id: m.id,
                kind: UserKind::Market,
                email: m.email,
                name: m.name,
                city: m.city,
                district: m.district,
                created_at: m.created_at,
            })
        }
        UserKind::Consumer => {
            let consumer: Option<Consumer> = sqlx::query_as("SELECT * FROM consumers WHERE id = $1")
                .bind(user.user_id)
                .fetch_optional(pool)
                .await?;
            consumer.map(|c| ProfileDto {
                id: c.id,
                kind: UserKind::Consumer,
                email: c.email,
                name: c.fullname,
                city: c.city,
                district: c.district,
                created_at: c.created_at,
            })
        }
    };

    dto.ok_or(AppError::NotFound)
}

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<ProfileDto>> {
    let profile = fetch_profile(pool, user).await?;
    Ok(ApiResponse::success("OK", profile, None))
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<ProfileDto>> {
    for (value, message) in [
        (&payload.name, "Name cannot be empty"),
        (&payload.city, "City cannot be empty"),
        (&payload.district, "District cannot be empty"),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(AppError::BadRequest(message.to_string()));
        }
    }

    if payload
        .password
        .as_deref()
        .is_some_and(|p| p.len() < 6)
    {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let current = fetch_profile(pool, user).await?;

    let name = payload.name.unwrap_or(current.name);
    let city = payload.city.unwrap_or(current.city);
    let district = payload.district.unwrap_or(current.district);
    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    match user.kind {
        UserKind::Market => sqlx::query(
            r#"
            UPDATE markets
            SET name = $2, city = $3, district = $4,
                password_hash = COALESCE($5, password_hash)
            WHERE id = $1
            "#,
        ),
        UserKind::Consumer => sqlx::query(
            r#"
            UPDATE consumers
            SET fullname = $2, city = $3, district = $4,
                password_hash = COALESCE($5, password_hash)
            WHERE id = $1
            "#,
        ),
    }
    .bind(user.user_id)
    .bind(name.trim())
    .bind(city.trim())
    .bind(district.trim())
    .bind(password_hash)
    .execute(pool)
    .await?;

    log_audit(
        pool,
        Some(user.user_id),
        "profile_update",
        Some(user.kind.as_str()),
        None,
    )
    .await;

    let profile = fetch_profile(pool, user).await?;
    Ok(ApiResponse::success(
        "Profile updated",
        profile,
        Some(Meta::empty()),
    ))
}
