use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::auth::{
        Claims, CurrentUserData, ForgotPasswordRequest, LoginData, LoginOutcome, LoginRequest,
        ProfileData, ProfileSummary, RegisterData, RegisterRequest, TwoFactorChallenge,
        UpdateProfileRequest, UserSummary,
    },
    error::{AppError, AppResult, FieldErrors, FieldValidator, is_unique_violation},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    state::AppState,
    storage,
};

const SESSION_TTL_HOURS: i64 = 24;
const EMAIL_TOKEN_TTL_HOURS: i64 = 24;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Inserts a session row and returns the bearer token bound to it. The token
/// dies with the row, so each session is revocable on its own.
async fn open_session(pool: &DbPool, user_id: Uuid) -> AppResult<String> {
    let session_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

    sqlx::query("INSERT INTO sessions (session_id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(token)
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterData>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;
    let username = username.trim().to_string();
    let email = email.trim().to_string();

    let mut v = FieldValidator::new();
    let username_len = username.chars().count();
    if !(4..=50).contains(&username_len) {
        v.add("username", "The username must be between 4 and 50 characters.");
    }
    if email.len() > 255 || !is_valid_email(&email) {
        v.add("email", "The email must be a valid email address.");
    }
    if password.chars().count() < 8 {
        v.add("password", "The password must be at least 8 characters.");
    }

    let username_taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM users WHERE username = $1")
            .bind(&username)
            .fetch_optional(&state.pool)
            .await?;
    if username_taken.is_some() {
        v.add("username", "The username has already been taken.");
    }

    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    if email_taken.is_some() {
        v.add("email", "The email has already been taken.");
    }

    v.finish()?;

    let password_hash = hash_password(&password)?;
    let user_id = Uuid::new_v4();

    // The unique constraints back up the pre-checks; a concurrent duplicate
    // still comes back as a validation error, not a 500.
    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (user_id, username, email, password_hash, email_verified)
        VALUES ($1, $2, $3, $4, false)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            let mut errors = FieldErrors::new();
            errors
                .entry("email".into())
                .or_default()
                .push("The email or username has already been taken.".into());
            AppError::Validation(errors)
        } else {
            AppError::from(err)
        }
    })?;

    // Verification token is recorded for a future email flow; nothing consumes
    // it yet.
    sqlx::query(
        r#"
        INSERT INTO email_verification_tokens (token_id, user_id, token, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(random_token())
    .bind(Utc::now() + Duration::hours(EMAIL_TOKEN_TTL_HOURS))
    .execute(&state.pool)
    .await?;

    let access_token = open_session(&state.pool, user.user_id).await?;

    Ok(ApiResponse::success(
        "User registered successfully",
        RegisterData {
            user,
            access_token,
            token_type: "Bearer".to_string(),
        },
        None,
    ))
}

#[derive(FromRow)]
struct TfaRow {
    method: String,
    is_enabled: bool,
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<LoginOutcome> {
    let LoginRequest { email, password } = payload;

    let mut v = FieldValidator::new();
    if email.len() > 255 || !is_valid_email(&email) {
        v.add("email", "The email must be a valid email address.");
    }
    if password.chars().count() < 8 {
        v.add("password", "The password must be at least 8 characters.");
    }
    v.finish()?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) if verify_password(&password, &u.password_hash) => u,
        _ => return Err(AppError::Unauthorized("Invalid login credentials".into())),
    };

    let tfa: Option<TfaRow> =
        sqlx::query_as("SELECT method, is_enabled FROM two_factor_auth WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?;

    if let Some(tfa) = tfa {
        if tfa.is_enabled {
            // No token until the second factor clears. The completion endpoint
            // is deliberately absent; see DESIGN.md.
            return Ok(LoginOutcome::TwoFactorRequired(TwoFactorChallenge {
                user_id: user.user_id,
                tfa_method: tfa.method,
                requires_2fa: true,
            }));
        }
    }

    let access_token = open_session(&state.pool, user.user_id).await?;

    Ok(LoginOutcome::LoggedIn(LoginData {
        user: UserSummary {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
        },
        access_token,
        token_type: "Bearer".to_string(),
    }))
}

/// Revokes the presented token's session only; the user's other sessions
/// stay valid.
pub async fn logout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query("DELETE FROM sessions WHERE session_id = $1")
        .bind(user.session_id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::message_only("Logged out successfully"))
}

pub async fn current_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CurrentUserData>> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    match row {
        Some(user) => Ok(ApiResponse::success(
            "OK",
            CurrentUserData { user },
            None,
        )),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

pub async fn update_profile(
    state: &AppState,
    caller: &AuthUser,
    target_id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<ProfileData>> {
    if caller.user_id != target_id {
        tracing::warn!(
            user_id = %caller.user_id,
            requested_id = %target_id,
            "unauthorized profile update attempt"
        );
        return Err(AppError::Forbidden(
            "Not allowed to update another user's profile".into(),
        ));
    }

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = $1")
        .bind(target_id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound("User not found".into())),
    };

    let email = payload.email.trim().to_string();
    let username = payload.username.trim().to_string();

    let mut v = FieldValidator::new();
    if email.len() > 255 || !is_valid_email(&email) {
        v.add("email", "The email must be a valid email address.");
    }
    if username.chars().count() < 3 {
        v.add("username", "The username must be at least 3 characters.");
    }
    if let Some(pw) = payload.password.as_deref() {
        if pw.chars().count() < 8 {
            v.add("password", "The password must be at least 8 characters.");
        }
    }

    // Uniqueness excluding the user themselves.
    let email_taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM users WHERE email = $1 AND user_id <> $2")
            .bind(&email)
            .bind(target_id)
            .fetch_optional(&state.pool)
            .await?;
    if email_taken.is_some() {
        v.add("email", "The email has already been taken.");
    }
    let username_taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT user_id FROM users WHERE username = $1 AND user_id <> $2")
            .bind(&username)
            .bind(target_id)
            .fetch_optional(&state.pool)
            .await?;
    if username_taken.is_some() {
        v.add("username", "The username has already been taken.");
    }
    v.finish()?;

    // Changing the password needs the current one to match.
    let password_hash = match payload.password.as_deref() {
        Some(new_password) => {
            let mut v = FieldValidator::new();
            match payload.old_password.as_deref() {
                None | Some("") => {
                    v.add(
                        "old_password",
                        "The old password is required to change the password.",
                    );
                }
                Some(old) if !verify_password(old, &existing.password_hash) => {
                    v.add("old_password", "The old password is incorrect.");
                }
                Some(_) => {}
            }
            v.finish()?;
            hash_password(new_password)?
        }
        None => existing.password_hash.clone(),
    };

    let new_picture = payload
        .profile_picture
        .clone()
        .or_else(|| existing.profile_picture.clone());

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users
        SET email = $2, username = $3, password_hash = $4, profile_picture = $5,
            updated_at = now()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(target_id)
    .bind(&email)
    .bind(&username)
    .bind(&password_hash)
    .bind(&new_picture)
    .fetch_one(&state.pool)
    .await?;

    // Replaced picture file goes away after the row change sticks.
    if let (Some(new), Some(old)) = (
        payload.profile_picture.as_deref(),
        existing.profile_picture.as_deref(),
    ) {
        if new != old {
            storage::delete_stored_file(&state.config.storage_dir, old).await;
        }
    }

    tracing::info!(user_id = %updated.user_id, "profile updated");

    Ok(ApiResponse::success(
        "Profile updated successfully",
        ProfileData {
            user: ProfileSummary {
                user_id: updated.user_id,
                email: updated.email,
                username: updated.username,
                profile_picture: storage::profile_picture_url(
                    &state.config.app_url,
                    updated.profile_picture.as_deref(),
                ),
            },
        },
        None,
    ))
}

pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = payload.email.trim().to_string();

    let mut v = FieldValidator::new();
    if email.len() > 255 || !is_valid_email(&email) {
        v.add("email", "The email must be a valid email address.");
    }
    v.finish()?;

    let user: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    let (user_id,) = match user {
        Some(row) => row,
        None => {
            return Err(AppError::NotFound("User not found with this email".into()));
        }
    };

    // One active reset token per user.
    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (token_id, user_id, token, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(random_token())
    .bind(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS))
    .execute(&state.pool)
    .await?;

    // Dispatching the email is outside this service.
    Ok(ApiResponse::message_only(
        "Password reset link sent to your email",
    ))
}
