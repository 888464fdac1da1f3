use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{error, info};

use candor_core::users::validate_password;
use candor_types::api::{Claims, LoginForm, RegisterRequest, TokenResponse};

use crate::error::ApiError;
use crate::extract::{ApiForm, ApiJson};
use crate::{AppState, run_blocking};

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("password hashing failed: {}", e);
            ApiError::Internal
        })
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

pub fn create_token(secret: &str, email: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: email.to_string(),
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
        nbf: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.password)?;
    let hashed = hash_password(&req.password)?;

    let user = run_blocking(&state, move |t| t.register(&req, &hashed)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// OAuth2 password flow: `username` is the account email.
pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = run_blocking(&state, move |t| {
        let row = t.db().get_user_by_email(&form.username)?;
        Ok(row.filter(|row| verify_password(&row.hashed_password, &form.password)))
    })
    .await?
    .ok_or(ApiError::BadCredentials)?;

    let access_token = create_token(&state.jwt_secret, &user.email, state.token_ttl).map_err(|e| {
        error!("token encoding failed: {:#}", e);
        ApiError::Internal
    })?;

    info!(user = user.id, "login succeeded");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
        assert!(!verify_password("not a hash", "correct horse"));
    }

    #[test]
    fn token_carries_subject_and_window() {
        let token = create_token("secret", "a@example.com", chrono::Duration::minutes(60)).unwrap();
        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(b"secret"),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "a@example.com");
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
        assert_eq!(data.claims.nbf, data.claims.iat);
    }
}
