use axum::{
    RequestPartsExt,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use candor_core::CoreError;
use candor_types::api::Claims;

use crate::error::ApiError;
use crate::{AppState, run_blocking};

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.validate_nbf = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("rejected bearer token: {}", e);
            ApiError::Core(CoreError::Unauthenticated)
        })
}

/// Validate the bearer token and attach the acting `User` to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| ApiError::Core(CoreError::Unauthenticated))?;

    let claims = decode_token(&state.jwt_secret, bearer.token())?;
    let actor = run_blocking(&state, move |t| t.actor_by_email(&claims.sub)).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;

    #[test]
    fn token_round_trip_and_wrong_secret() {
        let token = create_token("s3cret", "a@example.com", chrono::Duration::minutes(5)).unwrap();
        assert_eq!(decode_token("s3cret", &token).unwrap().sub, "a@example.com");
        assert!(decode_token("other", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("s3cret", "a@example.com", chrono::Duration::minutes(-10)).unwrap();
        assert!(decode_token("s3cret", &token).is_err());
    }
}
