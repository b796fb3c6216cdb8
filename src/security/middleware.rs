use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use super::claims::{UserClaims, UserContext};

/// Validate the bearer token and inject a [`UserContext`] into the request.
///
/// With `security.jwt_required = false`, unauthenticated requests pass
/// through with no context attached; chat sends then fail the endpoint
/// precondition and admin routes stay closed.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = bearer else {
        if !state.config.security.jwt_required {
            return Ok(next.run(request).await);
        }
        return Err(StatusCode::UNAUTHORIZED);
    };

    let key = DecodingKey::from_secret(state.config.security.jwt_secret.as_bytes());
    match decode::<UserClaims>(token, &key, &Validation::default()) {
        Ok(token_data) => {
            let claims = token_data.claims;
            let context = UserContext {
                user_id: claims.sub.clone(),
                claims,
            };
            request.extensions_mut().insert(context);
            Ok(next.run(request).await)
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Reject callers whose verified claims lack the admin role.
pub fn require_admin(user: Option<&UserContext>) -> Result<(), StatusCode> {
    match user {
        Some(context) if context.claims.is_admin() => Ok(()),
        Some(_) => Err(StatusCode::FORBIDDEN),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(roles: &[&str]) -> UserContext {
        let claims = UserClaims {
            sub: "user-1".to_string(),
            name: None,
            roles: roles.iter().map(ToString::to_string).collect(),
            tenant: None,
            exp: 4_102_444_800,
        };
        UserContext {
            user_id: claims.sub.clone(),
            claims,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(Some(&context(&["admin"]))).is_ok());
        assert_eq!(
            require_admin(Some(&context(&["support"]))),
            Err(StatusCode::FORBIDDEN)
        );
        assert_eq!(require_admin(None), Err(StatusCode::UNAUTHORIZED));
    }
}
