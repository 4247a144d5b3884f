use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{decode_jwt, error::AuthError},
    error::Error,
    scope::Scope,
    state::SharedAppState,
};

pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// Resolves the caller's scope: a bearer token names a user. Without an
/// `Authorization` header the client is a guest keyed by its `x-guest-id`.
#[tracing::instrument(name = "[MIDDLEWARE] identity", skip_all, fields(scope))]
pub async fn identity_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION).cloned() else {
        if !app_state.config.application.allow_guest {
            return Err(Error::Auth(AuthError::GuestNotAllowed));
        }

        let scope = req
            .headers()
            .get(GUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Scope::device)
            .ok_or(AuthError::InvalidGuestId)?;

        tracing::Span::current().record("scope", tracing::field::display(&scope));
        req.extensions_mut().insert(scope);
        return Ok(next.run(req).await);
    };
    let auth_header = auth_header
        .to_str()
        .map_err(|_| AuthError::Unauthenticated)?;

    let mut header = auth_header.split_whitespace();
    let (bearer_option, token_option) = (header.next(), header.next());

    let bearer = match bearer_option {
        Some(value) => value.to_lowercase(),
        None => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
    };

    if bearer != *"bearer" {
        return Err(Error::Auth(AuthError::Unauthenticated));
    }

    let token = match token_option {
        Some(value) => value,
        None => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
    };

    let token_data = decode_jwt(token, &app_state.config.jwt)?;

    let scope = Scope::from_identity(Some(&token_data.claims.sub));
    if scope.is_guest() {
        return Err(Error::Auth(AuthError::Unauthenticated));
    }

    tracing::Span::current().record("scope", tracing::field::display(&scope));
    req.extensions_mut().insert(scope);

    Ok(next.run(req).await)
}
