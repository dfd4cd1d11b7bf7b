//! Credential extraction. Missing credentials are not rejected here; each
//! operation decides whether it needs one.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::domain::auth::BearerToken;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Token from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct HeaderBearer(pub Option<BearerToken>);

/// Token from the `accessToken` session cookie.
#[derive(Debug, Clone)]
pub struct CookieBearer(pub Option<BearerToken>);

impl<S> FromRequestParts<S> for HeaderBearer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(BearerToken::from_authorization);
        Ok(Self(token))
    }
}

impl<S> FromRequestParts<S> for CookieBearer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .and_then(|cookie| BearerToken::new(cookie.value()));
        Ok(Self(token))
    }
}
