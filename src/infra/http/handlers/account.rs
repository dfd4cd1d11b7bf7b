//! Write endpoints. Both forward the upstream body unchanged and bypass the cache.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};

use crate::application::content::{ActivationRequest, Reply};
use crate::application::error::ProxyError;
use crate::application::gateway::UploadPart;
use crate::infra::http::auth::{CookieBearer, HeaderBearer};
use crate::infra::http::state::HttpState;

pub async fn activate_book(
    State(state): State<HttpState>,
    HeaderBearer(bearer): HeaderBearer,
    payload: Result<Json<ActivationRequest>, JsonRejection>,
) -> Result<Reply, ProxyError> {
    let Json(request) =
        payload.map_err(|rejection| ProxyError::validation(rejection.body_text()))?;
    state.content.activate(request, bearer).await
}

pub async fn upload_media(
    State(state): State<HttpState>,
    CookieBearer(token): CookieBearer,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply, ProxyError> {
    // Credentials are checked before the body is parsed or buffered.
    if token.is_none() {
        return Err(ProxyError::Unauthorized);
    }
    let mut multipart =
        multipart.map_err(|rejection| ProxyError::validation(rejection.body_text()))?;

    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ProxyError::validation(format!("invalid multipart payload: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| ProxyError::validation(format!("failed to read upload: {err}")))?;
        parts.push(UploadPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    state.content.upload(parts, token).await
}
