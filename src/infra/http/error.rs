use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::error::{ErrorReport, ProxyError};
use crate::application::gateway::GatewayError;
use crate::domain::envelope::{Envelope, Messages};

const SOURCE: &str = "infra::http::proxy_error";

#[derive(Debug, Serialize)]
struct ValidationBody<'a> {
    error: &'a str,
}

#[derive(Debug, Serialize)]
struct UnauthorizedBody {
    messages: Messages,
    status_code: u16,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = match &self {
            ProxyError::Validation(message) => {
                (status, Json(ValidationBody { error: message })).into_response()
            }
            ProxyError::Unauthorized => (
                status,
                Json(UnauthorizedBody {
                    messages: Messages::Unauthorized,
                    status_code: status.as_u16(),
                }),
            )
                .into_response(),
            ProxyError::Upstream { message, .. } => failure(status, Messages::Error, message),
            ProxyError::Gateway(GatewayError::Timeout(_)) => {
                failure(status, Messages::Error, &self.to_string())
            }
            ProxyError::Gateway(_) | ProxyError::Internal(_) => {
                failure(status, Messages::ServerError, &self.to_string())
            }
        };

        ErrorReport::from_error(SOURCE, status, &self).attach(&mut response);
        response
    }
}

fn failure(status: StatusCode, messages: Messages, error: &str) -> Response {
    let envelope = Envelope::<()>::failure(messages, status.as_u16(), error);
    (status, Json(envelope)).into_response()
}
