use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = ProxyError> = std::result::Result<T, E>;

/// Message shown for every local failure; details only go to the log.
pub const GENERIC_FAILURE: &str = "An error occurred while processing your request";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body must be a JSON object")]
    InvalidRequestBody,

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidUpstreamBody(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct JsonError<'a> {
    error: &'a str,
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingApiKey => StatusCode::UNAUTHORIZED,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) | ProxyError::InvalidUpstreamBody(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Proxy error");
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(JsonError { error: &message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn client_errors_carry_their_message() {
        let response = ProxyError::MissingApiKey.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"API key is required"}"#);
    }

    #[actix_web::test]
    async fn server_errors_hide_details() {
        let parse_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let response = ProxyError::InvalidUpstreamBody(parse_err).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], GENERIC_FAILURE);
    }
}
