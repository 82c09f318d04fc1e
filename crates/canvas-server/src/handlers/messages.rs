use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde_json::{Map, Value};

use crate::error::{ProxyError, Result};
use crate::state::{AppState, ANTHROPIC_VERSION};

/// `POST /api/messages`: forward the caller's body upstream with the
/// server's model name, relaying the upstream status and JSON verbatim.
pub async fn handler(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .filter(|key| !key.is_empty())
        .ok_or(ProxyError::MissingApiKey)?
        .to_string();

    let mut payload = parse_payload(&body)?;
    payload.insert("model".to_string(), Value::String(state.model.clone()));

    tracing::debug!(
        model = %state.model,
        messages = payload.get("messages").and_then(serde_json::Value::as_array).map(Vec::len),
        "Forwarding messages request"
    );

    let response = state
        .http
        .post(state.messages_url())
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&payload)
        .send()
        .await?;

    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let data: Value = serde_json::from_slice(&bytes)?;

    if status >= 400 {
        tracing::warn!(status, "Upstream returned an error status");
    }

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok(HttpResponse::build(status).json(data))
}

/// Any other method on the messages route.
pub async fn method_not_allowed() -> Result<HttpResponse> {
    Err(ProxyError::MethodNotAllowed)
}

/// An empty body forwards as `{}`; anything that is not a JSON object is
/// rejected.
fn parse_payload(body: &[u8]) -> Result<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ProxyError::InvalidRequestBody),
    }
}
