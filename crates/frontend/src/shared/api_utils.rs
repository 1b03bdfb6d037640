//! API utilities for frontend-backend communication
//!
//! The relay backend serves this app, so every endpoint lives on the page
//! origin.

use contracts::usecases::common::{RemoteError, RemoteOperation};
use gloo_net::http::Request;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Get the base URL for API requests
///
/// # Returns
/// - Page origin like "http://192.168.1.20:3000"
/// - Empty string if window is not available (relative URLs are used then)
pub fn api_base() -> String {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return String::new(),
    };
    window.location().origin().unwrap_or_default()
}

/// Build a full API URL from a path
///
/// # Example
/// ```ignore
/// let url = api_url("/getMsegData");
/// ```
pub fn api_url(path: &str) -> String {
    format!("{}{}", api_base(), path)
}

/// POST a JSON body and decode the JSON answer.
///
/// A 2xx answer carries the documented `{success, error, ...}` shape and is
/// decoded as is. Any other status comes from the relay itself (bad request,
/// gateway unreachable), never from SAP, and is reported as a network error
/// with the relay's message when the body has one.
pub async fn post_json<Req, Resp>(
    operation: RemoteOperation,
    path: &str,
    body: &Req,
) -> Result<Resp, RemoteError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let url = api_url(path);

    let response = Request::post(&url)
        .json(body)
        .map_err(|e| RemoteError::network(operation, format!("Failed to serialize request: {}", e)))?
        .send()
        .await
        .map_err(|e| RemoteError::network(operation, format!("Failed to send request: {}", e)))?;

    let status = response.status();
    let ok = response.ok();
    let text = response
        .text()
        .await
        .map_err(|e| RemoteError::network(operation, format!("Failed to read response: {}", e)))?;

    decode_response(operation, ok, status, &text)
}

/// Тело ошибки ретранслятора
#[derive(Deserialize)]
struct RelayFailure {
    #[serde(default)]
    error: Option<String>,
}

/// Decode a relay answer; see [`post_json`] for the status rules
pub fn decode_response<Resp: DeserializeOwned>(
    operation: RemoteOperation,
    ok: bool,
    status: u16,
    text: &str,
) -> Result<Resp, RemoteError> {
    if !ok {
        let message = serde_json::from_str::<RelayFailure>(text)
            .ok()
            .and_then(|failure| failure.error)
            .unwrap_or_else(|| format!("HTTP error: {}", status));
        return Err(RemoteError::network(operation, message));
    }

    serde_json::from_str::<Resp>(text).map_err(|e| {
        RemoteError::network(operation, format!("Failed to parse response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::usecases::common::ErrorOrigin;
    use contracts::usecases::u501_scan_goods_movement::FetchLineResponse;

    #[test]
    fn test_relay_failure_is_a_network_error() {
        let body = r#"{"success":false,"error":"Error de conexión con el gateway: timeout"}"#;
        let err = decode_response::<FetchLineResponse>(RemoteOperation::Fetch, false, 502, body)
            .unwrap_err();
        assert_eq!(err.origin, ErrorOrigin::Network);
        assert!(err.is_network());
        assert_eq!(err.message, "Error de conexión con el gateway: timeout");
    }

    #[test]
    fn test_non_json_failure_reports_status() {
        let err = decode_response::<FetchLineResponse>(RemoteOperation::Save, false, 404, "Not Found")
            .unwrap_err();
        assert_eq!(err.origin, ErrorOrigin::Network);
        assert_eq!(err.message, "HTTP error: 404");
    }

    #[test]
    fn test_ok_body_keeps_sap_failure() {
        let body = r#"{"success":false,"error":"Material bloqueado"}"#;
        let response =
            decode_response::<FetchLineResponse>(RemoteOperation::Fetch, true, 200, body).unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.origin, ErrorOrigin::Backend);
    }
}
