use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Ошибки ретранслятора
///
/// Every variant is answered with the `{success: false, error}` body the
/// browser expects from all endpoints.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Solicitud inválida: {0}")]
    BadRequest(String),

    #[error("Error de conexión con el gateway: {0}")]
    Transport(String),

    #[error("Respuesta inválida del gateway ({status}): {message}")]
    InvalidResponse { status: u16, message: String },

    #[error("Gateway no inicializado")]
    NotInitialized,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Transport(_) | RelayError::InvalidResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RelayError::NotInitialized => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Transport(e.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
