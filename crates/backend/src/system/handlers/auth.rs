use axum::body::Bytes;
use axum::Json;
use contracts::system::auth::{LoginRequest, LoginResponse};

use crate::shared::relay_error::RelayError;
use crate::usecases::u501_scan_goods_movement::{gateway, guest_config, with_guest_credentials};

fn parse_login(body: &[u8]) -> Result<LoginRequest, RelayError> {
    serde_json::from_slice(body).map_err(|e| RelayError::BadRequest(e.to_string()))
}

/// POST /validateSapLogin
///
/// Параметры подключения передаются шлюзу без изменений
pub async fn validate_sap_login(body: Bytes) -> Result<Json<LoginResponse>, RelayError> {
    let request = parse_login(&body)?;
    tracing::info!(
        "SAP login {} on {} client {}",
        request.sap_config.user.as_deref().unwrap_or("-"),
        request.sap_config.ahost,
        request.sap_config.client
    );

    let response = gateway()?.validate_login(&request).await?;
    if !response.success {
        tracing::warn!("login refused: {}", response.error.as_deref().unwrap_or("-"));
    }
    Ok(Json(response))
}

/// POST /validateGuestLogin
pub async fn validate_guest_login(body: Bytes) -> Result<Json<LoginResponse>, RelayError> {
    let request = parse_login(&body)?;
    let request = LoginRequest {
        sap_config: with_guest_credentials(request.sap_config, &guest_config()),
    };
    tracing::info!(
        "guest login on {} client {}",
        request.sap_config.ahost,
        request.sap_config.client
    );

    let response = gateway()?.validate_login(&request).await?;
    if !response.success {
        tracing::warn!("guest login refused: {}", response.error.as_deref().unwrap_or("-"));
    }
    Ok(Json(response))
}
