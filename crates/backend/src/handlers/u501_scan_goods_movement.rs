use axum::body::Bytes;
use axum::Json;
use contracts::domain::a001_movement_tag::ScannedToken;
use contracts::usecases::u501_scan_goods_movement::{
    FetchLineResponse, SaveBatchRequest, SaveBatchResponse,
};

use crate::shared::relay_error::RelayError;
use crate::usecases::u501_scan_goods_movement::gateway;

/// POST /getMsegData
pub async fn get_mseg_data(body: Bytes) -> Result<Json<FetchLineResponse>, RelayError> {
    let token: ScannedToken =
        serde_json::from_slice(&body).map_err(|e| RelayError::BadRequest(e.to_string()))?;

    tracing::info!("fetch line {}", token.identity());
    let response = gateway()?.fetch_line(&token).await?;
    if !response.success {
        tracing::warn!(
            "line {} not found: {}",
            token.identity(),
            response.error.as_deref().unwrap_or("-")
        );
    }
    Ok(Json(response))
}

/// POST /saveDataToSap
pub async fn save_data_to_sap(body: Bytes) -> Result<Json<SaveBatchResponse>, RelayError> {
    let request: SaveBatchRequest =
        serde_json::from_slice(&body).map_err(|e| RelayError::BadRequest(e.to_string()))?;
    let request = SaveBatchRequest::new(&request.header, request.items)
        .map_err(|blocked| RelayError::BadRequest(blocked.to_string()))?;

    tracing::info!(
        "save {} lines, movement {} warehouse {} plant {}",
        request.items.len(),
        request.header.movement_code,
        request.header.warehouse,
        request.header.plant
    );
    let response = gateway()?.save_batch(&request).await?;
    match (response.success, response.sap_document_number.as_deref()) {
        (true, Some(document)) => tracing::info!("SAP document {} created", document),
        (true, None) => tracing::warn!("save succeeded without a document number"),
        (false, _) => tracing::warn!(
            "save refused: {}",
            response.error.as_deref().unwrap_or("-")
        ),
    }
    Ok(Json(response))
}
