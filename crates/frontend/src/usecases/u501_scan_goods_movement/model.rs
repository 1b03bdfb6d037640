use contracts::domain::a001_movement_tag::ScannedToken;
use contracts::domain::a002_movement_line::LineRecord;
use contracts::usecases::common::{RemoteOperation, RemoteResult};
use contracts::usecases::u501_scan_goods_movement::{
    FetchLineResponse, SaveBatchRequest, SaveBatchResponse, FETCH_LINE_PATH, SAVE_BATCH_PATH,
};

use crate::shared::api_utils::post_json;

/// Fetch the MSEG line for one scanned tag
pub async fn fetch_line(token: &ScannedToken) -> RemoteResult<LineRecord> {
    let response: FetchLineResponse =
        post_json(RemoteOperation::Fetch, FETCH_LINE_PATH, token).await?;
    response.into_result()
}

/// Post the batch; returns the generated SAP document number
pub async fn save_batch(request: &SaveBatchRequest) -> RemoteResult<String> {
    let response: SaveBatchResponse =
        post_json(RemoteOperation::Save, SAVE_BATCH_PATH, request).await?;
    response.into_result()
}
