use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::a002_movement_line::LineRecord;
use crate::usecases::common::{RemoteError, RemoteOperation};

/// Текст ошибки для успешного ответа без `msegData`
pub const MISSING_RECORD_MESSAGE: &str = "La respuesta no contiene datos MSEG";

/// Ответ `/getMsegData`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchLineResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(
        rename = "msegData",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_record"
    )]
    pub mseg_data: Option<LineRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "returnMessages", default, deserialize_with = "lenient_messages")]
    pub return_messages: Vec<Value>,
}

impl FetchLineResponse {
    pub fn found(record: LineRecord) -> Self {
        Self {
            success: true,
            mseg_data: Some(record),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn into_result(self) -> Result<LineRecord, RemoteError> {
        match (self.success, self.mseg_data) {
            (true, Some(record)) => return Ok(record),
            // Успех без строки: записывать нечего
            (true, None) => {
                return Err(RemoteError::backend(
                    RemoteOperation::Fetch,
                    MISSING_RECORD_MESSAGE,
                ))
            }
            (false, _) => {}
        }
        let message = self.error.unwrap_or_else(|| "respuesta sin detalle".to_string());
        Err(RemoteError::backend(RemoteOperation::Fetch, message)
            .with_return_messages(&self.return_messages))
    }
}

/// Ответ `/saveDataToSap`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveBatchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_document_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "returnMessages", default, deserialize_with = "lenient_messages")]
    pub return_messages: Vec<Value>,
}

impl SaveBatchResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Номер созданного документа SAP или ошибка
    pub fn into_result(self) -> Result<String, RemoteError> {
        if self.success {
            return Ok(self.sap_document_number.unwrap_or_default());
        }
        let message = self.error.unwrap_or_else(|| "respuesta sin detalle".to_string());
        Err(RemoteError::backend(RemoteOperation::Save, message)
            .with_return_messages(&self.return_messages))
    }
}

fn lenient_record<'de, D>(deserializer: D) -> Result<Option<LineRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(payload) => Some(LineRecord::from_payload(payload)),
    })
}

/// `returnMessages` может прийти массивом, одиночным объектом или null
fn lenient_messages<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(single) => vec![single],
    })
}
