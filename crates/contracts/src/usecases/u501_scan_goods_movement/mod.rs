pub mod header;
pub mod request;
pub mod response;

pub use header::{HeaderField, MovementHeader};
pub use request::{FetchLineRequest, SaveBatchRequest, SaveBlocked};
pub use response::{FetchLineResponse, SaveBatchResponse};

/// POST: получить строку MSEG для одного скана
pub const FETCH_LINE_PATH: &str = "/getMsegData";

/// POST: записать пакет сканов в SAP
pub const SAVE_BATCH_PATH: &str = "/saveDataToSap";
