use serde::{Deserialize, Serialize};

/// Вид движения, для которого доступна отметка резерва
pub const RESERVATION_MOVEMENT_CODE: &str = "221";

/// Индикатор особого запаса, для которого доступна отметка резерва
pub const RESERVATION_STOCK_INDICATOR: &str = "Q";

/// Поле шапки перемещения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    MovementCode,
    Warehouse,
    Plant,
    PostingDate,
    HeaderText,
    SpecialStockIndicator,
}

impl HeaderField {
    /// Поля, без которых сканер не включается
    pub const REQUIRED: [HeaderField; 4] = [
        HeaderField::MovementCode,
        HeaderField::Warehouse,
        HeaderField::Plant,
        HeaderField::PostingDate,
    ];

    /// Поля, без которых пакет не отправляется в SAP
    pub const REQUIRED_FOR_SAVE: [HeaderField; 3] = [
        HeaderField::MovementCode,
        HeaderField::Warehouse,
        HeaderField::Plant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HeaderField::MovementCode => "Clase de movimiento",
            HeaderField::Warehouse => "Almacén",
            HeaderField::Plant => "Centro",
            HeaderField::PostingDate => "Fecha contable",
            HeaderField::HeaderText => "Texto cabecera",
            HeaderField::SpecialStockIndicator => "Indicador stock especial",
        }
    }
}

/// Шапка документа перемещения, заполняется до начала сканирования
///
/// Имена полей на проводе совпадают с тем, что ожидает `/saveDataToSap`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementHeader {
    #[serde(rename = "clMovimiento")]
    pub movement_code: String,
    #[serde(rename = "almacen")]
    pub warehouse: String,
    #[serde(rename = "centro")]
    pub plant: String,
    #[serde(rename = "textoCabecera")]
    pub header_text: String,
    /// YYYY-MM-DD
    #[serde(rename = "fechaContab")]
    pub posting_date: String,
    #[serde(rename = "specialStockIndicator")]
    pub special_stock_indicator: String,
    #[serde(rename = "isReservaChecked")]
    pub is_reservation_checked: bool,
}

impl MovementHeader {
    /// Пустая шапка с датой проводки
    pub fn with_posting_date(posting_date: impl Into<String>) -> Self {
        Self {
            posting_date: posting_date.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::MovementCode => &self.movement_code,
            HeaderField::Warehouse => &self.warehouse,
            HeaderField::Plant => &self.plant,
            HeaderField::PostingDate => &self.posting_date,
            HeaderField::HeaderText => &self.header_text,
            HeaderField::SpecialStockIndicator => &self.special_stock_indicator,
        }
    }

    pub fn set(&mut self, field: HeaderField, value: impl Into<String>) {
        let value = value.into();
        match field {
            HeaderField::MovementCode => self.movement_code = value,
            HeaderField::Warehouse => self.warehouse = value,
            HeaderField::Plant => self.plant = value,
            HeaderField::PostingDate => self.posting_date = value,
            HeaderField::HeaderText => self.header_text = value,
            HeaderField::SpecialStockIndicator => self.special_stock_indicator = value,
        }
    }

    fn is_filled(&self, field: HeaderField) -> bool {
        !self.get(field).trim().is_empty()
    }

    /// Все обязательные поля заполнены (после trim)
    pub fn is_ready(&self) -> bool {
        HeaderField::REQUIRED.iter().all(|f| self.is_filled(*f))
    }

    /// Обязательные для записи поля, которые остались пустыми
    pub fn missing_for_save(&self) -> Vec<HeaderField> {
        HeaderField::REQUIRED_FOR_SAVE
            .iter()
            .copied()
            .filter(|f| !self.is_filled(*f))
            .collect()
    }

    /// Отметка резерва применима: вид движения 221 и особый запас Q
    pub fn reservation_applies(&self) -> bool {
        self.movement_code.trim() == RESERVATION_MOVEMENT_CODE
            && self
                .special_stock_indicator
                .trim()
                .eq_ignore_ascii_case(RESERVATION_STOCK_INDICATOR)
    }

    /// Copy with text fields trimmed, the shape sent to the backend.
    /// The posting date comes from a date input and is sent as is.
    pub fn trimmed(&self) -> Self {
        Self {
            movement_code: self.movement_code.trim().to_string(),
            warehouse: self.warehouse.trim().to_string(),
            plant: self.plant.trim().to_string(),
            header_text: self.header_text.trim().to_string(),
            posting_date: self.posting_date.clone(),
            special_stock_indicator: self.special_stock_indicator.trim().to_string(),
            is_reservation_checked: self.is_reservation_checked,
        }
    }
}
