use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::a001_movement_tag::DocumentKey;

/// Строка материального документа (MSEG), полученная из SAP для одного скана
///
/// Бэкенд присылает объект произвольной формы: отсутствующие поля
/// становятся пустыми строками, числа приводятся к строкам. Поля, которые
/// UI не отображает, сохраняются в `extra` и уходят обратно при записи.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineRecord {
    /// Номер материального документа
    #[serde(rename = "MBLNR", deserialize_with = "lenient_string")]
    pub document_number: String,
    /// Год документа
    #[serde(rename = "MJAHR", deserialize_with = "lenient_string")]
    pub document_year: String,
    /// Позиция документа
    #[serde(rename = "ZEILE", deserialize_with = "lenient_string")]
    pub line: String,
    #[serde(rename = "MATNR", deserialize_with = "lenient_string")]
    pub material: String,
    #[serde(rename = "MAKTX", deserialize_with = "lenient_string")]
    pub material_description: String,
    #[serde(rename = "CHARG", deserialize_with = "lenient_string")]
    pub batch: String,
    #[serde(rename = "MENGE", deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(rename = "MEINS", deserialize_with = "lenient_string")]
    pub unit: String,
    #[serde(rename = "EBELN", deserialize_with = "lenient_string")]
    pub purchase_order: String,
    #[serde(rename = "PS_PSP_PNR", deserialize_with = "lenient_string")]
    pub wbs_element: String,
    #[serde(rename = "KDAUF", deserialize_with = "lenient_string")]
    pub sales_order: String,
    #[serde(rename = "KDPOS", deserialize_with = "lenient_string")]
    pub sales_order_item: String,
    #[serde(rename = "SGTXT", deserialize_with = "lenient_string")]
    pub item_text: String,
    /// Место хранения терминала, прикрепляется локально из QR-метки
    #[serde(rename = "SUNMI", deserialize_with = "lenient_string")]
    pub sunmi_location: String,
    #[serde(rename = "ZZUBICACION", deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(rename = "SUB_LOC", deserialize_with = "lenient_string")]
    pub sub_location: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineRecord {
    /// Map an arbitrary backend payload into a record.
    ///
    /// Anything that is not a JSON object yields an empty record.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Object(_) => serde_json::from_value(payload).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn document_key(&self) -> DocumentKey {
        DocumentKey::new(&self.document_number, &self.document_year)
    }

    /// Values of the table columns in display order (without the row index)
    pub fn display_cells(&self) -> [&str; 14] {
        [
            self.material.as_str(),
            self.material_description.as_str(),
            self.batch.as_str(),
            self.quantity.as_str(),
            self.unit.as_str(),
            self.line.as_str(),
            self.purchase_order.as_str(),
            self.wbs_element.as_str(),
            self.sales_order.as_str(),
            self.sales_order_item.as_str(),
            self.item_text.as_str(),
            self.sunmi_location.as_str(),
            self.location.as_str(),
            self.sub_location.as_str(),
        ]
    }
}

/// Заголовки колонок таблицы позиций, в порядке `display_cells`
pub const DISPLAY_COLUMNS: [&str; 14] = [
    "Material",
    "Descripción",
    "Lote",
    "Cantidad",
    "UM",
    "Pos.",
    "Pedido",
    "PEP",
    "Pedido cliente",
    "Pos. cliente",
    "Texto",
    "SUNMI",
    "Ubicación",
    "Sub-ubicación",
];

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}
