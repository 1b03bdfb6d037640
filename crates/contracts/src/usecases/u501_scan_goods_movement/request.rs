use serde::{Deserialize, Serialize};

use super::header::{HeaderField, MovementHeader};
use crate::domain::a001_movement_tag::ScannedToken;
use crate::domain::a002_movement_line::LineRecord;

/// Запрос строки MSEG: бэкенд получает разобранную метку как есть
pub type FetchLineRequest = ScannedToken;

/// Запрос на запись пакета сканов в SAP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBatchRequest {
    pub header: MovementHeader,
    pub items: Vec<LineRecord>,
}

impl SaveBatchRequest {
    /// Build a request from the current header and the ordered lines.
    ///
    /// The header is trimmed; an empty batch or a header without movement
    /// code, warehouse or plant is refused.
    pub fn new(header: &MovementHeader, items: Vec<LineRecord>) -> Result<Self, SaveBlocked> {
        if items.is_empty() {
            return Err(SaveBlocked::Empty);
        }
        let missing = header.missing_for_save();
        if !missing.is_empty() {
            return Err(SaveBlocked::MissingHeader(missing));
        }
        Ok(Self {
            header: header.trimmed(),
            items,
        })
    }
}

/// Причина, по которой пакет нельзя отправить
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveBlocked {
    Empty,
    MissingHeader(Vec<HeaderField>),
}

impl std::fmt::Display for SaveBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveBlocked::Empty => write!(f, "No hay datos para guardar."),
            SaveBlocked::MissingHeader(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.label()).collect();
                write!(
                    f,
                    "Complete todos los campos de cabecera obligatorios: {}",
                    names.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for SaveBlocked {}
