use serde::{Deserialize, Serialize};

/// Разделитель сегментов в QR-метке перемещения
pub const SEGMENT_SEPARATOR: char = '|';

/// Минимальное количество сегментов в корректной метке
pub const MIN_SEGMENTS: usize = 5;

// ============================================================================
// Token
// ============================================================================

/// Разобранная QR-метка складского перемещения
///
/// Формат исходной строки:
/// `documentNumber|documentYear|item|moveType|specialStockIndicator[|sunmiLocation]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedToken {
    pub document_number: String,
    pub document_year: String,
    pub item: String,
    pub move_type: String,
    pub special_stock_indicator: String,
    #[serde(default)]
    pub sunmi_location: String,
}

impl ScannedToken {
    /// Ключ дедупликации `documentNumber|documentYear|item`
    pub fn identity(&self) -> ScanIdentity {
        ScanIdentity::new(&self.document_number, &self.document_year, &self.item)
    }

    pub fn document_key(&self) -> DocumentKey {
        DocumentKey::new(&self.document_number, &self.document_year)
    }
}

impl std::str::FromStr for ScannedToken {
    type Err = MalformedTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses one raw QR read.
///
/// Segments are taken positionally; anything past the sixth segment is
/// ignored and no segment is validated beyond its presence.
pub fn parse(raw: &str) -> Result<ScannedToken, MalformedTokenError> {
    let parts: Vec<&str> = raw.split(SEGMENT_SEPARATOR).collect();
    if parts.len() < MIN_SEGMENTS {
        return Err(MalformedTokenError {
            raw: raw.to_string(),
            segments: parts.len(),
        });
    }

    Ok(ScannedToken {
        document_number: parts[0].to_string(),
        document_year: parts[1].to_string(),
        item: parts[2].to_string(),
        move_type: parts[3].to_string(),
        special_stock_indicator: parts[4].to_string(),
        sunmi_location: parts.get(5).map(|s| s.to_string()).unwrap_or_default(),
    })
}

// ============================================================================
// Identity
// ============================================================================

/// Идентичность скана: два токена с одинаковой идентичностью считаются
/// одним и тем же физическим сканом
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanIdentity(String);

impl ScanIdentity {
    pub fn new(document_number: &str, document_year: &str, item: &str) -> Self {
        Self(format!(
            "{}{sep}{}{sep}{}",
            document_number,
            document_year,
            item,
            sep = SEGMENT_SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScanIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Пара (номер документа, год), которой закрепляется пакет сканов
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub number: String,
    pub year: String,
}

impl DocumentKey {
    pub fn new(number: &str, year: &str) -> Self {
        Self {
            number: number.to_string(),
            year: year.to_string(),
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.number, self.year)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Строка скана не является меткой перемещения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedTokenError {
    pub raw: String,
    pub segments: usize,
}

impl std::fmt::Display for MalformedTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Formato de QR inválido: se esperaban al menos {} segmentos, hay {}",
            MIN_SEGMENTS, self.segments
        )
    }
}

impl std::error::Error for MalformedTokenError {}
