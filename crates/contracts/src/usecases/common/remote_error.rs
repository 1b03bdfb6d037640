use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Результат удалённого вызова к бэкенду
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Какой удалённый вызов завершился ошибкой
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOperation {
    /// Получение строки MSEG по скану
    Fetch,
    /// Запись пакета в SAP
    Save,
    /// Проверка подключения к SAP
    Login,
}

/// Где возникла ошибка: в сети/транспорте или на стороне SAP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    Network,
    Backend,
}

/// Ошибка удалённого вызова (непрозрачная, с диагностикой из внешней системы)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub operation: RemoteOperation,
    pub origin: ErrorOrigin,
    pub message: String,
    pub diagnostics: Vec<String>,
}

impl RemoteError {
    pub fn new(operation: RemoteOperation, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            operation,
            origin,
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn network(operation: RemoteOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ErrorOrigin::Network, message)
    }

    pub fn backend(operation: RemoteOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ErrorOrigin::Backend, message)
    }

    /// Attach the return messages the backend sent along with a failure
    pub fn with_return_messages(mut self, messages: &[Value]) -> Self {
        self.diagnostics = messages.iter().map(diagnostic_text).collect();
        self
    }

    pub fn is_network(&self) -> bool {
        self.origin == ErrorOrigin::Network
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.origin {
            ErrorOrigin::Network => write!(f, "Error de red: {}", self.message)?,
            ErrorOrigin::Backend => write!(f, "Error SAP: {}", self.message)?,
        }
        if !self.diagnostics.is_empty() {
            write!(f, " ({})", self.diagnostics.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}

/// Render one BAPI return message as a single line.
///
/// Objects carrying `TYPE`/`MESSAGE` become `"E: text"`, strings pass through,
/// anything else is rendered as compact JSON.
pub fn diagnostic_text(message: &Value) -> String {
    match message {
        Value::String(s) => s.clone(),
        Value::Object(map) => match (map.get("TYPE"), map.get("MESSAGE")) {
            (Some(Value::String(kind)), Some(Value::String(text))) if !kind.is_empty() => {
                format!("{}: {}", kind, text)
            }
            (_, Some(Value::String(text))) => text.clone(),
            _ => message.to_string(),
        },
        other => other.to_string(),
    }
}
