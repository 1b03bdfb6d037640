use serde::{Deserialize, Serialize};

use crate::usecases::common::{RemoteError, RemoteOperation};

/// POST: проверка подключения с учётными данными пользователя
pub const LOGIN_PATH: &str = "/validateSapLogin";

/// POST: проверка подключения под гостевой учётной записью бэкенда
pub const GUEST_LOGIN_PATH: &str = "/validateGuestLogin";

/// Отображаемое имя гостевого входа
pub const GUEST_DISPLAY_NAME: &str = "Invitado";

/// Система SAP, к которой подключается терминал
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SapEnvironment {
    Dev,
    Qas,
    Prd,
}

impl SapEnvironment {
    pub const ALL: [SapEnvironment; 3] = [SapEnvironment::Dev, SapEnvironment::Qas, SapEnvironment::Prd];

    pub fn code(&self) -> &'static str {
        match self {
            SapEnvironment::Dev => "DEV",
            SapEnvironment::Qas => "QAS",
            SapEnvironment::Prd => "PRD",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|env| env.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Application server host
    pub fn ahost(&self) -> &'static str {
        match self {
            SapEnvironment::Dev => "172.16.16.11",
            SapEnvironment::Qas => "172.16.16.10",
            SapEnvironment::Prd => "172.16.16.32",
        }
    }

    /// System number
    pub fn sysnr(&self) -> &'static str {
        "00"
    }
}

impl std::fmt::Display for SapEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Параметры подключения, передаются во внешнюю проверку без изменений
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SapConnectionParams {
    pub client: String,
    pub ahost: String,
    pub sysnr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passwd: Option<String>,
    #[serde(rename = "useSapRouter", default, skip_serializing_if = "Option::is_none")]
    pub use_sap_router: Option<bool>,
}

impl SapConnectionParams {
    /// Гостевой вход: только клиент и система, учётку подставляет бэкенд
    pub fn guest(env: SapEnvironment, client: &str) -> Self {
        Self {
            client: client.trim().to_string(),
            ahost: env.ahost().to_string(),
            sysnr: env.sysnr().to_string(),
            ..Self::default()
        }
    }

    pub fn user(
        env: SapEnvironment,
        client: &str,
        user: &str,
        passwd: &str,
        use_sap_router: bool,
    ) -> Self {
        Self {
            user: Some(user.trim().to_string()),
            passwd: Some(passwd.trim().to_string()),
            use_sap_router: Some(use_sap_router),
            ..Self::guest(env, client)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub sap_config: SapConnectionParams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> Result<(), RemoteError> {
        if self.success {
            Ok(())
        } else {
            Err(RemoteError::backend(
                RemoteOperation::Login,
                self.error.unwrap_or_else(|| "login rechazado".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_codes() {
        assert_eq!(SapEnvironment::from_code("qas"), Some(SapEnvironment::Qas));
        assert_eq!(SapEnvironment::from_code("XXX"), None);
        assert_eq!(SapEnvironment::Prd.ahost(), "172.16.16.32");
        assert_eq!(serde_json::to_value(SapEnvironment::Dev).unwrap(), json!("DEV"));
    }

    #[test]
    fn test_guest_params_omit_credentials() {
        let request = LoginRequest {
            sap_config: SapConnectionParams::guest(SapEnvironment::Dev, " 300 "),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({"sap_config": {"client": "300", "ahost": "172.16.16.11", "sysnr": "00"}})
        );
    }

    #[test]
    fn test_user_params_are_trimmed() {
        let params = SapConnectionParams::user(SapEnvironment::Qas, "300", " jdoe ", " s3cret ", true);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["user"], "jdoe");
        assert_eq!(json["passwd"], "s3cret");
        assert_eq!(json["useSapRouter"], true);
        assert_eq!(json["ahost"], "172.16.16.10");
    }

    #[test]
    fn test_login_response_result() {
        assert!(LoginResponse::ok().into_result().is_ok());
        let err = LoginResponse::failure("clave incorrecta").into_result().unwrap_err();
        assert_eq!(err.message, "clave incorrecta");
    }
}
