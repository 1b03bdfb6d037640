use contracts::domain::a001_movement_tag::ScannedToken;
use contracts::system::auth::{LoginRequest, LoginResponse};
use contracts::usecases::u501_scan_goods_movement::{
    FetchLineResponse, SaveBatchRequest, SaveBatchResponse,
};
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Serialize};

use crate::shared::config::GatewayConfig;
use crate::shared::relay_error::RelayError;

/// Пути шлюза складской системы
pub const GATEWAY_MSEG_PATH: &str = "/mseg";
pub const GATEWAY_GOODS_MOVEMENT_PATH: &str = "/goods-movement";
pub const GATEWAY_LOGIN_PATH: &str = "/login";

static GATEWAY: OnceCell<GatewayClient> = OnceCell::new();

/// Создать клиент шлюза при старте сервера
pub fn init_gateway(config: &GatewayConfig) -> anyhow::Result<()> {
    let client = GatewayClient::new(config)?;
    GATEWAY
        .set(client)
        .map_err(|_| anyhow::anyhow!("gateway client already initialized"))
}

pub fn gateway() -> Result<&'static GatewayClient, RelayError> {
    GATEWAY.get().ok_or(RelayError::NotInitialized)
}

/// HTTP-клиент шлюза. Тела запросов передаются как есть, ответы
/// разбираются в контрактные типы.
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, RelayError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = self.url(path);
        let start = std::time::Instant::now();

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            "gateway POST {} -> {} in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        // Failures come back in the same JSON shape, so the body is decoded
        // whatever the status is
        serde_json::from_str::<Resp>(&text).map_err(|e| {
            tracing::warn!("gateway {} returned unexpected body: {}", url, text);
            RelayError::InvalidResponse {
                status: status.as_u16(),
                message: e.to_string(),
            }
        })
    }

    pub async fn fetch_line(&self, token: &ScannedToken) -> Result<FetchLineResponse, RelayError> {
        self.post(GATEWAY_MSEG_PATH, token).await
    }

    pub async fn save_batch(
        &self,
        request: &SaveBatchRequest,
    ) -> Result<SaveBatchResponse, RelayError> {
        self.post(GATEWAY_GOODS_MOVEMENT_PATH, request).await
    }

    pub async fn validate_login(&self, request: &LoginRequest) -> Result<LoginResponse, RelayError> {
        self.post(GATEWAY_LOGIN_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = GatewayClient::new(&GatewayConfig {
            base_url: "http://10.0.0.5:9000/api/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.url(GATEWAY_MSEG_PATH), "http://10.0.0.5:9000/api/mseg");
        assert_eq!(
            client.url(GATEWAY_GOODS_MOVEMENT_PATH),
            "http://10.0.0.5:9000/api/goods-movement"
        );
    }
}
