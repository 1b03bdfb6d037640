use contracts::system::auth::SapConnectionParams;
use once_cell::sync::OnceCell;

use crate::shared::config::GuestConfig;

static GUEST: OnceCell<GuestConfig> = OnceCell::new();

pub fn init_guest(config: GuestConfig) {
    if config.user.is_empty() {
        tracing::warn!("guest user is not configured, guest login will be refused by SAP");
    }
    let _ = GUEST.set(config);
}

/// Гостевая учётка; пустая, если сервер запущен без конфигурации
pub fn guest_config() -> GuestConfig {
    GUEST.get().cloned().unwrap_or_default()
}

/// Подставить гостевую учётку из конфигурации.
///
/// Browser-supplied user and password are discarded; the client keeps the
/// browser value unless it is empty. Guests never go through the SAP router.
pub fn with_guest_credentials(
    params: SapConnectionParams,
    guest: &GuestConfig,
) -> SapConnectionParams {
    let client = if params.client.trim().is_empty() {
        guest.client.clone()
    } else {
        params.client
    };

    SapConnectionParams {
        client,
        user: Some(guest.user.clone()),
        passwd: Some(guest.password.clone()),
        use_sap_router: Some(false),
        ..params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::system::auth::SapEnvironment;

    fn guest() -> GuestConfig {
        GuestConfig {
            client: "300".to_string(),
            user: "SCANNER".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_injects_guest_account() {
        let params = SapConnectionParams::guest(SapEnvironment::Qas, "100");
        let result = with_guest_credentials(params, &guest());

        assert_eq!(result.client, "100");
        assert_eq!(result.ahost, "172.16.16.10");
        assert_eq!(result.sysnr, "00");
        assert_eq!(result.user.as_deref(), Some("SCANNER"));
        assert_eq!(result.passwd.as_deref(), Some("secret"));
        assert_eq!(result.use_sap_router, Some(false));
    }

    #[test]
    fn test_empty_client_falls_back_to_config() {
        let params = SapConnectionParams::guest(SapEnvironment::Dev, "  ");
        let result = with_guest_credentials(params, &guest());
        assert_eq!(result.client, "300");
    }

    #[test]
    fn test_browser_credentials_are_replaced() {
        let params =
            SapConnectionParams::user(SapEnvironment::Prd, "100", "intruder", "pw", true);
        let result = with_guest_credentials(params, &guest());
        assert_eq!(result.user.as_deref(), Some("SCANNER"));
        assert_eq!(result.passwd.as_deref(), Some("secret"));
        assert_eq!(result.use_sap_router, Some(false));
    }
}
