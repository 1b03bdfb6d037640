use contracts::system::auth::{
    LoginRequest, LoginResponse, SapConnectionParams, GUEST_LOGIN_PATH, LOGIN_PATH,
};
use contracts::usecases::common::{RemoteOperation, RemoteResult};

use crate::shared::api_utils::post_json;

/// Validate SAP credentials through the relay.
///
/// Guest login goes to its own endpoint; the backend fills in the guest
/// account.
pub async fn validate_login(sap_config: SapConnectionParams, guest: bool) -> RemoteResult<()> {
    let path = if guest { GUEST_LOGIN_PATH } else { LOGIN_PATH };
    let request = LoginRequest { sap_config };

    let response: LoginResponse = post_json(RemoteOperation::Login, path, &request).await?;
    response.into_result()
}
