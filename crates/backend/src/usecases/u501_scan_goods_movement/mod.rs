pub mod gateway_client;
pub mod guest;

pub use gateway_client::{gateway, init_gateway, GatewayClient};
pub use guest::{guest_config, init_guest, with_guest_credentials};
