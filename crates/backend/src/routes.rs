use axum::{
    routing::{get, post},
    Router,
};
use contracts::system::auth::{GUEST_LOGIN_PATH, LOGIN_PATH};
use contracts::usecases::u501_scan_goods_movement::{FETCH_LINE_PATH, SAVE_BATCH_PATH};

use crate::{handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SAP LOGIN
        // ========================================
        .route(LOGIN_PATH, post(system::handlers::auth::validate_sap_login))
        .route(
            GUEST_LOGIN_PATH,
            post(system::handlers::auth::validate_guest_login),
        )
        // ========================================
        // U501 SCAN GOODS MOVEMENT
        // ========================================
        .route(
            FETCH_LINE_PATH,
            post(handlers::u501_scan_goods_movement::get_mseg_data),
        )
        .route(
            SAVE_BATCH_PATH,
            post(handlers::u501_scan_goods_movement::save_data_to_sap),
        )
}
