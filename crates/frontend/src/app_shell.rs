//! Application Shell - корневой компонент приложения
//!
//! `AppShell` - auth gate: показывает `LoginPage` или страницу сканирования.
//! Страница сканирования монтируется заново при каждом входе, поэтому
//! каждая сессия начинается с пустой партии.

use crate::system::auth::context::use_auth;
use crate::system::pages::login::LoginPage;
use crate::usecases::u501_scan_goods_movement::ScanGoodsMovementPage;
use leptos::prelude::*;

#[component]
pub fn AppShell() -> impl IntoView {
    let (auth_state, _) = use_auth();

    view! {
        <Show
            when=move || auth_state.get().is_authenticated()
            fallback=|| view! { <LoginPage /> }
        >
            <ScanGoodsMovementPage />
        </Show>
    }
}
