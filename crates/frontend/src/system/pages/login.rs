use contracts::system::auth::{SapConnectionParams, SapEnvironment, GUEST_DISPLAY_NAME};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::shared::status::StatusMessage;
use crate::system::auth::{api, context::use_auth, context::AuthState};

#[component]
pub fn LoginPage() -> impl IntoView {
    let (environment, set_environment) = signal(SapEnvironment::Dev);
    let (client, set_client) = signal(String::new());
    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (use_router, set_use_router) = signal(false);
    let (is_loading, set_is_loading) = signal(false);

    let (auth_state, set_auth_state) = use_auth();

    // Сообщение после выхода показываем, пока пользователь не начнёт вход
    let (notice, set_notice) =
        signal(auth_state.get_untracked().notice.unwrap_or_default());

    let login = move |guest: bool| {
        if is_loading.get_untracked() {
            return;
        }
        let env = environment.get_untracked();
        let client_val = client.get_untracked();
        let (params, display) = if guest {
            (
                SapConnectionParams::guest(env, &client_val),
                GUEST_DISPLAY_NAME.to_string(),
            )
        } else {
            let user = username.get_untracked();
            (
                SapConnectionParams::user(
                    env,
                    &client_val,
                    &user,
                    &password.get_untracked(),
                    use_router.get_untracked(),
                ),
                user.trim().to_string(),
            )
        };

        set_is_loading.set(true);
        set_notice.set(StatusMessage::info("Validando credenciales..."));
        log::info!("login attempt on {} (guest: {})", env, guest);

        spawn_local(async move {
            match api::validate_login(params, guest).await {
                Ok(()) => {
                    log::info!("login ok: {} ({})", display, env);
                    set_password.set(String::new());
                    // Переключает AppShell на страницу сканирования
                    set_auth_state.set(AuthState::logged_in(display, env));
                }
                Err(e) => {
                    log::error!("login failed: {}", e);
                    let text = if e.is_network() {
                        format!("Error de red: {}", e.message)
                    } else {
                        format!("Error de login: {}", e.message)
                    };
                    set_notice.set(StatusMessage::error(text));
                }
            }
            set_is_loading.set(false);
        });
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        login(false);
    };

    view! {
        <div class="login-container">
            <div class="login-box">
                <h1>"Movimientos de mercancía"</h1>
                <h2>"Inicio de sesión SAP"</h2>

                <Show when=move || !notice.get().text.is_empty()>
                    <div class=move || format!("login-status {}", notice.get().kind.css_class())>
                        {move || notice.get().text}
                    </div>
                </Show>

                <form on:submit=on_submit>
                    <div class="form-group">
                        <label for="sap-env">"Entorno"</label>
                        <select
                            id="sap-env"
                            on:change=move |ev| {
                                if let Some(env) = SapEnvironment::from_code(&event_target_value(&ev)) {
                                    set_environment.set(env);
                                }
                            }
                            disabled=move || is_loading.get()
                        >
                            {SapEnvironment::ALL
                                .iter()
                                .map(|env| {
                                    let env = *env;
                                    view! {
                                        <option
                                            value=env.code()
                                            selected=move || environment.get() == env
                                        >
                                            {env.code()}
                                        </option>
                                    }
                                })
                                .collect_view()}
                        </select>
                    </div>

                    <div class="form-group">
                        <label for="sap-client">"Mandante"</label>
                        <input
                            type="text"
                            id="sap-client"
                            placeholder="100"
                            prop:value=move || client.get()
                            on:input=move |ev| set_client.set(event_target_value(&ev))
                            disabled=move || is_loading.get()
                        />
                    </div>

                    <div class="form-group">
                        <label for="sap-user">"Usuario"</label>
                        <input
                            type="text"
                            id="sap-user"
                            prop:value=move || username.get()
                            on:input=move |ev| set_username.set(event_target_value(&ev))
                            disabled=move || is_loading.get()
                        />
                    </div>

                    <div class="form-group">
                        <label for="sap-pass">"Contraseña"</label>
                        <input
                            type="password"
                            id="sap-pass"
                            prop:value=move || password.get()
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                            disabled=move || is_loading.get()
                        />
                    </div>

                    <div class="form-group checkbox-group">
                        <label>
                            <input
                                type="checkbox"
                                prop:checked=move || use_router.get()
                                on:change=move |ev| set_use_router.set(event_target_checked(&ev))
                                disabled=move || is_loading.get()
                            />
                            " Usar SAP Router"
                        </label>
                    </div>

                    <button
                        type="submit"
                        class="btn-primary"
                        disabled=move || is_loading.get()
                    >
                        {move || if is_loading.get() { "Validando..." } else { "Iniciar sesión" }}
                    </button>
                    <button
                        type="button"
                        class="btn-secondary"
                        on:click=move |_| login(true)
                        disabled=move || is_loading.get()
                    >
                        "Entrar como invitado"
                    </button>
                </form>
            </div>
        </div>
    }
}
