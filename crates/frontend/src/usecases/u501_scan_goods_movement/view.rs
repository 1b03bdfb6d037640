use contracts::domain::a002_movement_line::aggregate::DISPLAY_COLUMNS;
use contracts::usecases::u501_scan_goods_movement::HeaderField;
use leptos::prelude::*;
use thaw::*;

use super::scanner::READER_ELEMENT_ID;
use super::view_model::ScanViewModel;
use crate::system::auth::context::{use_auth, AuthState};

/// Одно поле шапки перемещения
#[component]
fn HeaderInput(
    vm: ScanViewModel,
    field: HeaderField,
    #[prop(optional)] input_type: Option<&'static str>,
    #[prop(optional)] placeholder: Option<&'static str>,
    #[prop(optional)] required: bool,
) -> impl IntoView {
    let label = if required {
        format!("{} *", field.label())
    } else {
        field.label().to_string()
    };

    view! {
        <div class="form__group">
            <label class="form__label">{label}</label>
            <input
                class="form__input"
                type=input_type.unwrap_or("text")
                placeholder=placeholder.unwrap_or("")
                prop:value=move || vm.session.with(|s| s.header().get(field).to_string())
                on:input=move |ev| vm.header_input(field, event_target_value(&ev))
            />
        </div>
    }
}

#[component]
pub fn ScanGoodsMovementPage() -> impl IntoView {
    let (auth_state, set_auth_state) = use_auth();
    let vm = ScanViewModel::new();

    // Сессия создаётся при входе: сразу проверяем шапку
    vm.refresh_arming();

    let on_logout = move |_| {
        vm.shutdown();
        set_auth_state.set(AuthState::logged_out());
    };

    let has_lines = move || vm.session.with(|s| !s.is_empty());

    view! {
        <div class="page">
            <div class="page__header">
                <div class="page__header-left">
                    <h1 class="page__title">"Movimientos de mercancía"</h1>
                    <span class="page__subtitle">{move || auth_state.get().label()}</span>
                </div>
                <Button appearance=ButtonAppearance::Secondary on_click=on_logout>
                    "Cerrar sesión"
                </Button>
            </div>

            <Card>
                <div class="detail-form">
                    <HeaderInput vm=vm field=HeaderField::MovementCode placeholder="221" required=true />
                    <HeaderInput vm=vm field=HeaderField::Warehouse required=true />
                    <HeaderInput vm=vm field=HeaderField::Plant required=true />
                    <HeaderInput vm=vm field=HeaderField::PostingDate input_type="date" required=true />
                    <HeaderInput vm=vm field=HeaderField::HeaderText />
                    <HeaderInput vm=vm field=HeaderField::SpecialStockIndicator placeholder="Q" />

                    <Show when=move || vm.session.with(|s| s.reservation_visible())>
                        <div class="form-group checkbox-group">
                            <label class="form__checkbox-wrapper">
                                <input
                                    type="checkbox"
                                    prop:checked=move || vm.session.with(|s| s.header().is_reservation_checked)
                                    on:change=move |ev| vm.reservation_input(event_target_checked(&ev))
                                />
                                <span class="form__checkbox-label">"Reserva"</span>
                            </label>
                        </div>
                    </Show>
                </div>
            </Card>

            <div
                id=READER_ELEMENT_ID
                class=move || {
                    if vm.session.with(|s| s.is_scanning()) { "reader active" } else { "reader" }
                }
            ></div>

            <div class=move || format!("scan-status {}", vm.status.get().kind.css_class())>
                {move || vm.status.get().text}
            </div>

            {move || {
                let diagnostics = vm.diagnostics.get();
                if diagnostics.is_empty() {
                    view! { <></> }.into_any()
                } else {
                    view! {
                        <ul class="scan-diagnostics">
                            {diagnostics.into_iter().map(|d| view! { <li>{d}</li> }).collect_view()}
                        </ul>
                    }.into_any()
                }
            }}

            <div class="scan-debug">
                <div class="form__group">
                    <label class="form__label">"Contenido QR"</label>
                    <textarea class="form__textarea" rows="1" readonly prop:value=move || vm.last_raw.get() />
                </div>
                <div class="form__group">
                    <label class="form__label">"Datos interpretados"</label>
                    <textarea class="form__textarea" rows="8" readonly prop:value=move || vm.last_parsed.get() />
                </div>
            </div>

            <div class="table-wrapper">
                <table class="table">
                    <thead>
                        <tr>
                            <th>"#"</th>
                            {DISPLAY_COLUMNS.iter().map(|c| view! { <th>{*c}</th> }).collect_view()}
                        </tr>
                    </thead>
                    <tbody>
                        {move || vm.session.with(|s| {
                            s.lines()
                                .enumerate()
                                .map(|(i, line)| {
                                    let cells: Vec<String> =
                                        line.display_cells().iter().map(|c| c.to_string()).collect();
                                    view! {
                                        <tr>
                                            <td>{i + 1}</td>
                                            {cells.into_iter().map(|c| view! { <td>{c}</td> }).collect_view()}
                                        </tr>
                                    }
                                })
                                .collect_view()
                        })}
                    </tbody>
                </table>
            </div>

            <Show when=has_lines>
                <div class="page__actions">
                    <Button appearance=ButtonAppearance::Secondary on_click=move |_| vm.reset_command()>
                        "Reiniciar"
                    </Button>
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=move |_| vm.save_command()
                        disabled=vm.is_saving
                    >
                        {move || if vm.is_saving.get() { "Guardando..." } else { "Guardar en SAP" }}
                    </Button>
                </div>
            </Show>
        </div>
    }
}
