use std::rc::Rc;

use contracts::domain::a001_movement_tag::ScannedToken;
use contracts::usecases::common::{RemoteError, RemoteOperation};
use contracts::usecases::u501_scan_goods_movement::HeaderField;
use futures::channel::mpsc::UnboundedReceiver;
use futures::future::{abortable, AbortHandle};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;

use super::driver::{drain_decoded, ScannerDriver, ScannerState, Transition};
use super::model;
use super::scanner::Html5QrScanner;
use super::session::{
    ArmState, CooldownTicket, HeaderUpdate, LineOutcome, ScanDecision, ScanSession,
    SessionGeneration, COOLDOWN_MS,
};
use crate::shared::date_utils::format_date;
use crate::shared::status::StatusMessage;

const FILL_HEADER_HINT: &str = "Complete los campos de cabecera para activar el escáner.";

/// ViewModel страницы сканирования
///
/// Owns the scan session and drives everything asynchronous around it:
/// - the camera, whose decoded texts go through a channel into one consumer task
/// - the cooldown timer of every accepted scan
/// - line fetches and the batch save
#[derive(Clone, Copy)]
pub struct ScanViewModel {
    pub session: RwSignal<ScanSession>,
    pub status: RwSignal<StatusMessage>,
    /// Диагностика SAP последней ошибки
    pub diagnostics: RwSignal<Vec<String>>,
    pub last_raw: RwSignal<String>,
    pub last_parsed: RwSignal<String>,
    pub is_saving: RwSignal<bool>,
    scanner: StoredValue<Rc<ScannerDriver<Html5QrScanner>>, LocalStorage>,
    /// Cancels the decode consumer task
    pump: StoredValue<Option<AbortHandle>>,
}

impl ScanViewModel {
    pub fn new() -> Self {
        Self {
            session: RwSignal::new(ScanSession::new()),
            status: RwSignal::new(StatusMessage::warning(FILL_HEADER_HINT)),
            diagnostics: RwSignal::new(Vec::new()),
            last_raw: RwSignal::new(String::new()),
            last_parsed: RwSignal::new(String::new()),
            is_saving: RwSignal::new(false),
            scanner: StoredValue::new_local(Rc::new(ScannerDriver::new(Html5QrScanner::new()))),
            pump: StoredValue::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------

    pub fn header_input(&self, field: HeaderField, value: String) {
        if let Some(update) = self.session.try_update(|s| s.set_header_field(field, value)) {
            self.apply_arming(update);
        }
    }

    pub fn reservation_input(&self, checked: bool) {
        self.session.update(|s| {
            s.set_reservation_checked(checked);
        });
    }

    /// Re-evaluate the header, e.g. right after login
    pub fn refresh_arming(&self) {
        if let Some(update) = self.session.try_update(|s| s.reevaluate_header()) {
            self.apply_arming(update);
        }
    }

    fn apply_arming(&self, update: HeaderUpdate) {
        match update.arm {
            ArmState::Armed => self.start_scanner(),
            ArmState::Disarmed => {
                self.stop_scanner();
                self.status.set(StatusMessage::warning(FILL_HEADER_HINT));
            }
        }
    }

    // ------------------------------------------------------------------
    // Scanner
    // ------------------------------------------------------------------

    /// Start the camera; no-op while a start is pending or the camera runs
    pub fn start_scanner(&self) {
        let driver = self.scanner.get_value();
        if driver.wants_running() {
            return;
        }
        self.status.set(StatusMessage::info("Activando escáner..."));

        let vm = *self;
        spawn_local(async move {
            match driver.request_start().await {
                Ok(Transition::Started(decoded)) => {
                    // A stop queued behind this start closes the camera again
                    if !driver.wants_running() {
                        return;
                    }
                    vm.session.try_update(|s| s.set_scanning(true));
                    vm.spawn_pump(decoded);
                    vm.status.try_set(StatusMessage::success(
                        "Escáner activo. Apunte la cámara a un código.",
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Error al iniciar escáner: {}", e);
                    vm.session.try_update(|s| s.set_scanning(false));
                    vm.status
                        .try_set(StatusMessage::error(format!("Error al iniciar escáner: {}", e)));
                }
            }
        });
    }

    /// Stop the camera and the decode consumer. Idempotent; a stop issued
    /// while the camera is starting takes effect once the start settles.
    pub fn stop_scanner(&self) {
        let driver = self.scanner.get_value();
        if !driver.wants_running() && driver.state() == ScannerState::Stopped {
            return;
        }
        self.cancel_pump();
        self.session.try_update(|s| s.set_scanning(false));

        let vm = *self;
        spawn_local(async move {
            match driver.request_stop().await {
                Ok(Transition::Stopped) => vm.cancel_pump(),
                Ok(_) => {}
                Err(e) => log::error!("Error al detener escáner: {}", e),
            }
        });
    }

    fn spawn_pump(&self, decoded: UnboundedReceiver<String>) {
        let vm = *self;
        let (pump, handle) = abortable(drain_decoded(decoded, move |text| vm.handle_decode(text)));
        self.cancel_pump();
        self.pump.try_set_value(Some(handle));
        spawn_local(async move {
            let _ = pump.await;
        });
    }

    fn cancel_pump(&self) {
        if let Some(handle) = self.pump.try_update_value(|pump| pump.take()).flatten() {
            handle.abort();
        }
    }

    // ------------------------------------------------------------------
    // Scans
    // ------------------------------------------------------------------

    fn handle_decode(&self, text: String) {
        let cooling = self
            .session
            .try_with_untracked(|s| s.is_cooling_down())
            .unwrap_or(true);
        if cooling {
            return;
        }
        let Some(Ok(outcome)) = self.session.try_update(|s| s.submit_scan(&text)) else {
            return;
        };

        log::debug!("scan accepted: {}", text);
        self.status
            .set(StatusMessage::success("Código detectado. Procesando..."));
        self.last_raw.set(text);
        self.schedule_cooldown_expiry(outcome.cooldown);

        match outcome.decision {
            ScanDecision::Malformed(e) => {
                log::warn!("malformed scan: {}", e);
                self.last_parsed.set(String::new());
                self.status
                    .set(StatusMessage::error(format!("Error procesando QR: {}", e)));
            }
            ScanDecision::Duplicate(token) => {
                self.show_parsed(&token);
                self.status
                    .set(StatusMessage::warning("Este código ya fue escaneado."));
            }
            ScanDecision::FetchNeeded(token) => {
                self.show_parsed(&token);
                self.fetch_line(token, outcome.generation);
            }
        }
    }

    fn show_parsed(&self, token: &ScannedToken) {
        self.last_parsed
            .set(serde_json::to_string_pretty(token).unwrap_or_default());
    }

    fn schedule_cooldown_expiry(&self, ticket: CooldownTicket) {
        let session = self.session;
        let status = self.status;
        spawn_local(async move {
            TimeoutFuture::new(COOLDOWN_MS).await;
            let expired = session
                .try_update(|s| s.end_cooldown(ticket))
                .unwrap_or(false);
            let armed = session.try_with_untracked(|s| s.is_armed()).unwrap_or(false);
            if expired && armed {
                status.set(StatusMessage::info("Listo para escanear."));
            }
        });
    }

    /// Fetch the line of a new scan; the answer is dropped if the batch was
    /// reset meanwhile
    fn fetch_line(&self, token: ScannedToken, generation: SessionGeneration) {
        let vm = *self;
        spawn_local(async move {
            match model::fetch_line(&token).await {
                Ok(record) => {
                    let label = format!("{}/{}", record.document_number, record.line);
                    let Some(outcome) = vm
                        .session
                        .try_update(|s| s.record_fetched_line(generation, &token, record))
                        .flatten()
                    else {
                        log::debug!("line {} arrived after reset, dropped", label);
                        return;
                    };
                    vm.diagnostics.set(Vec::new());
                    match outcome {
                        LineOutcome::MixedDocument(warning) => {
                            log::warn!("{}", warning);
                            vm.status.set(StatusMessage::warning(warning.to_string()));
                        }
                        LineOutcome::Inserted | LineOutcome::Replaced => {
                            vm.status
                                .set(StatusMessage::success(format!("Datos de {} obtenidos.", label)));
                        }
                    }
                }
                Err(e) => {
                    let current = vm.session.try_with_untracked(|s| s.generation());
                    if current == Some(generation) {
                        vm.report_remote_error(e);
                    } else {
                        log::debug!("fetch error after reset, dropped: {}", e);
                    }
                }
            }
        });
    }

    fn report_remote_error(&self, error: RemoteError) {
        log::error!("{}", error);
        if !error.diagnostics.is_empty() {
            log::error!("SAP messages: {:?}", error.diagnostics);
        }
        self.diagnostics.set(error.diagnostics.clone());
        self.status.set(StatusMessage::error(status_text(&error)));
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn save_command(&self) {
        if self.is_saving.get_untracked() {
            return;
        }
        let request = match self.session.with_untracked(|s| s.save_request()) {
            Ok(request) => request,
            Err(blocked) => {
                self.status.set(StatusMessage::warning(blocked.to_string()));
                return;
            }
        };

        self.is_saving.set(true);
        self.status.set(StatusMessage::info("Guardando en SAP..."));
        log::info!("saving {} lines", request.items.len());

        let vm = *self;
        spawn_local(async move {
            match model::save_batch(&request).await {
                Ok(document) => {
                    log::info!("SAP document {} created", document);
                    vm.reset_command();
                    vm.status.set(StatusMessage::success(format!(
                        "¡Datos guardados! Documento SAP: {} ({})",
                        document,
                        format_date(&request.header.posting_date)
                    )));
                }
                Err(e) => vm.report_remote_error(e),
            }
            vm.is_saving.set(false);
        });
    }

    pub fn reset_command(&self) {
        self.last_raw.set(String::new());
        self.last_parsed.set(String::new());
        self.diagnostics.set(Vec::new());
        if let Some(update) = self.session.try_update(|s| s.reset()) {
            self.apply_arming(update);
        }
    }

    /// Logout: camera off, batch dropped
    pub fn shutdown(&self) {
        self.stop_scanner();
        self.session.update(|s| {
            s.reset();
        });
    }
}

impl Default for ScanViewModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Status line text; diagnostics are listed separately under it
fn status_text(error: &RemoteError) -> String {
    let origin = if error.is_network() {
        "Error de red"
    } else {
        "Error SAP"
    };
    match error.operation {
        RemoteOperation::Save => format!("Error al guardar. {}: {}", origin, error.message),
        _ => format!("{}: {}", origin, error.message),
    }
}
