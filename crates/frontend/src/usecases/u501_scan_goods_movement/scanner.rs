//! Camera scanning capability
//!
//! Decoding is delegated to the `html5-qrcode` JS library loaded by
//! `index.html`. Decoded texts are pushed into a channel; the view model
//! consumes them one at a time. Start and stop never overlap: they are
//! serialized by `ScannerDriver`.

use std::cell::RefCell;

use futures::channel::mpsc::UnboundedSender;
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// DOM id of the element the camera preview is rendered into
pub const READER_ELEMENT_ID: &str = "reader";

/// Frames per second analysed by the decoder
const SCAN_FPS: f64 = 10.0;

/// Share of the shorter preview side used by the scan box
const QR_BOX_RATIO: f64 = 0.8;

/// Sending end of decoded texts
pub type DecodeSink = UnboundedSender<String>;

/// Внешняя возможность сканирования: запускается, шлёт декодированные
/// строки, останавливается
#[allow(async_fn_in_trait)]
pub trait ScannerCapability {
    async fn start(&self, sink: DecodeSink) -> Result<(), String>;

    /// Safe to call when not running. Dropping the sink on success closes
    /// the decode channel.
    async fn stop(&self) -> Result<(), String>;

    fn is_scanning(&self) -> bool;
}

/// JS binding для html5-qrcode
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Html5Qrcode)]
    #[derive(Clone)]
    type Html5Qrcode;

    #[wasm_bindgen(constructor, js_class = "Html5Qrcode")]
    fn new(element_id: &str) -> Html5Qrcode;

    #[wasm_bindgen(method, catch, js_class = "Html5Qrcode", js_name = start)]
    fn start_camera(
        this: &Html5Qrcode,
        camera: &JsValue,
        config: &JsValue,
        on_success: &Closure<dyn FnMut(String, JsValue)>,
        on_error: &Closure<dyn FnMut(JsValue)>,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_class = "Html5Qrcode", js_name = stop)]
    fn stop_camera(this: &Html5Qrcode) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, getter, js_class = "Html5Qrcode", js_name = isScanning)]
    fn is_scanning(this: &Html5Qrcode) -> bool;
}

/// Closures handed to JS, kept alive while the camera runs
struct Callbacks {
    _on_success: Closure<dyn FnMut(String, JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
    _qr_box: Closure<dyn FnMut(f64, f64) -> JsValue>,
}

/// Сканер на основе html5-qrcode; новый экземпляр библиотеки на каждый запуск
#[derive(Default)]
pub struct Html5QrScanner {
    instance: RefCell<Option<Html5Qrcode>>,
    callbacks: RefCell<Option<Callbacks>>,
}

impl Html5QrScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_config(qr_box: &Closure<dyn FnMut(f64, f64) -> JsValue>) -> Result<JsValue, JsValue> {
        let config = Object::new();
        Reflect::set(&config, &"fps".into(), &SCAN_FPS.into())?;
        Reflect::set(&config, &"qrbox".into(), qr_box.as_ref())?;
        Ok(config.into())
    }

    fn rear_camera() -> Result<JsValue, JsValue> {
        let camera = Object::new();
        Reflect::set(&camera, &"facingMode".into(), &"environment".into())?;
        Ok(camera.into())
    }
}

impl ScannerCapability for Html5QrScanner {
    async fn start(&self, sink: DecodeSink) -> Result<(), String> {
        if self.is_scanning() {
            return Ok(());
        }

        let on_success = Closure::<dyn FnMut(String, JsValue)>::new(move |text: String, _result: JsValue| {
            // Канал закрыт: потребитель остановлен, скан просто теряется
            let _ = sink.unbounded_send(text);
        });
        // Ошибки декодирования приходят на каждом кадре без кода, не логируем
        let on_error = Closure::<dyn FnMut(JsValue)>::new(|_err: JsValue| {});
        let qr_box = Closure::<dyn FnMut(f64, f64) -> JsValue>::new(|width: f64, height: f64| {
            let side = width.min(height) * QR_BOX_RATIO;
            let size = Object::new();
            let _ = Reflect::set(&size, &"width".into(), &side.into());
            let _ = Reflect::set(&size, &"height".into(), &side.into());
            JsValue::from(size)
        });

        let camera = Self::rear_camera().map_err(|e| format!("{:?}", e))?;
        let config = Self::build_config(&qr_box).map_err(|e| format!("{:?}", e))?;

        let instance = Html5Qrcode::new(READER_ELEMENT_ID);
        let promise = instance
            .start_camera(&camera, &config, &on_success, &on_error)
            .map_err(|e| format!("{:?}", e))?;

        *self.callbacks.borrow_mut() = Some(Callbacks {
            _on_success: on_success,
            _on_error: on_error,
            _qr_box: qr_box,
        });
        *self.instance.borrow_mut() = Some(instance);

        if let Err(e) = JsFuture::from(promise).await {
            self.instance.borrow_mut().take();
            self.callbacks.borrow_mut().take();
            return Err(e.as_string().unwrap_or_else(|| format!("{:?}", e)));
        }

        log::info!("scanner started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), String> {
        let instance = self.instance.borrow().clone();
        let Some(instance) = instance else {
            return Ok(());
        };

        if instance.is_scanning() {
            let promise = instance.stop_camera().map_err(|e| format!("{:?}", e))?;
            // Пока JS не подтвердил остановку, кадры ещё приходят в замыкания
            JsFuture::from(promise)
                .await
                .map_err(|e| e.as_string().unwrap_or_else(|| format!("{:?}", e)))?;
        }

        self.instance.borrow_mut().take();
        self.callbacks.borrow_mut().take();
        log::info!("scanner stopped");
        Ok(())
    }

    fn is_scanning(&self) -> bool {
        self.instance
            .borrow()
            .as_ref()
            .map(|instance| instance.is_scanning())
            .unwrap_or(false)
    }
}
