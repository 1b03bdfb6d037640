//! u501: scanning goods-movement tags into a batch and posting it to SAP
//!
//! - session.rs: scan session state (header, cooldown, dedup, document pin)
//! - scanner.rs: camera capability over html5-qrcode
//! - driver.rs: serialized start/stop of the camera, decode channel drain
//! - model.rs: API functions (fetch line, save batch)
//! - view_model.rs: ViewModel wiring session, scanner, timers and API
//! - view.rs: Leptos component (pure UI)

pub mod driver;
pub mod model;
pub mod scanner;
pub mod session;
mod view;
mod view_model;

pub use view::ScanGoodsMovementPage;
pub use view_model::ScanViewModel;
