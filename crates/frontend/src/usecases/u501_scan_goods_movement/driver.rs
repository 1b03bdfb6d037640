//! Scanner lifecycle over any [`ScannerCapability`]
//!
//! Start and stop requests first record the wanted state, then bring the
//! camera to it under one async lock. A stop issued while a start is still
//! pending waits for that start to settle and then stops the camera; the
//! camera always ends in the state of the last request.

use std::cell::Cell;

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::lock::Mutex;
use futures::StreamExt;

use super::scanner::ScannerCapability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Что изменил запрос
pub enum Transition {
    /// Camera started; decoded texts arrive until the camera stops
    Started(UnboundedReceiver<String>),
    Stopped,
    /// Already in the wanted state, or superseded by a later request
    Unchanged,
}

pub struct ScannerDriver<S> {
    scanner: S,
    state: Cell<ScannerState>,
    wanted: Cell<bool>,
    transition: Mutex<()>,
}

impl<S: ScannerCapability> ScannerDriver<S> {
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            state: Cell::new(ScannerState::Stopped),
            wanted: Cell::new(false),
            transition: Mutex::new(()),
        }
    }

    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    pub fn state(&self) -> ScannerState {
        self.state.get()
    }

    /// Last request was a start
    pub fn wants_running(&self) -> bool {
        self.wanted.get()
    }

    pub async fn request_start(&self) -> Result<Transition, String> {
        self.wanted.set(true);
        let _guard = self.transition.lock().await;
        if !self.wanted.get() || self.state.get() == ScannerState::Running {
            return Ok(Transition::Unchanged);
        }

        let (sink, decoded) = mpsc::unbounded();
        self.state.set(ScannerState::Starting);
        match self.scanner.start(sink).await {
            Ok(()) => {
                self.state.set(ScannerState::Running);
                Ok(Transition::Started(decoded))
            }
            Err(e) => {
                self.state.set(ScannerState::Stopped);
                self.wanted.set(false);
                Err(e)
            }
        }
    }

    /// Idempotent; a no-op when the camera is not running
    pub async fn request_stop(&self) -> Result<Transition, String> {
        self.wanted.set(false);
        let _guard = self.transition.lock().await;
        if self.wanted.get() || self.state.get() == ScannerState::Stopped {
            return Ok(Transition::Unchanged);
        }

        self.state.set(ScannerState::Stopping);
        match self.scanner.stop().await {
            Ok(()) => {
                self.state.set(ScannerState::Stopped);
                Ok(Transition::Stopped)
            }
            Err(e) => {
                // Камера всё ещё работает, следующий stop повторит попытку
                self.state.set(ScannerState::Running);
                Err(e)
            }
        }
    }
}

/// Hand decoded texts to `on_text` one at a time until the camera stops
pub async fn drain_decoded(
    mut decoded: UnboundedReceiver<String>,
    mut on_text: impl FnMut(String),
) {
    while let Some(text) = decoded.next().await {
        on_text(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    use super::super::scanner::DecodeSink;
    use super::super::session::{ScanError, ScanSession};
    use contracts::usecases::u501_scan_goods_movement::HeaderField;

    /// Camera stand-in; a gated start stays pending until the gate opens
    #[derive(Default)]
    struct FakeScanner {
        gate: RefCell<Option<oneshot::Receiver<()>>>,
        sink: RefCell<Option<DecodeSink>>,
        running: Cell<bool>,
        starts: Cell<u32>,
        stops: Cell<u32>,
        fail_start: Cell<bool>,
        fail_stop: Cell<bool>,
    }

    impl FakeScanner {
        fn gated(gate: oneshot::Receiver<()>) -> Self {
            Self {
                gate: RefCell::new(Some(gate)),
                ..Self::default()
            }
        }

        fn emit(&self, text: &str) -> bool {
            self.sink
                .borrow()
                .as_ref()
                .map(|sink| sink.unbounded_send(text.to_string()).is_ok())
                .unwrap_or(false)
        }
    }

    impl ScannerCapability for FakeScanner {
        async fn start(&self, sink: DecodeSink) -> Result<(), String> {
            self.starts.set(self.starts.get() + 1);
            let gate = self.gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_start.get() {
                return Err("NotAllowedError: Permission denied".to_string());
            }
            *self.sink.borrow_mut() = Some(sink);
            self.running.set(true);
            Ok(())
        }

        async fn stop(&self) -> Result<(), String> {
            self.stops.set(self.stops.get() + 1);
            if self.fail_stop.get() {
                return Err("AbortError: stop rejected".to_string());
            }
            self.sink.borrow_mut().take();
            self.running.set(false);
            Ok(())
        }

        fn is_scanning(&self) -> bool {
            self.running.get()
        }
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let driver = ScannerDriver::new(FakeScanner::default());
        let result = block_on(driver.request_stop()).unwrap();

        assert!(matches!(result, Transition::Unchanged));
        assert_eq!(driver.scanner().stops.get(), 0);
        assert_eq!(driver.state(), ScannerState::Stopped);
    }

    #[test]
    fn test_double_stop_stops_once() {
        let driver = ScannerDriver::new(FakeScanner::default());
        assert!(matches!(
            block_on(driver.request_start()).unwrap(),
            Transition::Started(_)
        ));

        assert!(matches!(block_on(driver.request_stop()).unwrap(), Transition::Stopped));
        assert!(matches!(block_on(driver.request_stop()).unwrap(), Transition::Unchanged));
        assert_eq!(driver.scanner().stops.get(), 1);
        assert!(!driver.scanner().is_scanning());
    }

    #[test]
    fn test_repeated_start_keeps_one_camera() {
        let driver = ScannerDriver::new(FakeScanner::default());
        block_on(driver.request_start()).unwrap();
        assert!(matches!(block_on(driver.request_start()).unwrap(), Transition::Unchanged));
        assert_eq!(driver.scanner().starts.get(), 1);
        assert_eq!(driver.state(), ScannerState::Running);
    }

    #[test]
    fn test_stop_during_pending_start_stops_camera() {
        let (open_gate, gate) = oneshot::channel();
        let driver = Rc::new(ScannerDriver::new(FakeScanner::gated(gate)));
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let started = Rc::new(RefCell::new(None));
        let stopped = Rc::new(RefCell::new(None));

        let (d, slot) = (driver.clone(), started.clone());
        spawner
            .spawn_local(async move {
                *slot.borrow_mut() = Some(d.request_start().await);
            })
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(driver.state(), ScannerState::Starting);

        let (d, slot) = (driver.clone(), stopped.clone());
        spawner
            .spawn_local(async move {
                *slot.borrow_mut() = Some(d.request_stop().await);
            })
            .unwrap();
        pool.run_until_stalled();
        // Stop waits for the pending start
        assert_eq!(driver.scanner().stops.get(), 0);
        assert!(stopped.borrow().is_none());

        open_gate.send(()).unwrap();
        pool.run_until_stalled();

        let decoded = match started.borrow_mut().take() {
            Some(Ok(Transition::Started(decoded))) => decoded,
            _ => panic!("start should have completed"),
        };
        assert!(matches!(
            stopped.borrow_mut().take(),
            Some(Ok(Transition::Stopped))
        ));
        assert!(!driver.scanner().is_scanning());
        assert_eq!(driver.scanner().stops.get(), 1);
        assert_eq!(driver.state(), ScannerState::Stopped);
        assert!(!driver.wants_running());

        // Callbacks released with the camera: the decode channel is closed
        let mut decoded = decoded;
        assert_eq!(block_on(decoded.next()), None);
    }

    #[test]
    fn test_failed_start_can_be_retried() {
        let driver = ScannerDriver::new(FakeScanner::default());
        driver.scanner().fail_start.set(true);

        assert!(block_on(driver.request_start()).is_err());
        assert_eq!(driver.state(), ScannerState::Stopped);
        assert!(!driver.wants_running());

        driver.scanner().fail_start.set(false);
        assert!(matches!(
            block_on(driver.request_start()).unwrap(),
            Transition::Started(_)
        ));
        assert_eq!(driver.scanner().starts.get(), 2);
    }

    #[test]
    fn test_failed_stop_is_reported_and_retried() {
        let driver = ScannerDriver::new(FakeScanner::default());
        block_on(driver.request_start()).unwrap();
        driver.scanner().fail_stop.set(true);

        let err = block_on(driver.request_stop()).err().unwrap();
        assert!(err.contains("stop rejected"));
        // Camera still on: the next stop tries again instead of being skipped
        assert_eq!(driver.state(), ScannerState::Running);
        assert!(driver.scanner().emit("5000001234|2024|10|221|Q"));

        driver.scanner().fail_stop.set(false);
        assert!(matches!(block_on(driver.request_stop()).unwrap(), Transition::Stopped));
        assert_eq!(driver.scanner().stops.get(), 2);
        assert!(!driver.scanner().is_scanning());
    }

    #[test]
    fn test_decoded_texts_reach_session_through_cooldown() {
        let driver = ScannerDriver::new(FakeScanner::default());
        let decoded = match block_on(driver.request_start()).unwrap() {
            Transition::Started(decoded) => decoded,
            _ => panic!("expected start"),
        };

        assert!(driver.scanner().emit("5000001234|2024|10|221|Q"));
        assert!(driver.scanner().emit("5000001234|2024|20|221|Q"));
        block_on(driver.request_stop()).unwrap();
        assert!(!driver.scanner().emit("5000001234|2024|30|221|Q"));

        let mut session = ScanSession::with_posting_date("2024-05-02");
        session.set_header_field(HeaderField::MovementCode, "221");
        session.set_header_field(HeaderField::Warehouse, "0001");
        session.set_header_field(HeaderField::Plant, "1000");

        let mut results = Vec::new();
        block_on(drain_decoded(decoded, |text| {
            results.push(session.submit_scan(&text))
        }));

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(results[1], Err(ScanError::CoolingDown));

        // The timer of the first scan reopens the session
        assert!(session.end_cooldown(first.cooldown));
        assert!(!session.is_cooling_down());
    }
}
