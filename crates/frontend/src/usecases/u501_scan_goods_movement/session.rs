//! Scan session: the in-memory batch between a reset and a save
//!
//! Owns the header form, the cooldown and arming state machines, the
//! deduplicated line records and the document pin. Pure state: the view
//! model drives the scanner, the timers and the network around it.

use std::collections::HashMap;

use contracts::domain::a001_movement_tag::{self, DocumentKey, MalformedTokenError, ScanIdentity, ScannedToken};
use contracts::domain::a002_movement_line::LineRecord;
use contracts::usecases::u501_scan_goods_movement::{
    HeaderField, MovementHeader, SaveBatchRequest, SaveBlocked,
};

use crate::shared::date_utils::today_iso;

/// Окно после скана, в течение которого новые сканы игнорируются
pub const COOLDOWN_MS: u32 = 2000;

// ============================================================================
// State machines
// ============================================================================

/// Handle of one cooldown window; only the newest ticket can expire it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CooldownTicket(u64);

/// Batch generation, bumped by every reset. A fetch answer stamped with an
/// older generation belongs to a discarded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionGeneration(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Idle,
    Cooling(CooldownTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Disarmed,
    Armed,
}

/// Result of a header mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderUpdate {
    pub arm: ArmState,
    /// The arm state differs from the one before the mutation
    pub arm_changed: bool,
    pub reservation_visible: bool,
}

// ============================================================================
// Outcomes
// ============================================================================

/// What the caller has to do with an accepted scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    /// New identity: fetch the line from the backend, then `record_scanned_line`
    FetchNeeded(ScannedToken),
    /// Identity already in the batch, no network call
    Duplicate(ScannedToken),
    Malformed(MalformedTokenError),
}

/// Accepted scan; every accepted scan opened a cooldown window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub decision: ScanDecision,
    pub cooldown: CooldownTicket,
    /// Batch the scan was accepted into
    pub generation: SessionGeneration,
}

/// Scan ignored without any state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    CoolingDown,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::CoolingDown => write!(f, "scan ignored during cooldown"),
        }
    }
}

impl std::error::Error for ScanError {}

/// Line from a different document than the one pinned by the first line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedDocumentWarning {
    pub pinned: DocumentKey,
    pub found: DocumentKey,
}

impl std::fmt::Display for MixedDocumentWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "¡Advertencia! Documento o año diferente ({} ≠ {}). Solo se procesará el primero.",
            self.found, self.pinned
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Inserted,
    Replaced,
    /// Recorded anyway
    MixedDocument(MixedDocumentWarning),
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScanSession {
    header: MovementHeader,
    reservation_visible: bool,
    arm: ArmState,

    lines: Vec<(ScanIdentity, LineRecord)>,
    positions: HashMap<ScanIdentity, usize>,
    document_pin: Option<DocumentKey>,

    cooldown: CooldownState,
    last_ticket: u64,
    scanning: bool,
    generation: u64,
}

impl ScanSession {
    /// Empty session, posting date preset to today
    pub fn new() -> Self {
        Self::with_posting_date(today_iso())
    }

    pub fn with_posting_date(posting_date: impl Into<String>) -> Self {
        let mut session = Self {
            header: MovementHeader::with_posting_date(posting_date),
            reservation_visible: false,
            arm: ArmState::Disarmed,
            lines: Vec::new(),
            positions: HashMap::new(),
            document_pin: None,
            cooldown: CooldownState::Idle,
            last_ticket: 0,
            scanning: false,
            generation: 0,
        };
        session.reevaluate_header();
        session
    }

    // ------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------

    pub fn header(&self) -> &MovementHeader {
        &self.header
    }

    /// Store a header value and re-derive arming and the reservation flag
    pub fn set_header_field(&mut self, field: HeaderField, value: impl Into<String>) -> HeaderUpdate {
        self.header.set(field, value);
        self.reevaluate_header()
    }

    /// Re-derive arming and the reservation flag from the current header.
    ///
    /// Hiding the reservation flag also unchecks it.
    pub fn reevaluate_header(&mut self) -> HeaderUpdate {
        let previous = self.arm;
        self.arm = if self.header.is_ready() {
            ArmState::Armed
        } else {
            ArmState::Disarmed
        };

        self.reservation_visible = self.header.reservation_applies();
        if !self.reservation_visible {
            self.header.is_reservation_checked = false;
        }

        HeaderUpdate {
            arm: self.arm,
            arm_changed: previous != self.arm,
            reservation_visible: self.reservation_visible,
        }
    }

    /// Returns whether the value was taken; ignored while the flag is hidden
    pub fn set_reservation_checked(&mut self, checked: bool) -> bool {
        if !self.reservation_visible {
            return false;
        }
        self.header.is_reservation_checked = checked;
        true
    }

    pub fn reservation_visible(&self) -> bool {
        self.reservation_visible
    }

    pub fn arm_state(&self) -> ArmState {
        self.arm
    }

    pub fn is_armed(&self) -> bool {
        self.arm == ArmState::Armed
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    /// Decide what to do with one decoded QR text.
    ///
    /// While cooling down the scan is dropped with no state change. Otherwise
    /// a new cooldown window starts whatever the decision, duplicates and
    /// malformed reads included.
    pub fn submit_scan(&mut self, raw: &str) -> Result<ScanOutcome, ScanError> {
        if self.is_cooling_down() {
            return Err(ScanError::CoolingDown);
        }

        let decision = match a001_movement_tag::parse(raw) {
            Err(e) => ScanDecision::Malformed(e),
            Ok(token) if self.positions.contains_key(&token.identity()) => {
                ScanDecision::Duplicate(token)
            }
            Ok(token) => ScanDecision::FetchNeeded(token),
        };

        let cooldown = self.start_cooldown();
        Ok(ScanOutcome {
            decision,
            cooldown,
            generation: self.generation(),
        })
    }

    fn start_cooldown(&mut self) -> CooldownTicket {
        self.last_ticket += 1;
        let ticket = CooldownTicket(self.last_ticket);
        self.cooldown = CooldownState::Cooling(ticket);
        ticket
    }

    /// Timer expiry. A stale ticket (superseded window) is ignored.
    pub fn end_cooldown(&mut self, ticket: CooldownTicket) -> bool {
        if self.cooldown == CooldownState::Cooling(ticket) {
            self.cooldown = CooldownState::Idle;
            true
        } else {
            false
        }
    }

    pub fn cooldown_state(&self) -> CooldownState {
        self.cooldown
    }

    pub fn is_cooling_down(&self) -> bool {
        matches!(self.cooldown, CooldownState::Cooling(_))
    }

    /// Mirrors whether the camera capability is running
    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    /// Insert or overwrite the line of `identity`, keeping its first position.
    ///
    /// The first line of the batch pins its document; a line of another
    /// document is still recorded and reported as `MixedDocument`.
    pub fn record_line(&mut self, identity: ScanIdentity, record: LineRecord) -> LineOutcome {
        let key = record.document_key();
        let mixed = match &self.document_pin {
            None => {
                self.document_pin = Some(key);
                None
            }
            Some(pinned) if *pinned != key => Some(MixedDocumentWarning {
                pinned: pinned.clone(),
                found: key,
            }),
            Some(_) => None,
        };

        let replaced = match self.positions.get(&identity) {
            Some(&position) => {
                self.lines[position].1 = record;
                true
            }
            None => {
                self.positions.insert(identity.clone(), self.lines.len());
                self.lines.push((identity, record));
                false
            }
        };

        match (mixed, replaced) {
            (Some(warning), _) => LineOutcome::MixedDocument(warning),
            (None, true) => LineOutcome::Replaced,
            (None, false) => LineOutcome::Inserted,
        }
    }

    /// Record the backend line for a scanned token, attaching the token's
    /// terminal location.
    pub fn record_scanned_line(&mut self, token: &ScannedToken, mut record: LineRecord) -> LineOutcome {
        record.sunmi_location = token.sunmi_location.clone();
        self.record_line(token.identity(), record)
    }

    /// `record_scanned_line` for a fetch answer; `None` when the batch the
    /// scan belonged to was reset meanwhile, nothing is recorded then
    pub fn record_fetched_line(
        &mut self,
        generation: SessionGeneration,
        token: &ScannedToken,
        record: LineRecord,
    ) -> Option<LineOutcome> {
        if generation != self.generation() {
            return None;
        }
        Some(self.record_scanned_line(token, record))
    }

    pub fn generation(&self) -> SessionGeneration {
        SessionGeneration(self.generation)
    }

    pub fn contains(&self, identity: &ScanIdentity) -> bool {
        self.positions.contains_key(identity)
    }

    pub fn get(&self, identity: &ScanIdentity) -> Option<&LineRecord> {
        self.positions.get(identity).map(|&i| &self.lines[i].1)
    }

    /// Lines in first-insertion order
    pub fn lines(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn document_pin(&self) -> Option<&DocumentKey> {
        self.document_pin.as_ref()
    }

    /// Request for the save endpoint, refused when the batch cannot be saved
    pub fn save_request(&self) -> Result<SaveBatchRequest, SaveBlocked> {
        SaveBatchRequest::new(&self.header, self.lines().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Clear the batch and the header, posting date back to today
    pub fn reset(&mut self) -> HeaderUpdate {
        self.reset_with_posting_date(today_iso())
    }

    /// The cooldown goes back to idle, so a pending timer finds its ticket
    /// stale. The scanning flag is left to the caller, which stops the
    /// camera once the returned update reports `Disarmed`.
    pub fn reset_with_posting_date(&mut self, posting_date: impl Into<String>) -> HeaderUpdate {
        self.lines.clear();
        self.positions.clear();
        self.document_pin = None;
        self.cooldown = CooldownState::Idle;
        self.generation += 1;
        self.header = MovementHeader::with_posting_date(posting_date);
        self.reevaluate_header()
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(document: &str, year: &str, line: &str) -> LineRecord {
        LineRecord::from_payload(json!({"MBLNR": document, "MJAHR": year, "ZEILE": line}))
    }

    fn armed_session() -> ScanSession {
        let mut session = ScanSession::with_posting_date("2024-05-02");
        session.set_header_field(HeaderField::MovementCode, "221");
        session.set_header_field(HeaderField::Warehouse, "0001");
        session.set_header_field(HeaderField::Plant, "1000");
        session
    }

    fn expire(session: &mut ScanSession, outcome: &ScanOutcome) {
        assert!(session.end_cooldown(outcome.cooldown));
    }

    #[test]
    fn test_new_session_is_empty_and_disarmed() {
        let session = ScanSession::with_posting_date("2024-05-02");
        assert!(session.is_empty());
        assert_eq!(session.arm_state(), ArmState::Disarmed);
        assert_eq!(session.cooldown_state(), CooldownState::Idle);
        assert_eq!(session.header().posting_date, "2024-05-02");
        assert!(session.document_pin().is_none());
    }

    #[test]
    fn test_header_arms_and_disarms() {
        let mut session = ScanSession::with_posting_date("2024-05-02");
        let update = session.set_header_field(HeaderField::MovementCode, "221");
        assert_eq!(update.arm, ArmState::Disarmed);
        assert!(!update.arm_changed);

        session.set_header_field(HeaderField::Warehouse, "0001");
        let update = session.set_header_field(HeaderField::Plant, "1000");
        assert_eq!(update.arm, ArmState::Armed);
        assert!(update.arm_changed);

        for field in HeaderField::REQUIRED {
            let mut s = session.clone();
            let update = s.set_header_field(field, "  ");
            assert_eq!(update.arm, ArmState::Disarmed, "{:?}", field);
            assert!(update.arm_changed);
        }
    }

    #[test]
    fn test_arming_not_affected_by_cooldown() {
        let mut session = armed_session();
        session.submit_scan("garbage").unwrap();
        assert!(session.is_cooling_down());
        assert!(session.is_armed());
        let update = session.set_header_field(HeaderField::Warehouse, "");
        assert_eq!(update.arm, ArmState::Disarmed);
        assert!(session.is_cooling_down());
    }

    #[test]
    fn test_reservation_flag_scenario() {
        let mut session = armed_session();
        let token = contracts::domain::a001_movement_tag::parse("5000001234|2024|10|221|Q").unwrap();
        assert_eq!(token.move_type, "221");

        let update = session.set_header_field(HeaderField::SpecialStockIndicator, token.special_stock_indicator);
        assert!(update.reservation_visible);
        assert!(session.set_reservation_checked(true));
        assert!(session.header().is_reservation_checked);

        // Выключение флага сбрасывает отметку
        let update = session.set_header_field(HeaderField::SpecialStockIndicator, "K");
        assert!(!update.reservation_visible);
        assert!(!session.header().is_reservation_checked);
        assert!(!session.set_reservation_checked(true));
        assert!(!session.header().is_reservation_checked);
    }

    #[test]
    fn test_reservation_indicator_case_insensitive() {
        let mut session = armed_session();
        let update = session.set_header_field(HeaderField::SpecialStockIndicator, "q");
        assert!(update.reservation_visible);
    }

    #[test]
    fn test_new_identity_needs_fetch() {
        let mut session = armed_session();
        let outcome = session.submit_scan("5000001234|2024|10|221|Q|A-01").unwrap();
        match outcome.decision {
            ScanDecision::FetchNeeded(token) => {
                assert_eq!(token.identity().as_str(), "5000001234|2024|10");
                assert_eq!(token.sunmi_location, "A-01");
            }
            other => panic!("unexpected decision {:?}", other),
        }
        // Вставка остаётся за вызывающим
        assert!(session.is_empty());
    }

    #[test]
    fn test_scan_during_cooldown_is_ignored() {
        let mut session = armed_session();
        let first = session.submit_scan("5000001234|2024|10|221|Q").unwrap();
        let before = session.clone();

        assert_eq!(session.submit_scan("5000001234|2024|20|221|Q"), Err(ScanError::CoolingDown));
        assert_eq!(session.submit_scan("bad"), Err(ScanError::CoolingDown));
        assert_eq!(session.cooldown_state(), before.cooldown_state());
        assert_eq!(session.len(), before.len());

        expire(&mut session, &first);
        assert_eq!(session.cooldown_state(), CooldownState::Idle);
        assert!(session.submit_scan("5000001234|2024|20|221|Q").is_ok());
    }

    #[test]
    fn test_malformed_scan_starts_cooldown() {
        let mut session = armed_session();
        let outcome = session.submit_scan("1|2|3").unwrap();
        match &outcome.decision {
            ScanDecision::Malformed(e) => assert_eq!(e.segments, 3),
            other => panic!("unexpected decision {:?}", other),
        }
        assert!(session.is_cooling_down());
        assert_eq!(session.submit_scan("5000001234|2024|10|221|Q"), Err(ScanError::CoolingDown));
    }

    #[test]
    fn test_duplicate_never_fetches_and_cools_down() {
        let mut session = armed_session();
        let raw = "5000001234|2024|10|221|Q";

        let first = session.submit_scan(raw).unwrap();
        let token = match &first.decision {
            ScanDecision::FetchNeeded(token) => token.clone(),
            other => panic!("unexpected decision {:?}", other),
        };
        session.record_scanned_line(&token, record("5000001234", "2024", "0010"));
        expire(&mut session, &first);

        // Другой move type и место хранения: та же идентичность
        let second = session.submit_scan("5000001234|2024|10|261|K|B-02").unwrap();
        assert!(matches!(second.decision, ScanDecision::Duplicate(_)));
        assert!(session.is_cooling_down());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_stale_ticket_does_not_end_newer_window() {
        let mut session = armed_session();
        let first = session.submit_scan("x").unwrap();
        expire(&mut session, &first);
        let second = session.submit_scan("y").unwrap();

        assert!(!session.end_cooldown(first.cooldown));
        assert!(session.is_cooling_down());
        assert!(session.end_cooldown(second.cooldown));
        assert!(!session.end_cooldown(second.cooldown));
    }

    #[test]
    fn test_record_attaches_location_once() {
        let mut session = armed_session();
        let token = contracts::domain::a001_movement_tag::parse("5000001234|2024|10|221|Q|R-7").unwrap();
        let mut from_backend = record("5000001234", "2024", "0010");
        from_backend.sunmi_location = "ignored".to_string();

        assert_eq!(session.record_scanned_line(&token, from_backend), LineOutcome::Inserted);
        assert_eq!(session.get(&token.identity()).unwrap().sunmi_location, "R-7");
    }

    #[test]
    fn test_overwrite_keeps_first_position() {
        let mut session = armed_session();
        let a = ScanIdentity::new("5000001234", "2024", "10");
        let b = ScanIdentity::new("5000001234", "2024", "20");

        session.record_line(a.clone(), record("5000001234", "2024", "0010"));
        session.record_line(b.clone(), record("5000001234", "2024", "0020"));
        let mut updated = record("5000001234", "2024", "0010");
        updated.quantity = "7".to_string();
        assert_eq!(session.record_line(a.clone(), updated), LineOutcome::Replaced);

        let lines: Vec<&LineRecord> = session.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, "0010");
        assert_eq!(lines[0].quantity, "7");
        assert_eq!(lines[1].line, "0020");
    }

    #[test]
    fn test_mixed_document_scenario() {
        let mut session = armed_session();
        let first = ScanIdentity::new("5000001234", "2024", "10");
        let second = ScanIdentity::new("5000009999", "2024", "10");

        assert_eq!(
            session.record_line(first.clone(), record("5000001234", "2024", "0010")),
            LineOutcome::Inserted
        );
        let outcome = session.record_line(second.clone(), record("5000009999", "2024", "0010"));
        assert_eq!(
            outcome,
            LineOutcome::MixedDocument(MixedDocumentWarning {
                pinned: DocumentKey::new("5000001234", "2024"),
                found: DocumentKey::new("5000009999", "2024"),
            })
        );

        assert!(session.contains(&first));
        assert!(session.contains(&second));
        assert_eq!(session.len(), 2);
        assert_eq!(session.document_pin(), Some(&DocumentKey::new("5000001234", "2024")));
    }

    #[test]
    fn test_year_mismatch_is_mixed_document() {
        let mut session = armed_session();
        session.record_line(ScanIdentity::new("1", "2023", "1"), record("1", "2023", "1"));
        let outcome = session.record_line(ScanIdentity::new("1", "2024", "1"), record("1", "2024", "1"));
        assert!(matches!(outcome, LineOutcome::MixedDocument(_)));
    }

    #[test]
    fn test_is_empty_after_record() {
        let mut session = armed_session();
        assert!(session.is_empty());
        session.record_line(ScanIdentity::new("5000001234", "2024", "10"), record("5000001234", "2024", "0010"));
        assert!(!session.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = armed_session();
        session.set_header_field(HeaderField::SpecialStockIndicator, "Q");
        session.set_reservation_checked(true);
        session.set_header_field(HeaderField::HeaderText, "entrega");
        session.record_line(ScanIdentity::new("5000001234", "2024", "10"), record("5000001234", "2024", "0010"));

        let update = session.reset_with_posting_date("2024-06-01");
        assert!(session.is_empty());
        assert!(session.document_pin().is_none());
        assert_eq!(update.arm, ArmState::Disarmed);
        assert!(update.arm_changed);
        assert!(!update.reservation_visible);
        assert_eq!(session.header(), &MovementHeader::with_posting_date("2024-06-01"));

        // Новый пакет закрепляет новый документ
        let outcome = session.record_line(ScanIdentity::new("5000009999", "2024", "10"), record("5000009999", "2024", "0010"));
        assert_eq!(outcome, LineOutcome::Inserted);
    }

    #[test]
    fn test_reset_ends_cooldown_and_old_ticket_is_stale() {
        let mut session = armed_session();
        let outcome = session.submit_scan("5000001234|2024|10|M-1|B1").unwrap();
        assert!(session.is_cooling_down());

        session.reset_with_posting_date("2024-06-01");
        assert_eq!(session.cooldown_state(), CooldownState::Idle);
        assert!(!session.end_cooldown(outcome.cooldown));
    }

    #[test]
    fn test_fetch_answer_after_reset_is_dropped() {
        let mut session = armed_session();
        let outcome = session.submit_scan("5000001234|2024|10|221|Q").unwrap();
        let ScanDecision::FetchNeeded(token) = outcome.decision.clone() else {
            panic!("expected fetch");
        };

        // Reset while the fetch is in flight, then a new batch is started
        session.reset_with_posting_date("2024-06-01");
        session.set_header_field(HeaderField::MovementCode, "221");
        session.set_header_field(HeaderField::Warehouse, "0001");
        session.set_header_field(HeaderField::Plant, "1000");

        let late = session.record_fetched_line(
            outcome.generation,
            &token,
            record("5000001234", "2024", "0010"),
        );
        assert_eq!(late, None);
        assert!(session.is_empty());
        assert!(session.document_pin().is_none());

        let fresh = session.submit_scan("5000009999|2024|10|221|Q").unwrap();
        let ScanDecision::FetchNeeded(token) = fresh.decision.clone() else {
            panic!("expected fetch");
        };
        let recorded = session.record_fetched_line(
            fresh.generation,
            &token,
            record("5000009999", "2024", "0010"),
        );
        assert_eq!(recorded, Some(LineOutcome::Inserted));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_reset_then_is_empty_always() {
        let mut session = ScanSession::new();
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session.header().posting_date.len(), 10);
    }

    #[test]
    fn test_save_request_follows_session() {
        let mut session = armed_session();
        assert_eq!(session.save_request(), Err(SaveBlocked::Empty));

        session.record_line(ScanIdentity::new("5000001234", "2024", "20"), record("5000001234", "2024", "0020"));
        session.record_line(ScanIdentity::new("5000001234", "2024", "10"), record("5000001234", "2024", "0010"));
        let request = session.save_request().unwrap();
        assert_eq!(request.header.movement_code, "221");
        assert_eq!(request.items[0].line, "0020");
        assert_eq!(request.items[1].line, "0010");

        session.set_header_field(HeaderField::Plant, "");
        assert!(matches!(session.save_request(), Err(SaveBlocked::MissingHeader(_))));
    }
}
