//! The suggestion coordinator.
//!
//! Mediates between document edits and the prediction service: decides when
//! a request goes out, which response is allowed to update the display, and
//! how an accepted candidate gets back into the buffer.
//!
//! Sequencing: every dispatched request carries a monotonically increasing
//! id, and only a response matching the most recently dispatched id may
//! touch the candidate list ("last request wins"). Requests are never
//! cancelled; late responses are discarded on arrival.

use crate::document::{Document, EditOrigin};
use crate::services::continuation_client::ContinuationClient;
use crate::services::suggest_bridge::{SuggestBridge, SuggestMessage};
use crate::words::{current_word, match_case};
use std::sync::mpsc::Sender;

/// Owns the candidate list and popup state, and drives the fetch cycle.
///
/// All methods run on the main loop; fetch threads only talk to the
/// coordinator through the bridge.
pub struct SuggestionCoordinator {
    client: ContinuationClient,
    bridge: SuggestBridge,
    next_request_id: u64,
    /// Id of the most recently dispatched request, if a response for it is
    /// still welcome.
    pending_request: Option<u64>,
    candidates: Vec<String>,
    selected: usize,
    popup_visible: bool,
}

impl SuggestionCoordinator {
    pub fn new(client: ContinuationClient) -> Self {
        Self {
            client,
            bridge: SuggestBridge::new(),
            next_request_id: 1,
            pending_request: None,
            candidates: Vec::new(),
            selected: 0,
            popup_visible: false,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn popup_visible(&self) -> bool {
        self.popup_visible
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending_request.is_some()
    }

    /// Sender into the coordinator's bridge. Fetch threads deliver their
    /// results through this.
    pub fn bridge_sender(&self) -> Sender<SuggestMessage> {
        self.bridge.sender()
    }

    pub fn hide_popup(&mut self) {
        self.popup_visible = false;
    }

    /// React to a document change notice.
    ///
    /// `System`-origin notices (our own splices) are ignored so acceptance
    /// does not loop back into a new fetch. An empty prompt hides the popup
    /// and withdraws interest in any in-flight response; otherwise a new
    /// request is dispatched for the full prompt.
    pub fn on_buffer_changed(&mut self, doc: &Document, origin: EditOrigin) {
        if origin == EditOrigin::System {
            tracing::trace!("Skipping system-origin change");
            return;
        }

        let prompt = doc.prompt();
        if prompt.is_empty() {
            self.hide_popup();
            self.pending_request = None;
            return;
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_request = Some(request_id);

        tracing::debug!("Dispatching continuation request {}", request_id);
        self.client.spawn_fetch(
            request_id,
            prompt.to_string(),
            current_word(prompt).to_string(),
            self.bridge.sender(),
        );
    }

    /// Drain the bridge and apply pending fetch results.
    ///
    /// Returns true if the candidate list or popup visibility changed.
    pub fn process_messages(&mut self) -> bool {
        let mut changed = false;
        for message in self.bridge.try_recv_all() {
            changed |= self.apply_message(message);
        }
        changed
    }

    fn apply_message(&mut self, message: SuggestMessage) -> bool {
        match message {
            SuggestMessage::Continuations {
                request_id,
                current_word,
                items,
            } => {
                if self.pending_request != Some(request_id) {
                    tracing::debug!(
                        "Ignoring stale continuation response (request_id={})",
                        request_id
                    );
                    return false;
                }
                self.pending_request = None;

                let transformed: Vec<String> = items
                    .iter()
                    .map(|c| match_case(c, &current_word))
                    .collect();

                if transformed.is_empty() {
                    self.hide_popup();
                } else {
                    self.candidates = transformed;
                    self.selected = 0;
                    self.popup_visible = true;
                }
                true
            }
            SuggestMessage::FetchFailed { request_id, error } => {
                // Log and drop: no retry, nothing surfaces to the user, the
                // displayed candidates stay as they were.
                tracing::warn!("Continuation request {} failed: {}", request_id, error);
                if self.pending_request == Some(request_id) {
                    self.pending_request = None;
                }
                false
            }
        }
    }

    pub fn select_next(&mut self) {
        if self.popup_visible && !self.candidates.is_empty() {
            self.selected = (self.selected + 1).min(self.candidates.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        if self.popup_visible {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    /// Splice the highlighted candidate into the document.
    ///
    /// Hides the popup unconditionally afterward and withdraws interest in
    /// any in-flight response. Returns true if a candidate was accepted.
    pub fn accept(&mut self, doc: &mut Document) -> bool {
        if !self.popup_visible {
            return false;
        }
        let accepted = match self.candidates.get(self.selected) {
            Some(candidate) => {
                let candidate = candidate.clone();
                tracing::debug!("Accepted suggestion {:?}", candidate);
                doc.replace_current_word(&candidate);
                true
            }
            None => false,
        };
        self.hide_popup();
        self.pending_request = None;
        accepted
    }

    /// Accept the candidate at `index` (mouse selection path).
    pub fn accept_index(&mut self, doc: &mut Document, index: usize) -> bool {
        if !self.popup_visible || index >= self.candidates.len() {
            return false;
        }
        self.selected = index;
        self.accept(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Client pointing at a listener that never answers. Dispatched fetches
    /// hang until their timeout, well past the end of the test, so injected
    /// bridge messages are the only ones the coordinator ever sees.
    fn hanging_client() -> (ContinuationClient, std::net::TcpListener) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let client = ContinuationClient::new(
            format!("http://127.0.0.1:{port}/continuations"),
            "en_US".to_string(),
            Duration::from_secs(5),
        );
        (client, listener)
    }

    fn coordinator() -> (SuggestionCoordinator, std::net::TcpListener) {
        let (client, guard) = hanging_client();
        (SuggestionCoordinator::new(client), guard)
    }

    fn respond(co: &mut SuggestionCoordinator, request_id: u64, word: &str, items: &[&str]) {
        co.bridge_sender()
            .send(SuggestMessage::Continuations {
                request_id,
                current_word: word.to_string(),
                items: items.iter().map(|s| s.to_string()).collect(),
            })
            .unwrap();
        co.process_messages();
    }

    #[test]
    fn test_empty_prompt_issues_no_request() {
        let (mut co, _guard) = coordinator();
        let mut doc = Document::new();
        doc.insert_char('x');
        doc.backspace();
        // Prompt is empty again; the notice for the backspace must not fetch.
        let origins = doc.drain_changes();
        co.on_buffer_changed(&doc, *origins.last().unwrap());
        assert!(!co.has_pending_request());
        assert!(!co.popup_visible());
    }

    #[test]
    fn test_system_origin_is_ignored() {
        let (mut co, _guard) = coordinator();
        let mut doc = Document::from_text("wor".to_string());
        doc.replace_current_word("word");
        for origin in doc.drain_changes() {
            co.on_buffer_changed(&doc, origin);
        }
        assert!(!co.has_pending_request());
    }

    #[test]
    fn test_user_change_dispatches_request() {
        let (mut co, _guard) = coordinator();
        let mut doc = Document::new();
        doc.insert_char('h');
        for origin in doc.drain_changes() {
            co.on_buffer_changed(&doc, origin);
        }
        assert!(co.has_pending_request());
    }

    #[test]
    fn test_response_populates_candidates_with_case_matching() {
        let (mut co, _guard) = coordinator();
        let doc = Document::from_text("I like App".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);

        respond(&mut co, 1, "App", &["apple", "APRICOT"]);
        assert!(co.popup_visible());
        assert_eq!(co.candidates(), &["Apple", "APRICOT"]);
        assert_eq!(co.selected(), 0);
        assert!(!co.has_pending_request());
    }

    #[test]
    fn test_empty_continuations_hide_popup() {
        let (mut co, _guard) = coordinator();
        let doc = Document::from_text("wor".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);
        respond(&mut co, 1, "wor", &["word"]);
        assert!(co.popup_visible());

        co.on_buffer_changed(&doc, EditOrigin::User);
        respond(&mut co, 2, "wor", &[]);
        assert!(!co.popup_visible());
    }

    #[test]
    fn test_last_request_wins() {
        let (mut co, _guard) = coordinator();
        let doc_h = Document::from_text("h".to_string());
        let doc_he = Document::from_text("he".to_string());

        // Request 1 for "h", then request 2 for "he" before any response.
        co.on_buffer_changed(&doc_h, EditOrigin::User);
        co.on_buffer_changed(&doc_he, EditOrigin::User);

        // The slower response for request 1 arrives late: discarded.
        respond(&mut co, 1, "h", &["hat"]);
        assert!(!co.popup_visible());
        assert!(co.candidates().is_empty());

        // Request 2's response wins regardless of arrival order.
        respond(&mut co, 2, "he", &["hello"]);
        assert_eq!(co.candidates(), &["hello"]);

        // A duplicate of the stale response after the fact changes nothing.
        respond(&mut co, 1, "h", &["hat"]);
        assert_eq!(co.candidates(), &["hello"]);
    }

    #[test]
    fn test_fetch_failure_leaves_display_unchanged() {
        let (mut co, _guard) = coordinator();
        let doc = Document::from_text("wor".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);
        respond(&mut co, 1, "wor", &["word"]);
        assert!(co.popup_visible());

        co.on_buffer_changed(&doc, EditOrigin::User);
        co.bridge_sender()
            .send(SuggestMessage::FetchFailed {
                request_id: 2,
                error: "timeout".to_string(),
            })
            .unwrap();
        let changed = co.process_messages();
        assert!(!changed);
        assert!(co.popup_visible());
        assert_eq!(co.candidates(), &["word"]);
    }

    #[test]
    fn test_accept_splices_and_hides() {
        let (mut co, _guard) = coordinator();
        let mut doc = Document::from_text("I like app".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);
        respond(&mut co, 1, "app", &["apple"]);

        assert!(co.accept(&mut doc));
        assert_eq!(doc.text(), "I like apple ");
        assert_eq!(doc.caret(), 13);
        assert!(!co.popup_visible());
        assert!(!co.has_pending_request());
    }

    #[test]
    fn test_accept_without_popup_is_noop() {
        let (mut co, _guard) = coordinator();
        let mut doc = Document::from_text("wor".to_string());
        assert!(!co.accept(&mut doc));
        assert_eq!(doc.text(), "wor");
    }

    #[test]
    fn test_accept_index_out_of_range() {
        let (mut co, _guard) = coordinator();
        let mut doc = Document::from_text("wor".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);
        respond(&mut co, 1, "wor", &["word", "world"]);

        assert!(!co.accept_index(&mut doc, 5));
        assert!(co.popup_visible());
        assert!(co.accept_index(&mut doc, 1));
        assert_eq!(doc.text(), "world ");
    }

    #[test]
    fn test_selection_navigation_clamps() {
        let (mut co, _guard) = coordinator();
        let doc = Document::from_text("wor".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);
        respond(&mut co, 1, "wor", &["word", "world", "worst"]);

        co.select_prev();
        assert_eq!(co.selected(), 0);
        co.select_next();
        co.select_next();
        co.select_next();
        assert_eq!(co.selected(), 2);
    }

    #[test]
    fn test_empty_prompt_withdraws_pending_interest() {
        let (mut co, _guard) = coordinator();
        let doc = Document::from_text("h".to_string());
        co.on_buffer_changed(&doc, EditOrigin::User);
        assert!(co.has_pending_request());

        let empty = Document::new();
        co.on_buffer_changed(&empty, EditOrigin::User);
        assert!(!co.has_pending_request());

        // The response for the withdrawn request is stale on arrival.
        respond(&mut co, 1, "h", &["hat"]);
        assert!(!co.popup_visible());
    }
}
