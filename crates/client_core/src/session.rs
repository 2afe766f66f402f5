//! Document session controller.
//!
//! The session is a single-owner state machine. Operations that need the
//! extraction service or the disk return a [`SessionRequest`]; the caller runs
//! it (see [`execute`]) and feeds the [`SessionCompletion`] back through
//! [`DocumentSession::complete`]. Every request carries a ticket and only the
//! ticket currently pending for its kind is accepted, so late responses for a
//! replaced document or page are dropped.
//!
//! Invariant: preview text is non-empty only while a document is selected and
//! the preview fetch for the selected page token has succeeded. Playback is
//! never true while preview text is empty.

use std::{
    io,
    path::{Path, PathBuf},
};

use shared::{
    domain::{has_pdf_extension, page_options, PageToken, RequestTicket, SessionId, UtteranceId},
    error::DomainError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    document::SelectedDocument,
    extraction::{ClientError, ExtractionBackend},
    speech::SpeechEngine,
};

pub const ALERT_NO_FILE: &str = "Please select a PDF file first";
pub const ALERT_NOT_PDF: &str = "Only PDF files can be selected";
pub const ALERT_READ_FAILED: &str = "Failed to read the selected file";
pub const ALERT_PAGES_FAILED: &str = "Failed to get PDF pages";
pub const ALERT_PREVIEW_FAILED: &str = "Failed to load page text";
pub const ALERT_SPEECH_FAILED: &str = "Speech output is unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidPage(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    ReadDocument {
        ticket: RequestTicket,
        path: PathBuf,
    },
    CountPages {
        ticket: RequestTicket,
        document: SelectedDocument,
    },
    LoadPreview {
        ticket: RequestTicket,
        document: SelectedDocument,
        page: u32,
    },
}

impl SessionRequest {
    pub fn ticket(&self) -> RequestTicket {
        match self {
            SessionRequest::ReadDocument { ticket, .. }
            | SessionRequest::CountPages { ticket, .. }
            | SessionRequest::LoadPreview { ticket, .. } => *ticket,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionRequest::ReadDocument { .. } => "read_document",
            SessionRequest::CountPages { .. } => "count_pages",
            SessionRequest::LoadPreview { .. } => "load_preview",
        }
    }

    /// Failed completion for a request that never reached the worker.
    pub fn fail(self, reason: impl Into<String>) -> SessionCompletion {
        let reason = reason.into();
        match self {
            SessionRequest::ReadDocument { ticket, .. } => SessionCompletion::DocumentRead {
                ticket,
                result: Err(io::Error::other(reason)),
            },
            SessionRequest::CountPages { ticket, .. } => SessionCompletion::PageCount {
                ticket,
                result: Err(ClientError::Unavailable(reason)),
            },
            SessionRequest::LoadPreview { ticket, page, .. } => SessionCompletion::Preview {
                ticket,
                page,
                result: Err(ClientError::Unavailable(reason)),
            },
        }
    }
}

#[derive(Debug)]
pub enum SessionCompletion {
    DocumentRead {
        ticket: RequestTicket,
        result: io::Result<SelectedDocument>,
    },
    PageCount {
        ticket: RequestTicket,
        result: Result<u32, ClientError>,
    },
    Preview {
        ticket: RequestTicket,
        page: u32,
        result: Result<String, ClientError>,
    },
}

/// Runs one request to completion. No retries.
pub async fn execute<B>(backend: &B, request: SessionRequest) -> SessionCompletion
where
    B: ExtractionBackend + ?Sized,
{
    match request {
        SessionRequest::ReadDocument { ticket, path } => SessionCompletion::DocumentRead {
            ticket,
            result: SelectedDocument::load(&path).await,
        },
        SessionRequest::CountPages { ticket, document } => SessionCompletion::PageCount {
            ticket,
            result: backend.page_count(&document).await,
        },
        SessionRequest::LoadPreview {
            ticket,
            document,
            page,
        } => SessionCompletion::Preview {
            ticket,
            page,
            result: backend.page_text(&document, page).await,
        },
    }
}

pub struct DocumentSession<S> {
    speech: S,
    session_id: Option<SessionId>,
    document: Option<SelectedDocument>,
    page_count: u32,
    selected_page: PageToken,
    preview_text: String,
    playing: bool,
    current_utterance: Option<UtteranceId>,
    pending_read: Option<RequestTicket>,
    pending_count: Option<RequestTicket>,
    pending_preview: Option<(RequestTicket, u32)>,
    next_ticket: u64,
    alert: Option<String>,
}

impl<S: SpeechEngine> DocumentSession<S> {
    pub fn new(speech: S) -> Self {
        Self {
            speech,
            session_id: None,
            document: None,
            page_count: 0,
            selected_page: PageToken::All,
            preview_text: String::new(),
            playing: false,
            current_utterance: None,
            pending_read: None,
            pending_count: None,
            pending_preview: None,
            next_ticket: 1,
            alert: None,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn document(&self) -> Option<&SelectedDocument> {
        self.document.as_ref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.document.as_ref().map(SelectedDocument::name)
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn selected_page(&self) -> PageToken {
        self.selected_page
    }

    pub fn preview_text(&self) -> &str {
        &self.preview_text
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn page_options(&self) -> Vec<PageToken> {
        page_options(self.page_count)
    }

    /// True while the chosen file is still being read.
    pub fn is_uploading(&self) -> bool {
        self.pending_read.is_some()
    }

    pub fn is_analyzing(&self) -> bool {
        self.pending_count.is_some()
    }

    pub fn is_page_loading(&self) -> bool {
        self.pending_preview.is_some()
    }

    pub fn can_analyze(&self) -> bool {
        self.document.is_some() && !self.is_uploading() && !self.is_analyzing()
    }

    pub fn can_play(&self) -> bool {
        !self.playing && !self.preview_text.is_empty()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    /// Starts reading a picked or dropped file. Non-PDF names are refused
    /// without touching the current session.
    pub fn begin_file_selection(&mut self, path: Option<&Path>) -> Option<SessionRequest> {
        let path = path?;
        if !has_pdf_extension(path) {
            info!(path = %path.display(), "refusing non-pdf file");
            self.raise_alert(ALERT_NOT_PDF);
            return None;
        }

        self.reset();
        let ticket = self.issue_ticket();
        self.pending_read = Some(ticket);
        debug!(%ticket, path = %path.display(), "reading selected file");
        Some(SessionRequest::ReadDocument {
            ticket,
            path: path.to_path_buf(),
        })
    }

    /// Replaces the session with `document`. `None` is ignored.
    pub fn select_file(&mut self, document: Option<SelectedDocument>) {
        let Some(document) = document else {
            return;
        };

        self.reset();
        let session_id = SessionId::new();
        info!(
            session_id = %session_id,
            name = document.name(),
            size_bytes = document.len(),
            "document selected"
        );
        self.session_id = Some(session_id);
        self.document = Some(document);
    }

    pub fn remove_file(&mut self) {
        if let Some(session_id) = self.session_id {
            info!(session_id = %session_id, "document removed");
        }
        self.reset();
    }

    pub fn analyze(&mut self) -> Option<SessionRequest> {
        let Some(document) = self.document.clone() else {
            self.raise_alert(ALERT_NO_FILE);
            return None;
        };
        if self.pending_count.is_some() {
            debug!("analyze already in flight");
            return None;
        }

        let ticket = self.issue_ticket();
        self.pending_count = Some(ticket);
        debug!(session_id = ?self.session_id, %ticket, "requesting page count");
        Some(SessionRequest::CountPages { ticket, document })
    }

    /// Changes the page token. Any change clears the preview and stops speech;
    /// a numeric page without preview text triggers a load.
    pub fn select_page(&mut self, token: PageToken) -> Result<Option<SessionRequest>, SessionError> {
        let token = token.validate(self.page_count)?;

        if token != self.selected_page {
            self.selected_page = token;
            self.clear_preview();
        }

        match token.page() {
            None => {
                self.pending_preview = None;
                Ok(None)
            }
            Some(_) if !self.preview_text.is_empty() => Ok(None),
            Some(page) => Ok(self.load_page_content(page)),
        }
    }

    pub fn load_page_content(&mut self, page: u32) -> Option<SessionRequest> {
        let document = self.document.clone()?;
        if matches!(self.pending_preview, Some((_, pending)) if pending == page) {
            debug!(page, "page text already loading");
            return None;
        }

        let ticket = self.issue_ticket();
        self.pending_preview = Some((ticket, page));
        debug!(session_id = ?self.session_id, %ticket, page, "requesting page text");
        Some(SessionRequest::LoadPreview {
            ticket,
            document,
            page,
        })
    }

    pub fn complete(&mut self, completion: SessionCompletion) {
        match completion {
            SessionCompletion::DocumentRead { ticket, result } => {
                if self.pending_read != Some(ticket) {
                    debug!(%ticket, "discarding stale file read");
                    return;
                }
                self.pending_read = None;
                match result {
                    Ok(document) => self.select_file(Some(document)),
                    Err(err) => {
                        warn!("failed to read selected file: {err}");
                        self.raise_alert(ALERT_READ_FAILED);
                    }
                }
            }
            SessionCompletion::PageCount { ticket, result } => {
                if self.pending_count != Some(ticket) {
                    debug!(%ticket, "discarding stale page count");
                    return;
                }
                self.pending_count = None;
                match result {
                    Ok(page_count) => {
                        info!(session_id = ?self.session_id, page_count, "page count received");
                        self.page_count = page_count;
                        if self.selected_page.validate(page_count).is_err() {
                            debug!(
                                selected = %self.selected_page,
                                page_count,
                                "selected page no longer exists"
                            );
                            self.selected_page = PageToken::All;
                            self.pending_preview = None;
                            self.clear_preview();
                        }
                    }
                    Err(err) => {
                        warn!(session_id = ?self.session_id, "page count failed: {err}");
                        self.raise_alert(ALERT_PAGES_FAILED);
                    }
                }
            }
            SessionCompletion::Preview {
                ticket,
                page,
                result,
            } => {
                if self.pending_preview != Some((ticket, page)) {
                    debug!(%ticket, page, "discarding stale page text");
                    return;
                }
                self.pending_preview = None;
                match result {
                    Ok(text) if self.selected_page == PageToken::Page(page) => {
                        debug!(page, chars = text.chars().count(), "page text received");
                        self.preview_text = text;
                    }
                    Ok(_) => debug!(page, "page text no longer selected"),
                    Err(err) => {
                        warn!(session_id = ?self.session_id, page, "page text failed: {err}");
                        self.raise_alert(ALERT_PREVIEW_FAILED);
                    }
                }
            }
        }
    }

    pub fn start_speech(&mut self) {
        if self.preview_text.is_empty() {
            return;
        }

        self.stop_speech();
        match self.speech.speak(&self.preview_text) {
            Ok(utterance) => {
                debug!(%utterance, "playback started");
                self.current_utterance = Some(utterance);
                self.playing = true;
            }
            Err(err) => {
                warn!("speech failed to start: {err}");
                self.raise_alert(ALERT_SPEECH_FAILED);
            }
        }
    }

    /// End-of-utterance notification. Ends from cancelled utterances are ignored.
    pub fn utterance_finished(&mut self, utterance: UtteranceId) {
        if self.current_utterance == Some(utterance) {
            debug!(%utterance, "playback finished");
            self.current_utterance = None;
            self.playing = false;
        }
    }

    pub fn stop_speech(&mut self) {
        if let Err(err) = self.speech.cancel() {
            warn!("failed to cancel speech: {err}");
        }
        self.current_utterance = None;
        self.playing = false;
    }

    fn clear_preview(&mut self) {
        self.stop_speech();
        self.preview_text.clear();
    }

    fn reset(&mut self) {
        self.clear_preview();
        self.session_id = None;
        self.document = None;
        self.page_count = 0;
        self.selected_page = PageToken::All;
        self.pending_read = None;
        self.pending_count = None;
        self.pending_preview = None;
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    fn raise_alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
