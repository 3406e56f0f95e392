//! Session controller: owns the transport handle, the transcript, and the gate,
//! and serializes transport callbacks with reviewer operations.
//!
//! Nothing here returns an error to the caller. Every failure is turned into a
//! transcript note so the reviewer can see it.

use tracing::{debug, info, warn};

use crate::router::{route_server_message, RouteTargets};
use crate::{
    ActivityIndicator, ClientFrame, PendingInputGate, PendingInputKind, RouteOutcome,
    ServerMessage, SessionError, Transcript, TranscriptEntry,
};

pub const NO_FILES_NOTE: &str = "Error: No files selected";
pub const NO_SUBJECT_NOTE: &str = "Error: No company name provided";
pub const END_OF_REPORT_NOTE: &str = "End of Report";
pub const NOT_CONNECTED_NOTE: &str = "Error: Session transport is not connected";
const NOTHING_PENDING_NOTE: &str = "Error: No input is pending";
const NO_COMMENT_PENDING_NOTE: &str = "Error: No rejection is awaiting a comment";
const NO_ACTIVE_SESSION_NOTE: &str = "Error: No active session to cancel";

/// Identifies one submit. Callbacks carrying an older id are stale.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Connecting,
    Open,
    Closed,
    Failed,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A supporting document attached to a subject.
pub struct SubjectDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SubjectDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Advisory result of the side-channel document upload.
pub enum UploadOutcome {
    Accepted { files: Vec<String> },
    Rejected { reason: String },
}

/// Write half of an open session transport.
pub trait SessionTransport: Send {
    fn send(&mut self, frame: &ClientFrame) -> Result<(), SessionError>;
    fn close(&mut self);
}

/// Opens transports. Implementations report open / frame / error / close back to
/// the controller's `on_transport_*` callbacks, tagged with `session_id`.
pub trait TransportConnector: Send {
    fn connect(
        &mut self,
        session_id: SessionId,
        subject: &str,
    ) -> Result<Box<dyn SessionTransport>, SessionError>;
}

/// Fire-and-forget document upload. The outcome comes back through
/// [`SessionController::on_upload_finished`].
pub trait UploadCoordinator: Send {
    fn dispatch(&mut self, session_id: SessionId, subject: &str, documents: Vec<SubjectDocument>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum OperationStatus {
    Applied,
    /// The operation was not valid now; a note explains why.
    Refused,
}

#[derive(Debug, Clone, PartialEq)]
/// Owned copy of everything a UI reads from the controller.
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub subject: String,
    pub state: TransportState,
    pub transcript: Vec<TranscriptEntry>,
    pub pending_input: Option<PendingInputKind>,
    pub activity: ActivityIndicator,
}

pub struct SessionController {
    connector: Box<dyn TransportConnector>,
    uploader: Box<dyn UploadCoordinator>,
    transport: Option<Box<dyn SessionTransport>>,
    session_id: SessionId,
    subject: String,
    state: TransportState,
    transcript: Transcript,
    gate: PendingInputGate,
    activity: ActivityIndicator,
    report_ended: bool,
    /// Client-side notes raised while a prompt awaits a decision. They land
    /// after the prompt is resolved so truncation only ever removes prompts.
    held_notes: Vec<String>,
}

impl SessionController {
    pub fn new(
        connector: Box<dyn TransportConnector>,
        uploader: Box<dyn UploadCoordinator>,
    ) -> Self {
        Self {
            connector,
            uploader,
            transport: None,
            session_id: 0,
            subject: String::new(),
            state: TransportState::Idle,
            transcript: Transcript::default(),
            gate: PendingInputGate::default(),
            activity: ActivityIndicator::default(),
            report_ended: false,
            held_notes: Vec::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn transport_state(&self) -> TransportState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending_input(&self) -> Option<PendingInputKind> {
        self.gate.pending()
    }

    pub fn is_awaiting_comment(&self) -> bool {
        self.gate.awaiting_comment()
    }

    pub fn activity(&self) -> &ActivityIndicator {
        &self.activity
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            subject: self.subject.clone(),
            state: self.state,
            transcript: self.transcript.entries().to_vec(),
            pending_input: self.gate.pending(),
            activity: self.activity.clone(),
        }
    }

    /// Starts a new session, discarding whatever the previous one produced.
    pub fn submit(&mut self, subject: &str, documents: Vec<SubjectDocument>) -> SessionId {
        self.release_transport();
        self.session_id = self.session_id.saturating_add(1);
        self.subject = subject.trim().to_string();
        self.transcript.clear();
        self.gate.clear();
        self.activity.clear();
        self.report_ended = false;
        self.held_notes.clear();
        self.state = TransportState::Idle;

        info!(
            session_id = self.session_id,
            subject = %self.subject,
            documents = documents.len(),
            "submitting report session"
        );

        if self.subject.is_empty() {
            self.note(NO_SUBJECT_NOTE);
        }
        if documents.is_empty() {
            self.note(NO_FILES_NOTE);
        } else {
            self.uploader
                .dispatch(self.session_id, &self.subject, documents);
        }

        match self.connector.connect(self.session_id, &self.subject) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = TransportState::Connecting;
            }
            Err(error) => self.fail(&error.to_string()),
        }
        self.session_id
    }

    pub fn respond_approve(&mut self) -> OperationStatus {
        if self.refuse_unless_open() || self.refuse_unless_pending() {
            return OperationStatus::Refused;
        }
        if let Err(error) = self.send(&ClientFrame::approve()) {
            self.fail(&error.to_string());
            return OperationStatus::Refused;
        }
        self.gate.clear();
        self.transcript.truncate_tail(1);
        self.release_held_notes();
        self.activity.begin_loading();
        OperationStatus::Applied
    }

    /// Switches to comment mode. Nothing is sent until the comment is submitted.
    pub fn respond_reject(&mut self) -> OperationStatus {
        if self.refuse_unless_open() || self.refuse_unless_pending() {
            return OperationStatus::Refused;
        }
        self.gate.enter_comment_mode();
        OperationStatus::Applied
    }

    pub fn submit_comment(&mut self, comment: &str) -> OperationStatus {
        if self.refuse_unless_open() {
            return OperationStatus::Refused;
        }
        if !self.gate.awaiting_comment() {
            self.note(NO_COMMENT_PENDING_NOTE);
            return OperationStatus::Refused;
        }
        if let Err(error) = self.send(&ClientFrame::reject_with_comment(comment)) {
            self.fail(&error.to_string());
            return OperationStatus::Refused;
        }
        self.gate.clear();
        self.transcript.truncate_tail(2);
        self.release_held_notes();
        self.activity.begin_loading();
        OperationStatus::Applied
    }

    /// Reviewer-initiated end of the session.
    pub fn close(&mut self) -> OperationStatus {
        if !self.state.is_live() {
            self.note(NO_ACTIVE_SESSION_NOTE);
            return OperationStatus::Refused;
        }
        info!(session_id = self.session_id, "closing report session");
        self.release_transport();
        self.state = TransportState::Closed;
        self.finish_report();
        OperationStatus::Applied
    }

    /// Drops the transport without touching the transcript.
    pub fn release_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    pub fn on_transport_open(&mut self, session_id: SessionId) {
        if self.is_stale(session_id, "open") {
            return;
        }
        if self.state != TransportState::Connecting {
            warn!(
                state = self.state.as_str(),
                "ignoring transport open outside of connecting state"
            );
            return;
        }
        self.state = TransportState::Open;
        self.activity.begin_loading();
        let start = ClientFrame::start(self.subject.clone());
        if let Err(error) = self.send(&start) {
            self.fail(&error.to_string());
        }
    }

    pub fn on_transport_frame(
        &mut self,
        session_id: SessionId,
        text: &str,
    ) -> Option<RouteOutcome> {
        if self.is_stale(session_id, "frame") {
            return None;
        }
        if self.state != TransportState::Open {
            debug!(
                state = self.state.as_str(),
                "ignoring server frame outside of open state"
            );
            return None;
        }
        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "ignoring undecodable server frame");
                return None;
            }
        };
        debug!(kind = message.kind(), "routing server message");
        Some(route_server_message(
            message,
            RouteTargets {
                transcript: &mut self.transcript,
                gate: &mut self.gate,
                activity: &mut self.activity,
            },
        ))
    }

    pub fn on_transport_error(&mut self, session_id: SessionId, message: &str) {
        if self.is_stale(session_id, "error") {
            return;
        }
        if !self.state.is_live() {
            debug!(
                state = self.state.as_str(),
                "ignoring transport error after session ended"
            );
            return;
        }
        self.fail(message);
    }

    pub fn on_transport_closed(&mut self, session_id: SessionId) {
        if self.is_stale(session_id, "close") || self.state == TransportState::Idle {
            return;
        }
        self.transport = None;
        if self.state != TransportState::Failed {
            self.state = TransportState::Closed;
        }
        self.finish_report();
    }

    pub fn on_upload_finished(&mut self, session_id: SessionId, outcome: UploadOutcome) {
        if self.is_stale(session_id, "upload") {
            return;
        }
        match outcome {
            UploadOutcome::Accepted { files } => {
                info!(session_id, files = files.len(), "document upload accepted");
            }
            UploadOutcome::Rejected { reason } => {
                warn!(session_id, reason = %reason, "document upload failed");
                self.note(format!("Error: File upload failed: {reason}"));
            }
        }
    }

    fn send(&mut self, frame: &ClientFrame) -> Result<(), SessionError> {
        match self.transport.as_mut() {
            Some(transport) => transport.send(frame),
            None => Err(SessionError::Send("no transport handle".to_string())),
        }
    }

    fn fail(&mut self, reason: &str) {
        warn!(session_id = self.session_id, reason, "report session failed");
        self.state = TransportState::Failed;
        self.activity.clear();
        self.release_held_notes();
        self.note(format!("Error: {reason}"));
    }

    fn finish_report(&mut self) {
        self.activity.clear();
        self.release_held_notes();
        if !self.report_ended {
            self.report_ended = true;
            self.note(END_OF_REPORT_NOTE);
        }
    }

    fn refuse_unless_open(&mut self) -> bool {
        if self.state == TransportState::Open && self.transport.is_some() {
            return false;
        }
        self.note(NOT_CONNECTED_NOTE);
        true
    }

    fn refuse_unless_pending(&mut self) -> bool {
        if self.gate.is_pending() {
            return false;
        }
        self.note(NOTHING_PENDING_NOTE);
        true
    }

    fn is_stale(&self, session_id: SessionId, callback: &'static str) -> bool {
        if session_id == self.session_id {
            return false;
        }
        debug!(
            session_id,
            current = self.session_id,
            callback,
            "dropping callback from superseded session"
        );
        true
    }

    fn note(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.state == TransportState::Open && self.gate.is_pending() {
            debug!(note = %text, "holding note until the pending prompt is resolved");
            self.held_notes.push(text);
            return;
        }
        self.transcript.append(TranscriptEntry::note(text));
    }

    fn release_held_notes(&mut self) {
        for text in std::mem::take(&mut self.held_notes) {
            self.transcript.append(TranscriptEntry::note(text));
        }
    }
}
