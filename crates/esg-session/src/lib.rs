//! Client-side session protocol for human-in-the-loop ESG report generation.
//!
//! The crate is transport agnostic: [`SessionController`] drives a session through
//! the [`TransportConnector`] and [`UploadCoordinator`] seams and records everything
//! the pipeline reports as [`TranscriptEntry`] values for a presentation layer to
//! render.

mod activity;
mod controller;
mod error;
mod pending_input;
mod protocol;
mod router;
mod transcript;

pub use activity::ActivityIndicator;
pub use controller::{
    OperationStatus, SessionController, SessionId, SessionSnapshot, SessionTransport,
    SubjectDocument, TransportConnector, TransportState, UploadCoordinator, UploadOutcome,
    END_OF_REPORT_NOTE, NOT_CONNECTED_NOTE, NO_FILES_NOTE, NO_SUBJECT_NOTE,
};
pub use error::{ProtocolError, SessionError};
pub use pending_input::{GateOutcome, PendingInputGate, PendingInputKind};
pub use protocol::{
    ClientFrame, CompanyDetailsPayload, DecisionResponse, PromptPayload, ServerMessage,
    TopicAssessmentPayload,
};
pub use router::RouteOutcome;
pub use transcript::{Transcript, TranscriptEntry, GRI_TOPICS_TITLE, UN_SDG_TITLE};
