//! Routes decoded server messages into transcript, gate, and activity updates.
//!
//! Handlers only ever append to the transcript. Removing entries is reserved for
//! the reviewer operations on the controller.

use tracing::{debug, warn};

use crate::{
    ActivityIndicator, GateOutcome, PendingInputGate, ServerMessage, Transcript,
    TranscriptEntry, GRI_TOPICS_TITLE, UN_SDG_TITLE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    ActivityUpdated,
    Appended,
    PromptRaised,
    /// A prompt arrived while another was unresolved; the newer one won.
    PromptOverwritten,
    Ignored { kind: String },
}

pub(crate) struct RouteTargets<'a> {
    pub(crate) transcript: &'a mut Transcript,
    pub(crate) gate: &'a mut PendingInputGate,
    pub(crate) activity: &'a mut ActivityIndicator,
}

pub(crate) fn route_server_message(
    message: ServerMessage,
    targets: RouteTargets<'_>,
) -> RouteOutcome {
    let RouteTargets {
        transcript,
        gate,
        activity,
    } = targets;

    if message.clears_activity() {
        activity.clear();
    }

    match message {
        ServerMessage::Progress(text) => {
            activity.report(text);
            RouteOutcome::ActivityUpdated
        }
        ServerMessage::CompanyDetails(payload) => {
            transcript.append(payload.into());
            RouteOutcome::Appended
        }
        ServerMessage::CompanyDetailsInputRequired(payload)
        | ServerMessage::GriTopicsInputRequired(payload) => {
            transcript.append(TranscriptEntry::PendingPrompt { payload });
            match gate.arm() {
                GateOutcome::Armed => RouteOutcome::PromptRaised,
                GateOutcome::Overwritten { previous } => {
                    warn!(
                        previous = previous.as_str(),
                        "server raised a prompt while another was unresolved"
                    );
                    RouteOutcome::PromptOverwritten
                }
            }
        }
        ServerMessage::GriTopics(items) => {
            transcript.append(TranscriptEntry::topic_list(GRI_TOPICS_TITLE, items));
            RouteOutcome::Appended
        }
        ServerMessage::TopicAssessment(payload) => {
            transcript.append(payload.into());
            RouteOutcome::Appended
        }
        ServerMessage::UnSdgList(items) => {
            transcript.append(TranscriptEntry::topic_list(UN_SDG_TITLE, items));
            RouteOutcome::Appended
        }
        ServerMessage::ServerError(text) => {
            transcript.append(TranscriptEntry::note(format!("Error: {text}")));
            RouteOutcome::Appended
        }
        ServerMessage::Unknown { kind } => {
            debug!(kind = %kind, "ignoring unrecognized server message kind");
            RouteOutcome::Ignored { kind }
        }
    }
}
