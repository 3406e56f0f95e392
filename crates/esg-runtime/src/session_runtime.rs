//! Event loop that serializes reviewer commands with transport and upload
//! callbacks onto a single [`SessionController`].

use anyhow::{Context, Result};
use esg_session::{OperationStatus, SessionController, SessionId, SubjectDocument, UploadOutcome};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{HttpUploadCoordinator, UploadClient, UploadClientConfig, WebSocketConnector};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reviewer-side requests coming from a UI.
pub enum SessionCommand {
    Submit {
        subject: String,
        documents: Vec<SubjectDocument>,
    },
    Approve,
    Reject,
    Comment(String),
    Cancel,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Callbacks produced by the transport and upload tasks.
pub enum SessionEvent {
    TransportOpened {
        session_id: SessionId,
    },
    TransportFrame {
        session_id: SessionId,
        text: String,
    },
    TransportError {
        session_id: SessionId,
        message: String,
    },
    TransportClosed {
        session_id: SessionId,
    },
    UploadFinished {
        session_id: SessionId,
        outcome: UploadOutcome,
    },
}

/// Receives the controller's read-only view after every applied command or event.
pub trait SessionObserver: Send {
    fn session_updated(&mut self, session: &SessionController);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRuntimeConfig {
    pub server_url: String,
    pub upload_url: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

pub struct SessionRuntime {
    controller: SessionController,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionRuntime {
    pub fn new(config: &SessionRuntimeConfig) -> Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let upload_client = UploadClient::new(&UploadClientConfig {
            upload_url: config.upload_url.clone(),
            request_timeout_ms: config.request_timeout_ms,
            retry_max_attempts: config.retry_max_attempts,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
        .context("failed to build document upload client")?;
        let connector = WebSocketConnector::new(config.server_url.clone(), events_tx.clone());
        let uploader = HttpUploadCoordinator::new(upload_client, events_tx);
        Ok(Self {
            controller: SessionController::new(Box::new(connector), Box::new(uploader)),
            events_rx,
        })
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Runs until `Quit` arrives or the command channel closes.
    pub async fn run<O>(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        observer: &mut O,
    ) -> Result<()>
    where
        O: SessionObserver + ?Sized,
    {
        loop {
            tokio::select! {
                maybe_command = commands.recv() => {
                    let Some(command) = maybe_command else {
                        break;
                    };
                    if !self.apply_command(command) {
                        break;
                    }
                }
                Some(event) = self.events_rx.recv() => {
                    self.apply_event(event);
                }
            }
            observer.session_updated(&self.controller);
        }

        info!(
            session_id = self.controller.session_id(),
            "session runtime shutting down"
        );
        self.controller.release_transport();
        Ok(())
    }

    /// Applies one reviewer command. Returns `false` once the loop should stop.
    pub fn apply_command(&mut self, command: SessionCommand) -> bool {
        let status = match command {
            SessionCommand::Submit { subject, documents } => {
                self.controller.submit(&subject, documents);
                OperationStatus::Applied
            }
            SessionCommand::Approve => self.controller.respond_approve(),
            SessionCommand::Reject => self.controller.respond_reject(),
            SessionCommand::Comment(text) => self.controller.submit_comment(&text),
            SessionCommand::Cancel => self.controller.close(),
            SessionCommand::Quit => return false,
        };
        if status == OperationStatus::Refused {
            debug!(
                state = self.controller.transport_state().as_str(),
                "reviewer command refused"
            );
        }
        true
    }

    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TransportOpened { session_id } => {
                self.controller.on_transport_open(session_id);
            }
            SessionEvent::TransportFrame { session_id, text } => {
                self.controller.on_transport_frame(session_id, &text);
            }
            SessionEvent::TransportError {
                session_id,
                message,
            } => self.controller.on_transport_error(session_id, &message),
            SessionEvent::TransportClosed { session_id } => {
                self.controller.on_transport_closed(session_id);
            }
            SessionEvent::UploadFinished {
                session_id,
                outcome,
            } => self.controller.on_upload_finished(session_id, outcome),
        }
    }
}
