//! Tokio runtime for report sessions: websocket transport, document upload
//! side-channel, and the event loop that feeds both into the session controller.

mod session_runtime;
mod upload_client;
mod upload_retry;
mod websocket_transport;

pub use session_runtime::{
    SessionCommand, SessionEvent, SessionObserver, SessionRuntime, SessionRuntimeConfig,
};
pub use upload_client::{
    HttpUploadCoordinator, UploadClient, UploadClientConfig, UploadError, UploadReceipt,
};
pub use websocket_transport::WebSocketConnector;
