use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures raised by the transport seam. The controller converts every one of
/// them into a transcript note.
pub enum SessionError {
    #[error("session transport connect failed: {0}")]
    Connect(String),
    #[error("session transport send failed: {0}")]
    Send(String),
    #[error("failed to encode client frame: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
/// Enumerates server frames the router refuses to interpret.
pub enum ProtocolError {
    #[error("undecodable server frame: {0}")]
    Frame(#[source] serde_json::Error),
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
