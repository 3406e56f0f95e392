//! Session transport over a `tokio-tungstenite` websocket.
//!
//! Each connect spawns one task that owns the socket. The controller only holds
//! a channel into that task, so sends never block the session loop.

use anyhow::{Context, Result};
use esg_session::{ClientFrame, SessionError, SessionId, SessionTransport, TransportConnector};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info};

use crate::SessionEvent;

#[derive(Debug)]
enum OutboundFrame {
    Text(String),
    Close,
}

#[derive(Debug, PartialEq, Eq)]
enum InboundSocketMessage {
    Text(String),
    Close,
    Control,
}

pub struct WebSocketConnector {
    url: String,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            url: url.into(),
            events,
        }
    }
}

impl TransportConnector for WebSocketConnector {
    fn connect(
        &mut self,
        session_id: SessionId,
        subject: &str,
    ) -> Result<Box<dyn SessionTransport>, SessionError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|error| SessionError::Connect(error.to_string()))?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        info!(session_id, subject, url = %self.url, "opening report session websocket");
        runtime.spawn(run_socket_session(
            self.url.clone(),
            session_id,
            self.events.clone(),
            outbound_rx,
        ));
        Ok(Box::new(WebSocketTransport {
            outbound: outbound_tx,
            closed: false,
        }))
    }
}

struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    closed: bool,
}

impl SessionTransport for WebSocketTransport {
    fn send(&mut self, frame: &ClientFrame) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Send("websocket is closing".to_string()));
        }
        let text = frame.encode()?;
        self.outbound
            .send(OutboundFrame::Text(text))
            .map_err(|_| SessionError::Send("websocket writer has stopped".to_string()))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.outbound.send(OutboundFrame::Close);
        }
    }
}

/// Emits `TransportOpened`, then frames, then at most one `TransportError`,
/// and always finishes with `TransportClosed`.
async fn run_socket_session(
    url: String,
    session_id: SessionId,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(error) => {
            let _ = events.send(SessionEvent::TransportError {
                session_id,
                message: format!("failed to connect to {url}: {error}"),
            });
            let _ = events.send(SessionEvent::TransportClosed { session_id });
            return;
        }
    };
    let _ = events.send(SessionEvent::TransportOpened { session_id });

    let (mut sink, mut source) = stream.split();
    if let Err(error) =
        pump_socket(session_id, &events, &mut sink, &mut source, &mut outbound_rx).await
    {
        let _ = events.send(SessionEvent::TransportError {
            session_id,
            message: format!("{error:#}"),
        });
    }
    debug!(session_id, "report session websocket finished");
    let _ = events.send(SessionEvent::TransportClosed { session_id });
}

async fn pump_socket<S, R>(
    session_id: SessionId,
    events: &mpsc::UnboundedSender<SessionEvent>,
    sink: &mut S,
    source: &mut R,
    outbound_rx: &mut mpsc::UnboundedReceiver<OutboundFrame>,
) -> Result<()>
where
    S: futures_util::Sink<WsMessage> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
    R: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(OutboundFrame::Text(text)) => {
                    sink.send(WsMessage::Text(text.into()))
                        .await
                        .context("failed to send session frame")?;
                }
                Some(OutboundFrame::Close) | None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return Ok(());
                }
            },
            inbound = source.next() => {
                let Some(message_result) = inbound else {
                    return Ok(());
                };
                let message = message_result.context("failed reading session websocket message")?;
                match parse_socket_message(message)? {
                    InboundSocketMessage::Text(text) => {
                        let _ = events.send(SessionEvent::TransportFrame { session_id, text });
                    }
                    InboundSocketMessage::Close => return Ok(()),
                    InboundSocketMessage::Control => {}
                }
            }
        }
    }
}

fn parse_socket_message(message: WsMessage) -> Result<InboundSocketMessage> {
    match message {
        WsMessage::Text(text) => Ok(InboundSocketMessage::Text(text.as_str().to_string())),
        WsMessage::Binary(bytes) => {
            let text =
                String::from_utf8(bytes.to_vec()).context("invalid utf-8 session payload")?;
            Ok(InboundSocketMessage::Text(text))
        }
        WsMessage::Close(_) => Ok(InboundSocketMessage::Close),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {
            Ok(InboundSocketMessage::Control)
        }
    }
}
