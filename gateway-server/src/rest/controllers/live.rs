use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, future};
use gateway_core::{GatewayError, Result};
use gateway_live::{Duplex, Frame, LiveRelay};

#[derive(Clone)]
pub struct LiveController {
    relay: LiveRelay,
}

impl LiveController {
    pub fn new(relay: LiveRelay) -> Self {
        Self { relay }
    }
}

/// `GET /api/live`: upgrade and hand the socket to a relay session.
pub async fn live(State(controller): State<LiveController>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let outcome = controller.relay.serve(socket_duplex(socket)).await;
        tracing::debug!(?outcome, "Live websocket finished");
    })
}

/// Adapt an axum websocket to relay frames. Ping/pong and close frames are
/// consumed here.
pub fn socket_duplex(socket: WebSocket) -> Duplex {
    let (sink, stream) = socket.split();
    let sink = sink
        .sink_map_err(|e| GatewayError::connection(format!("Client send error: {e}")))
        .with(|frame: Frame| future::ready(Ok::<_, GatewayError>(into_message(frame))));
    let stream = stream.filter_map(|message| future::ready(from_message(message)));
    Duplex::new(sink, stream)
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes),
    }
}

fn from_message(message: std::result::Result<Message, axum::Error>) -> Option<Result<Frame>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(bytes)) => Some(Ok(Frame::Binary(bytes))),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
        Err(e) => Some(Err(GatewayError::connection(format!("Client receive error: {e}")))),
    }
}
