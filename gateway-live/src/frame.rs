//! Transport-neutral frames and duplex channels.

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{Sink, SinkExt, Stream, StreamExt};
use gateway_core::{GatewayError, Result};
use std::pin::Pin;

/// One message on either side of the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl Frame {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self::Binary(bytes.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = GatewayError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// A connected pair of frame sink and frame stream.
///
/// The stream ending means the peer closed; an `Err` item means the
/// connection broke.
pub struct Duplex {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Duplex {
    pub fn new<Si, St>(sink: Si, stream: St) -> Self
    where
        Si: Sink<Frame, Error = GatewayError> + Send + 'static,
        St: Stream<Item = Result<Frame>> + Send + 'static,
    {
        Self { sink: Box::pin(sink), stream: Box::pin(stream) }
    }

    /// Two in-memory ends wired to each other.
    pub fn pair(buffer: usize) -> (Self, Self) {
        let (left_tx, left_rx) = mpsc::channel::<Frame>(buffer);
        let (right_tx, right_rx) = mpsc::channel::<Frame>(buffer);
        let left = Self::new(left_tx.sink_map_err(channel_closed), right_rx.map(Ok::<Frame, GatewayError>));
        let right = Self::new(right_tx.sink_map_err(channel_closed), left_rx.map(Ok::<Frame, GatewayError>));
        (left, right)
    }

    pub fn split(self) -> (FrameSink, FrameStream) {
        (self.sink, self.stream)
    }
}

impl std::fmt::Debug for Duplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Duplex").finish_non_exhaustive()
    }
}

fn channel_closed(e: mpsc::SendError) -> GatewayError {
    GatewayError::connection(format!("channel closed: {e}"))
}
