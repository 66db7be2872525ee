//! # gateway-live
//!
//! Live audio relay between gateway clients and the Vertex AI Live API.
//!
//! Each accepted client connection becomes a [`LiveRelaySession`]. The
//! session fetches a bearer token and waits for the client's config message
//! (in either order), opens the upstream websocket, sends the setup message,
//! tells the client `{"type":"setup_complete"}`, then relays frames in both
//! directions until either side goes away.
//!
//! Transports are abstracted as [`Duplex`] frame channels so the relay runs
//! the same over axum websockets, tungstenite, or in-memory channels.

pub mod codec;
pub mod frame;
pub mod protocol;
pub mod session;
pub mod state;
pub mod upstream;

pub use codec::{INPUT_AUDIO_MIME, classify_upstream, client_frame_to_upstream, encode_audio_chunk};
pub use frame::{Duplex, Frame, FrameSink, FrameStream};
pub use protocol::{ClientConfig, ClientControl, ServerNotice, SetupMessage};
pub use session::{LiveRelay, LiveRelaySession, RelayOutcome};
pub use state::{RelayPhase, RelayState, Transition};
pub use upstream::{LiveTarget, UpstreamConnector, WebSocketConnector, build_live_url};
