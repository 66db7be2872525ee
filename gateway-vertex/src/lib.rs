//! # gateway-vertex
//!
//! Generation backends behind the gateway's HTTP endpoint.
//!
//! ```text
//!                      GenerationDispatcher
//!                              │ resolve model
//!          ┌───────────────────┼────────────────────────┐
//!          │ imagen*           │ veo*                   │ other
//!  ┌───────▼────────┐ ┌────────▼───────────────┐ ┌──────▼──────────────┐
//!  │SyncPredictClient│ │LongRunningOperationPoller│ │RegionalClientCache │
//!  │   :predict      │ │ :predictLongRunning    │ │  :generateContent   │
//!  └────────────────┘ │ :fetchPredictOperation │ └─────────────────────┘
//!                     └────────────────────────┘
//! ```
//!
//! Image and video results are wrapped into the same [`NormalizedResponse`]
//! shape as chat output so callers never branch on model family.

pub mod client;
pub mod dispatcher;
mod http;
pub mod media;
pub mod operation;
pub mod poller;
pub mod predict;
pub mod response;

pub use client::{RegionalClient, RegionalClientCache};
pub use dispatcher::{GenerationDispatcher, GenerationRequest};
pub use media::{MediaPayload, ReferenceImage, find_video_payload};
pub use operation::{Operation, OperationError, OperationOutcome, PollPolicy};
pub use poller::{LongRunningOperationPoller, OperationBackend, VertexOperationBackend, VideoRequest};
pub use predict::SyncPredictClient;
pub use response::{GenerationOutput, NormalizedResponse};
