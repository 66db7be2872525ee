//! Relay session phases.
//!
//! ```text
//! AwaitingAuth ──token──► AwaitingConfig ──config──┐
//!      │                                           ▼
//!      └──config──► (pending slot) ──token──► AwaitingUpstream ──open──► Handshaking ──setup──► Streaming
//! ```
//!
//! Any phase may move to `Closed`.

use crate::protocol::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    AwaitingAuth,
    AwaitingConfig,
    AwaitingUpstream,
    Handshaking,
    Streaming,
    Closed,
}

/// What the session should do after feeding an event to [`RelayState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing further to do yet.
    Wait,
    /// Both token and configuration are available: open upstream.
    OpenUpstream { token: String, config: ClientConfig },
    /// The event does not apply in the current phase.
    Ignored,
}

/// Phase plus the capacity-1 slot for a configuration received before auth.
#[derive(Debug, Clone)]
pub struct RelayState {
    phase: RelayPhase,
    pending_config: Option<ClientConfig>,
    token: Option<String>,
}

impl Default for RelayState {
    fn default() -> Self {
        Self { phase: RelayPhase::AwaitingAuth, pending_config: None, token: None }
    }
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    pub fn has_pending_config(&self) -> bool {
        self.pending_config.is_some()
    }

    /// Audio may only be relayed upstream once the handshake is done.
    pub fn accepts_audio(&self) -> bool {
        self.phase == RelayPhase::Streaming
    }

    /// Token acquired. Consumes the pending configuration, if any.
    pub fn auth_succeeded(&mut self, token: String) -> Transition {
        if self.phase != RelayPhase::AwaitingAuth {
            return Transition::Ignored;
        }
        match self.pending_config.take() {
            Some(config) => {
                self.phase = RelayPhase::AwaitingUpstream;
                Transition::OpenUpstream { token, config }
            }
            None => {
                self.token = Some(token);
                self.phase = RelayPhase::AwaitingConfig;
                Transition::Wait
            }
        }
    }

    /// Client configuration received. Only the first one counts.
    pub fn config_received(&mut self, config: ClientConfig) -> Transition {
        match self.phase {
            RelayPhase::AwaitingAuth if self.pending_config.is_none() => {
                self.pending_config = Some(config);
                Transition::Wait
            }
            RelayPhase::AwaitingConfig => match self.token.take() {
                Some(token) => {
                    self.phase = RelayPhase::AwaitingUpstream;
                    Transition::OpenUpstream { token, config }
                }
                None => Transition::Ignored,
            },
            _ => Transition::Ignored,
        }
    }

    pub fn upstream_opened(&mut self) -> bool {
        self.advance(RelayPhase::AwaitingUpstream, RelayPhase::Handshaking)
    }

    pub fn setup_sent(&mut self) -> bool {
        self.advance(RelayPhase::Handshaking, RelayPhase::Streaming)
    }

    pub fn close(&mut self) {
        self.phase = RelayPhase::Closed;
        self.pending_config = None;
        self.token = None;
    }

    fn advance(&mut self, from: RelayPhase, to: RelayPhase) -> bool {
        if self.phase == from {
            self.phase = to;
            true
        } else {
            false
        }
    }
}
