//! One relay session per accepted client connection.

use crate::codec::{client_frame_to_upstream, upstream_frame_to_client};
use crate::frame::{Duplex, Frame, FrameSink, FrameStream};
use crate::protocol::{ClientConfig, ClientControl, ServerNotice, SetupMessage};
use crate::state::{RelayPhase, RelayState, Transition};
use crate::upstream::{LiveTarget, UpstreamConnector};
use futures::future::BoxFuture;
use futures::{FutureExt, SinkExt, StreamExt};
use gateway_core::{GatewayConfig, ModelResolver, Result, SharedTokenProvider};
use std::future::Future;
use std::sync::Arc;

/// Shared, per-process inputs for relay sessions.
#[derive(Clone)]
pub struct LiveRelay {
    config: Arc<GatewayConfig>,
    resolver: ModelResolver,
    tokens: SharedTokenProvider,
    connector: Arc<dyn UpstreamConnector>,
}

impl LiveRelay {
    pub fn new(config: GatewayConfig, tokens: SharedTokenProvider, connector: Arc<dyn UpstreamConnector>) -> Self {
        Self { config: Arc::new(config), resolver: ModelResolver::new(), tokens, connector }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ModelResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// New session for one client connection.
    pub fn session(&self) -> LiveRelaySession {
        LiveRelaySession {
            id: uuid::Uuid::new_v4().to_string(),
            relay: self.clone(),
            state: RelayState::new(),
        }
    }

    /// Run a session over `client` until either side goes away.
    pub async fn serve(&self, client: Duplex) -> RelayOutcome {
        self.session().run(client).await
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Client closed or dropped; upstream (if open) was closed too.
    ClientClosed,
    /// Upstream closed; the client was closed.
    UpstreamClosed,
    /// Upstream errored; the client got an error notice and was closed.
    UpstreamError(String),
    /// No bearer token could be obtained.
    AuthFailed(String),
    /// The upstream connection or handshake failed.
    ConnectFailed(String),
}

/// Bridges one client connection with one upstream Live API connection.
pub struct LiveRelaySession {
    id: String,
    relay: LiveRelay,
    state: RelayState,
}

struct Upstream {
    sink: FrameSink,
    stream: FrameStream,
}

async fn poll_slot<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn next_upstream(upstream: &mut Option<Upstream>) -> Option<Result<Frame>> {
    match upstream {
        Some(upstream) => upstream.stream.next().await,
        None => std::future::pending().await,
    }
}

impl LiveRelaySession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RelayPhase {
        self.state.phase()
    }

    /// Drive the session to completion.
    ///
    /// Client frames are read from the start. Until the setup handshake is
    /// done only the config message is acted on; audio is dropped.
    pub async fn run(mut self, client: Duplex) -> RelayOutcome {
        let (mut client_sink, mut client_stream) = client.split();
        tracing::info!(session_id = %self.id, "Live session accepted");

        let tokens = self.relay.tokens.clone();
        let mut auth: Option<BoxFuture<'static, Result<String>>> =
            Some(async move { tokens.access_token().await }.boxed());
        let mut connect: Option<BoxFuture<'static, Result<(Upstream, ClientConfig)>>> = None;
        let mut upstream: Option<Upstream> = None;

        let outcome = loop {
            tokio::select! {
                token = poll_slot(&mut auth) => {
                    auth = None;
                    match token {
                        Ok(token) => {
                            tracing::debug!(session_id = %self.id, "Live session authenticated");
                            if let Transition::OpenUpstream { token, config } = self.state.auth_succeeded(token) {
                                match self.start_connect(token, config) {
                                    Ok(future) => connect = Some(future),
                                    Err(e) => break self.fail(&mut client_sink, RelayOutcome::ConnectFailed(e.to_string())).await,
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(session_id = %self.id, error = %e, "Live session authentication failed");
                            break self.fail(&mut client_sink, RelayOutcome::AuthFailed(e.to_string())).await;
                        }
                    }
                }

                opened = poll_slot(&mut connect) => {
                    connect = None;
                    match opened {
                        Ok((mut opened, config)) => match self.handshake(&mut opened.sink, &config).await {
                            Ok(()) => {
                                upstream = Some(opened);
                                if client_sink.send(Frame::Text(ServerNotice::SetupComplete.to_json())).await.is_err() {
                                    break RelayOutcome::ClientClosed;
                                }
                                tracing::info!(session_id = %self.id, "Live session streaming");
                            }
                            Err(e) => {
                                let _ = opened.sink.close().await;
                                break self.fail(&mut client_sink, RelayOutcome::ConnectFailed(e.to_string())).await;
                            }
                        },
                        Err(e) => {
                            tracing::warn!(session_id = %self.id, error = %e, "Upstream connection failed");
                            break self.fail(&mut client_sink, RelayOutcome::ConnectFailed(e.to_string())).await;
                        }
                    }
                }

                frame = client_stream.next() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => {
                            tracing::debug!(session_id = %self.id, error = %e, "Client connection error");
                            break RelayOutcome::ClientClosed;
                        }
                        None => break RelayOutcome::ClientClosed,
                    };

                    if self.state.accepts_audio() {
                        let Some(outbound) = client_frame_to_upstream(frame) else {
                            tracing::trace!(session_id = %self.id, "Dropping unrecognized client message");
                            continue;
                        };
                        if let Some(up) = upstream.as_mut() {
                            if let Err(e) = up.sink.send(outbound).await {
                                break self.fail(&mut client_sink, RelayOutcome::UpstreamError(e.to_string())).await;
                            }
                        }
                        continue;
                    }

                    match frame {
                        Frame::Text(text) => match ClientControl::parse(&text) {
                            Some(ClientControl::Config { config }) => {
                                if let Transition::OpenUpstream { token, config } = self.state.config_received(config) {
                                    match self.start_connect(token, config) {
                                        Ok(future) => connect = Some(future),
                                        Err(e) => break self.fail(&mut client_sink, RelayOutcome::ConnectFailed(e.to_string())).await,
                                    }
                                }
                            }
                            None => tracing::trace!(session_id = %self.id, "Ignoring text before setup"),
                        },
                        Frame::Binary(audio) => {
                            tracing::trace!(session_id = %self.id, bytes = audio.len(), "Dropping audio before setup");
                        }
                    }
                }

                frame = next_upstream(&mut upstream) => {
                    match frame {
                        Some(Ok(frame)) => {
                            if client_sink.send(upstream_frame_to_client(frame)).await.is_err() {
                                break RelayOutcome::ClientClosed;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(session_id = %self.id, error = %e, "Upstream error");
                            upstream = None;
                            break self.fail(&mut client_sink, RelayOutcome::UpstreamError(e.to_string())).await;
                        }
                        None => {
                            tracing::info!(session_id = %self.id, "Upstream closed");
                            upstream = None;
                            let _ = client_sink.close().await;
                            break RelayOutcome::UpstreamClosed;
                        }
                    }
                }
            }
        };

        if let Some(mut up) = upstream {
            if let Err(e) = up.sink.close().await {
                tracing::debug!(session_id = %self.id, error = %e, "Closing upstream failed");
            }
        }
        self.state.close();
        tracing::info!(session_id = %self.id, outcome = ?outcome, "Live session closed");
        outcome
    }

    /// Resolve the target and start opening upstream in the background of the loop.
    fn start_connect(
        &self,
        token: String,
        config: ClientConfig,
    ) -> Result<BoxFuture<'static, Result<(Upstream, ClientConfig)>>> {
        let target = LiveTarget::from_config(&self.relay.config, &self.relay.resolver)?;
        let connector = self.relay.connector.clone();
        tracing::debug!(session_id = %self.id, url = %target.url, "Opening upstream");
        Ok(async move {
            let (sink, stream) = connector.connect(&target, &token).await?.split();
            Ok((Upstream { sink, stream }, config))
        }
        .boxed())
    }

    async fn handshake(&mut self, sink: &mut FrameSink, config: &ClientConfig) -> Result<()> {
        self.state.upstream_opened();
        let target = LiveTarget::from_config(&self.relay.config, &self.relay.resolver)?;
        let setup = SetupMessage::new(
            &target.model_path,
            config,
            &self.relay.config.default_voice,
            &self.relay.config.default_instruction,
        );
        tracing::info!(session_id = %self.id, model = %target.model_path, "Sending setup message");
        sink.send(Frame::Text(serde_json::to_string(&setup)?)).await?;
        self.state.setup_sent();
        Ok(())
    }

    /// Send one error notice and close the client.
    async fn fail(&self, client: &mut FrameSink, outcome: RelayOutcome) -> RelayOutcome {
        let message = match &outcome {
            RelayOutcome::UpstreamError(m) | RelayOutcome::AuthFailed(m) | RelayOutcome::ConnectFailed(m) => m.clone(),
            RelayOutcome::ClientClosed | RelayOutcome::UpstreamClosed => return outcome,
        };
        if client.send(Frame::Text(ServerNotice::error(message).to_json())).await.is_err() {
            tracing::debug!(session_id = %self.id, "Client gone before error notice");
        }
        let _ = client.close().await;
        outcome
    }
}
