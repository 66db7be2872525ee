//! End-to-end relay behavior over in-memory channels.

use async_trait::async_trait;
use base64::prelude::*;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use gateway_core::{GatewayConfig, GatewayError, Result, StaticTokenProvider, TokenProvider};
use gateway_live::{Duplex, Frame, LiveRelay, LiveTarget, RelayOutcome, UpstreamConnector};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Test side of the upstream connection.
struct UpstreamPeer {
    received: mpsc::Receiver<Frame>,
    inject: mpsc::Sender<Result<Frame>>,
}

fn upstream_pair() -> (Duplex, UpstreamPeer) {
    let (to_peer, received) = mpsc::channel::<Frame>(16);
    let (inject, from_peer) = mpsc::channel::<Result<Frame>>(16);
    let duplex = Duplex::new(to_peer.sink_map_err(|e| GatewayError::connection(e.to_string())), from_peer);
    (duplex, UpstreamPeer { received, inject })
}

#[derive(Default)]
struct MockConnector {
    upstream: Mutex<Option<Duplex>>,
    calls: Mutex<Vec<(LiveTarget, String)>>,
}

impl MockConnector {
    fn with_upstream(upstream: Duplex) -> Self {
        Self { upstream: Mutex::new(Some(upstream)), calls: Mutex::default() }
    }

    fn calls(&self) -> Vec<(LiveTarget, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamConnector for MockConnector {
    async fn connect(&self, target: &LiveTarget, token: &str) -> Result<Duplex> {
        self.calls.lock().unwrap().push((target.clone(), token.to_string()));
        self.upstream.lock().unwrap().take().ok_or_else(|| GatewayError::connection("connection refused"))
    }
}

/// Hands out its token only after `release` is notified.
struct GatedTokens {
    release: Arc<Notify>,
}

#[async_trait]
impl TokenProvider for GatedTokens {
    async fn access_token(&self) -> Result<String> {
        self.release.notified().await;
        Ok("late-token".to_string())
    }
}

struct FailingTokens;

#[async_trait]
impl TokenProvider for FailingTokens {
    async fn access_token(&self) -> Result<String> {
        Err(GatewayError::auth("no credentials"))
    }
}

fn config() -> GatewayConfig {
    GatewayConfig::new().with_project_id("proj")
}

fn start(relay: LiveRelay) -> (Duplex, JoinHandle<RelayOutcome>) {
    let (session_side, client) = Duplex::pair(16);
    let handle = tokio::spawn(async move { relay.serve(session_side).await });
    (client, handle)
}

async fn recv<S>(stream: &mut S) -> Option<Frame>
where
    S: futures::Stream<Item = Result<Frame>> + Unpin,
{
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for frame")
        .map(|frame| frame.expect("stream error"))
}

async fn recv_upstream(peer: &mut UpstreamPeer) -> Option<Frame> {
    tokio::time::timeout(Duration::from_secs(5), peer.received.next()).await.expect("timed out waiting for upstream")
}

fn json_of(frame: Option<Frame>) -> Value {
    match frame {
        Some(Frame::Text(text)) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

const CONFIG: &str = r#"{"type":"config","config":{"voice":"Kore","systemInstruction":"Be brief"}}"#;

/// Send the config and complete the handshake; returns the setup message.
async fn handshake(client: &mut Duplex, peer: &mut UpstreamPeer, config_message: &str) -> Value {
    client.sink.send(Frame::text(config_message)).await.unwrap();
    let setup = json_of(recv_upstream(peer).await);
    assert_eq!(json_of(recv(&mut client.stream).await), json!({"type": "setup_complete"}));
    setup
}

#[tokio::test]
async fn test_setup_message_and_audio_relay() {
    let (upstream, mut peer) = upstream_pair();
    let connector = Arc::new(MockConnector::with_upstream(upstream));
    let relay = LiveRelay::new(config(), Arc::new(StaticTokenProvider::new("tok")), connector.clone());
    let (mut client, handle) = start(relay);

    let setup = handshake(&mut client, &mut peer, CONFIG).await;
    assert_eq!(
        setup["setup"]["model"],
        "projects/proj/locations/us-central1/publishers/google/models/gemini-live-2.5-flash-native-audio"
    );
    assert_eq!(setup["setup"]["generation_config"]["response_modalities"], json!(["AUDIO"]));
    assert_eq!(
        setup["setup"]["generation_config"]["speech_config"]["voice_config"]["prebuilt_voice_config"]["voice_name"],
        "Kore"
    );
    assert_eq!(setup["setup"]["system_instruction"]["parts"][0]["text"], "Be brief");
    assert!(setup["setup"].get("tools").is_none());

    let calls = connector.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "tok");

    let pcm: Vec<u8> = (0..=255).collect();
    client.sink.send(Frame::binary(pcm.clone())).await.unwrap();
    let audio = json_of(recv_upstream(&mut peer).await);
    let chunk = &audio["realtime_input"]["media_chunks"][0];
    assert_eq!(chunk["mime_type"], "audio/pcm;rate=16000");
    assert_eq!(chunk["data"], BASE64_STANDARD.encode(&pcm));
    assert_eq!(audio["realtime_input"]["media_chunks"].as_array().unwrap().len(), 1);

    client.sink.send(Frame::text(r#"{"foo":1}"#)).await.unwrap();
    client.sink.send(Frame::text(r#"{"client_content":{}}"#)).await.unwrap();
    assert_eq!(recv_upstream(&mut peer).await, Some(Frame::text(r#"{"client_content":{}}"#)));

    client.sink.close().await.unwrap();
    assert_eq!(handle.await.unwrap(), RelayOutcome::ClientClosed);
}

#[tokio::test]
async fn test_upstream_frames_are_classified() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, _handle) = start(relay);
    handshake(&mut client, &mut peer, CONFIG).await;

    peer.inject.send(Ok(Frame::binary(br#"{"type":"x"}"#.to_vec()))).await.unwrap();
    assert_eq!(recv(&mut client.stream).await, Some(Frame::text(r#"{"type":"x"}"#)));

    let audio = vec![0xffu8, 0x00, 0x7b, 0x80, 0x01];
    peer.inject.send(Ok(Frame::binary(audio.clone()))).await.unwrap();
    assert_eq!(recv(&mut client.stream).await, Some(Frame::binary(audio)));

    peer.inject.send(Ok(Frame::text(r#"{"serverContent":{}}"#))).await.unwrap();
    assert_eq!(recv(&mut client.stream).await, Some(Frame::text(r#"{"serverContent":{}}"#)));
}

#[tokio::test]
async fn test_audio_before_setup_is_dropped() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, _handle) = start(relay);

    client.sink.send(Frame::binary(vec![1u8, 2, 3])).await.unwrap();
    client.sink.send(Frame::text(r#"{"client_content":{"early":true}}"#)).await.unwrap();
    handshake(&mut client, &mut peer, CONFIG).await;

    client.sink.send(Frame::text(r#"{"client_content":{"turns":[]}}"#)).await.unwrap();
    assert_eq!(recv_upstream(&mut peer).await, Some(Frame::text(r#"{"client_content":{"turns":[]}}"#)));
}

#[tokio::test]
async fn test_config_before_auth_is_held_until_token_arrives() {
    let release = Arc::new(Notify::new());
    let (upstream, mut peer) = upstream_pair();
    let connector = Arc::new(MockConnector::with_upstream(upstream));
    let relay = LiveRelay::new(config(), Arc::new(GatedTokens { release: release.clone() }), connector.clone());
    let (mut client, _handle) = start(relay);

    client.sink.send(Frame::text(CONFIG)).await.unwrap();
    client.sink.send(Frame::text(r#"{"type":"config","config":{"voice":"Other"}}"#)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(connector.calls().is_empty());

    release.notify_one();
    let setup = json_of(recv_upstream(&mut peer).await);
    assert_eq!(
        setup["setup"]["generation_config"]["speech_config"]["voice_config"]["prebuilt_voice_config"]["voice_name"],
        "Kore"
    );
    assert_eq!(json_of(recv(&mut client.stream).await), json!({"type": "setup_complete"}));
    assert_eq!(connector.calls()[0].1, "late-token");
}

#[tokio::test]
async fn test_grounding_marker_enables_search() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, _handle) = start(relay);

    let setup = handshake(
        &mut client,
        &mut peer,
        r#"{"type":"config","config":{"tools":[{"name":"google_search"},{"name":"lookup"}]}}"#,
    )
    .await;
    assert_eq!(setup["setup"]["tools"], json!([{"google_search": {}}]));
    assert_eq!(
        setup["setup"]["generation_config"]["speech_config"]["voice_config"]["prebuilt_voice_config"]["voice_name"],
        "Puck"
    );
}

#[tokio::test]
async fn test_null_optional_fields_still_complete_setup() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, _handle) = start(relay);

    let setup = handshake(
        &mut client,
        &mut peer,
        r#"{"type":"config","config":{"voice":null,"systemInstruction":null,"tools":null}}"#,
    )
    .await;
    assert!(setup["setup"].get("tools").is_none());
    assert_eq!(
        setup["setup"]["generation_config"]["speech_config"]["voice_config"]["prebuilt_voice_config"]["voice_name"],
        "Puck"
    );
}

#[tokio::test]
async fn test_auth_failure_sends_error_and_closes() {
    let connector = Arc::new(MockConnector::default());
    let relay = LiveRelay::new(config(), Arc::new(FailingTokens), connector.clone());
    let (mut client, handle) = start(relay);

    let notice = json_of(recv(&mut client.stream).await);
    assert_eq!(notice["type"], "error");
    assert!(notice["error"].as_str().unwrap().contains("no credentials"));
    assert_eq!(recv(&mut client.stream).await, None);
    assert!(matches!(handle.await.unwrap(), RelayOutcome::AuthFailed(_)));
    assert!(connector.calls().is_empty());
}

#[tokio::test]
async fn test_connect_failure_sends_error() {
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::default()),
    );
    let (mut client, handle) = start(relay);
    client.sink.send(Frame::text(CONFIG)).await.unwrap();

    let notice = json_of(recv(&mut client.stream).await);
    assert_eq!(notice["type"], "error");
    assert_eq!(recv(&mut client.stream).await, None);
    assert!(matches!(handle.await.unwrap(), RelayOutcome::ConnectFailed(_)));
}

#[tokio::test]
async fn test_missing_project_fails_session() {
    let relay = LiveRelay::new(
        GatewayConfig::new(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::default()),
    );
    let (mut client, handle) = start(relay);
    client.sink.send(Frame::text(CONFIG)).await.unwrap();

    let notice = json_of(recv(&mut client.stream).await);
    assert!(notice["error"].as_str().unwrap().contains("GOOGLE_CLOUD_PROJECT"));
    assert!(matches!(handle.await.unwrap(), RelayOutcome::ConnectFailed(_)));
}

#[tokio::test]
async fn test_upstream_error_notifies_client_once() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, handle) = start(relay);
    handshake(&mut client, &mut peer, CONFIG).await;

    peer.inject.send(Err(GatewayError::connection("reset by peer"))).await.unwrap();
    let notice = json_of(recv(&mut client.stream).await);
    assert_eq!(notice["type"], "error");
    assert!(notice["error"].as_str().unwrap().contains("reset by peer"));
    assert_eq!(recv(&mut client.stream).await, None);
    assert!(matches!(handle.await.unwrap(), RelayOutcome::UpstreamError(_)));
}

#[tokio::test]
async fn test_upstream_close_closes_client() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, handle) = start(relay);
    handshake(&mut client, &mut peer, CONFIG).await;

    peer.inject.close_channel();
    assert_eq!(recv(&mut client.stream).await, None);
    assert_eq!(handle.await.unwrap(), RelayOutcome::UpstreamClosed);
}

#[tokio::test]
async fn test_client_close_closes_upstream() {
    let (upstream, mut peer) = upstream_pair();
    let relay = LiveRelay::new(
        config(),
        Arc::new(StaticTokenProvider::new("tok")),
        Arc::new(MockConnector::with_upstream(upstream)),
    );
    let (mut client, handle) = start(relay);
    handshake(&mut client, &mut peer, CONFIG).await;

    client.sink.close().await.unwrap();
    assert_eq!(handle.await.unwrap(), RelayOutcome::ClientClosed);
    assert_eq!(recv_upstream(&mut peer).await, None);
}
