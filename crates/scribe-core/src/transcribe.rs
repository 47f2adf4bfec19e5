//! Streaming transcription port and adapters.
//!
//! The pipeline talks to the recognition service through a narrow
//! bidirectional contract: frames go in through `audio_tx`, ordered
//! `RecognitionResult`s come back through `results_rx`. Any realtime STT
//! service can sit behind `TranscriptionPort`; the pipeline never sees
//! vendor wire formats.

use crate::audio::{AudioConfig, AudioFrame};
use crate::error::{ScribeError, ScribeResult};
use async_trait::async_trait;
use native_tls::TlsStream;
use std::net::TcpStream;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tungstenite::{Message, WebSocket};

/// One recognized word or punctuation mark within an alternative.
#[derive(Debug, Clone)]
pub struct RecognizedItem {
    pub content: String,
    /// Diarization label when the service attributed this item to a speaker.
    pub speaker: Option<String>,
}

/// One candidate transcription for a span of audio.
#[derive(Debug, Clone)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub items: Vec<RecognizedItem>,
}

impl RecognitionAlternative {
    /// Speaker of the first item that carries one.
    pub fn speaker(&self) -> Option<&str> {
        self.items.iter().find_map(|item| item.speaker.as_deref())
    }
}

/// One unit of the recognition stream. Partial results are provisional and
/// superseded later; only final results are consumed downstream.
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    pub is_partial: bool,
    pub alternatives: Vec<RecognitionAlternative>,
}

impl RecognitionResult {
    /// Build a final single-alternative result; `speaker` applies to every
    /// item. Used by the scripted adapter and tests.
    pub fn final_text(speaker: Option<&str>, text: &str) -> Self {
        Self {
            is_partial: false,
            alternatives: vec![RecognitionAlternative {
                transcript: text.to_string(),
                items: vec![RecognizedItem {
                    content: text.to_string(),
                    speaker: speaker.map(str::to_string),
                }],
            }],
        }
    }
}

/// An open bidirectional stream to the transcription service.
///
/// The two halves are independent: sending never waits on receiving.
/// Dropping `audio_tx` signals end of audio; `results_rx` yielding `None`
/// means the service closed the stream.
pub struct TranscriptionSession {
    pub audio_tx: mpsc::Sender<AudioFrame>,
    pub results_rx: mpsc::Receiver<RecognitionResult>,
}

/// Factory for transcription streams. Stream-negotiation failure is a setup
/// fault and fatal to the meeting.
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    async fn open(&self, format: &AudioConfig) -> ScribeResult<TranscriptionSession>;
}

// ---------------------------------------------------------------------------
// Soniox realtime adapter
// ---------------------------------------------------------------------------

const SONIOX_RT_ENDPOINT: &str = "wss://stt-rt.soniox.com/transcribe-websocket";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HANDSHAKE_IO_TIMEOUT: Duration = Duration::from_secs(30);
/// Socket read timeout once streaming: lets one worker thread interleave
/// both directions without starving either.
const STREAM_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Realtime STT over Soniox's websocket API with speaker diarization.
///
/// The socket runs in a dedicated thread (tungstenite is synchronous)
/// bridged to the async pipeline via channels, the same way the capture
/// path bridges its device thread.
#[derive(Debug, Clone)]
pub struct SonioxRealtime {
    api_key: String,
    model: String,
    endpoint: String,
}

impl SonioxRealtime {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "stt-rt-preview".to_string(),
            endpoint: SONIOX_RT_ENDPOINT.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Point at a different endpoint (self-hosted gateway, test server).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl TranscriptionPort for SonioxRealtime {
    async fn open(&self, format: &AudioConfig) -> ScribeResult<TranscriptionSession> {
        let start = serde_json::json!({
            "api_key": self.api_key,
            "model": self.model,
            "audio_format": "pcm_s16le",
            "sample_rate": format.sample_rate,
            "num_channels": format.channels,
            "enable_speaker_diarization": true,
        });

        let endpoint = self.endpoint.clone();
        let socket = tokio::task::spawn_blocking(move || connect_realtime(&endpoint, &start))
            .await
            .map_err(|e| ScribeError::Transcription(format!("connect task failed: {}", e)))??;

        info!("transcription stream open ({})", self.model);

        let (audio_tx, audio_rx) = mpsc::channel::<AudioFrame>(32);
        let (results_tx, results_rx) = mpsc::channel::<RecognitionResult>(32);

        std::thread::spawn(move || run_socket_worker(socket, audio_rx, results_tx));

        Ok(TranscriptionSession {
            audio_tx,
            results_rx,
        })
    }
}

/// Dial, TLS-wrap, websocket-upgrade, and send the stream configuration.
/// Every failure here is a negotiation failure.
fn connect_realtime(
    endpoint: &str,
    start: &serde_json::Value,
) -> ScribeResult<WebSocket<TlsStream<TcpStream>>> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| ScribeError::Transcription(format!("bad endpoint {}: {}", endpoint, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| ScribeError::Transcription(format!("no host in endpoint {}", endpoint)))?
        .to_string();
    let port = url.port().unwrap_or(443);

    use std::net::ToSocketAddrs;
    let addr = format!("{}:{}", host, port)
        .to_socket_addrs()
        .map_err(|e| ScribeError::Transcription(format!("resolve {} failed: {}", host, e)))?
        .next()
        .ok_or_else(|| ScribeError::Transcription(format!("no address for {}", host)))?;

    let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| ScribeError::Transcription(format!("connect {} failed: {}", host, e)))?;
    tcp.set_read_timeout(Some(HANDSHAKE_IO_TIMEOUT))
        .map_err(|e| ScribeError::Transcription(e.to_string()))?;
    tcp.set_write_timeout(Some(HANDSHAKE_IO_TIMEOUT))
        .map_err(|e| ScribeError::Transcription(e.to_string()))?;
    tcp.set_nodelay(true)
        .map_err(|e| ScribeError::Transcription(e.to_string()))?;

    let connector = native_tls::TlsConnector::new()
        .map_err(|e| ScribeError::Transcription(format!("tls init failed: {}", e)))?;
    let tls = connector
        .connect(&host, tcp)
        .map_err(|e| ScribeError::Transcription(format!("tls handshake failed: {}", e)))?;

    let (mut socket, _response) = tungstenite::client::client(endpoint, tls)
        .map_err(|e| ScribeError::Transcription(format!("websocket handshake failed: {}", e)))?;

    socket
        .send(Message::Text(start.to_string().into()))
        .map_err(|e| ScribeError::Transcription(format!("stream config send failed: {}", e)))?;

    socket
        .get_ref()
        .get_ref()
        .set_read_timeout(Some(STREAM_READ_TIMEOUT))
        .map_err(|e| ScribeError::Transcription(e.to_string()))?;

    Ok(socket)
}

/// Single-thread duplex loop: drain pending frames out, poll the socket in.
/// The short read timeout bounds how long a read can delay a send.
fn run_socket_worker(
    mut socket: WebSocket<TlsStream<TcpStream>>,
    mut audio_rx: mpsc::Receiver<AudioFrame>,
    results_tx: mpsc::Sender<RecognitionResult>,
) {
    let mut input_open = true;

    loop {
        while input_open {
            match audio_rx.try_recv() {
                Ok(frame) => {
                    if let Err(e) = socket.send(Message::Binary(frame.bytes.into())) {
                        warn!("audio frame send failed: {}", e);
                        let _ = socket.close(None);
                        return;
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    input_open = false;
                    // empty text frame marks end of audio
                    let _ = socket.send(Message::Text("".into()));
                }
            }
        }

        match socket.read() {
            Ok(Message::Text(msg)) => match parse_results(msg.as_str()) {
                Ok(results) => {
                    for result in results {
                        if results_tx.blocking_send(result).is_err() {
                            let _ = socket.close(None);
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("transcription message dropped: {}", e);
                }
            },
            Ok(Message::Close(_)) => {
                info!("transcription service closed the stream");
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                warn!("transcription socket read failed: {}", e);
                return;
            }
        }
    }
}

/// Translate one service message into ordered `RecognitionResult`s. Final
/// tokens and still-revisable tokens become separate results.
fn parse_results(raw: &str) -> ScribeResult<Vec<RecognitionResult>> {
    let json: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ScribeError::Transcription(format!("malformed message: {}", e)))?;

    if json.get("error_code").is_some() {
        let code = json
            .get("error_code")
            .map(|c| c.to_string())
            .unwrap_or_default();
        let message = json
            .get("error_message")
            .and_then(|m| m.as_str())
            .unwrap_or("");
        return Err(ScribeError::Transcription(format!(
            "service error {}: {}",
            code, message
        )));
    }

    let Some(tokens) = json.get("tokens").and_then(|t| t.as_array()) else {
        return Ok(Vec::new());
    };

    let mut finals = Vec::new();
    let mut partials = Vec::new();
    for token in tokens {
        let Some(text) = token.get("text").and_then(|t| t.as_str()) else {
            continue;
        };
        let speaker = token.get("speaker").and_then(|s| {
            s.as_str()
                .map(str::to_string)
                .or_else(|| s.as_u64().map(|n| n.to_string()))
        });
        let item = RecognizedItem {
            content: text.to_string(),
            speaker,
        };
        if token
            .get("is_final")
            .and_then(|f| f.as_bool())
            .unwrap_or(false)
        {
            finals.push(item);
        } else {
            partials.push(item);
        }
    }

    let mut results = Vec::new();
    if !finals.is_empty() {
        results.push(assemble_result(false, finals));
    }
    if !partials.is_empty() {
        results.push(assemble_result(true, partials));
    }
    Ok(results)
}

fn assemble_result(is_partial: bool, items: Vec<RecognizedItem>) -> RecognitionResult {
    let transcript: String = items.iter().map(|item| item.content.as_str()).collect();
    RecognitionResult {
        is_partial,
        alternatives: vec![RecognitionAlternative { transcript, items }],
    }
}

// ---------------------------------------------------------------------------
// Scripted adapter (tests and dry runs without a service)
// ---------------------------------------------------------------------------

/// Yields a pre-programmed result sequence, then closes the stream.
/// Audio frames are accepted and discarded.
#[derive(Debug, Default)]
pub struct ScriptedTranscriber {
    script: Vec<RecognitionResult>,
}

impl ScriptedTranscriber {
    pub fn new(script: Vec<RecognitionResult>) -> Self {
        Self { script }
    }
}

#[async_trait]
impl TranscriptionPort for ScriptedTranscriber {
    async fn open(&self, _format: &AudioConfig) -> ScribeResult<TranscriptionSession> {
        let (audio_tx, mut audio_rx) = mpsc::channel::<AudioFrame>(32);
        tokio::spawn(async move { while audio_rx.recv().await.is_some() {} });

        let (results_tx, results_rx) = mpsc::channel(32);
        let script = self.script.clone();
        tokio::spawn(async move {
            for result in script {
                if results_tx.send(result).await.is_err() {
                    break;
                }
            }
        });

        Ok(TranscriptionSession {
            audio_tx,
            results_rx,
        })
    }
}
