//! Meeting supervisor: owns the concurrent pipeline tasks and propagates
//! shutdown to all of them.
//!
//! The transcript console runs capture → queue → relay; the summary console
//! runs the scheduler against the shared transcript directory. Either mode
//! stops on Ctrl-C, aborting every task and releasing the audio device.

use crate::audio::{AudioCapture, AudioConfig, AudioFrame};
use crate::config::ScribeConfig;
use crate::display::SummaryDisplay;
use crate::error::{ScribeError, ScribeResult};
use crate::queue::{frame_queue, FrameProducer, DEFAULT_CAPACITY, DEFAULT_OFFER_TIMEOUT};
use crate::relay;
use crate::segment::{AssemblerConfig, SegmentAssembler};
use crate::store::{StoreConfig, TranscriptStore};
use crate::summarize::SummaryPort;
use crate::summary::{SummaryConfig, SummaryScheduler};
use crate::transcribe::{TranscriptionPort, TranscriptionSession};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Which console this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Transcript,
    Summary,
}

impl FromStr for Mode {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcript" => Ok(Mode::Transcript),
            "summary" => Ok(Mode::Summary),
            other => Err(ScribeError::Config(format!(
                "unknown console mode: {} (expected transcript or summary)",
                other
            ))),
        }
    }
}

/// Wires the pipeline for one console instance.
pub struct MeetingService {
    config: ScribeConfig,
}

impl MeetingService {
    pub fn new(config: ScribeConfig) -> Self {
        Self { config }
    }

    /// Run the live transcription pipeline until Ctrl-C or a fatal fault.
    ///
    /// Device open, stream negotiation, and session-file creation failures
    /// are fatal and propagate; everything after that is handled inside the
    /// individual tasks.
    pub async fn run_transcription(
        &self,
        transcriber: Arc<dyn TranscriptionPort>,
    ) -> ScribeResult<()> {
        let audio_config = AudioConfig::default();

        let capture = AudioCapture::new(audio_config.clone())?;
        let TranscriptionSession {
            audio_tx,
            results_rx,
        } = transcriber.open(&audio_config).await?;
        let store =
            TranscriptStore::create(&self.config.transcript_dir(), StoreConfig::default()).await?;
        info!("transcript session: {}", store.path().display());

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let stream = capture.start_capture(chunk_tx)?;

        let (producer, consumer) = frame_queue(DEFAULT_CAPACITY);
        let assembler = SegmentAssembler::new(AssemblerConfig::default());

        let mut tasks: JoinSet<ScribeResult<()>> = JoinSet::new();
        tasks.spawn(async move {
            run_capture_pump(chunk_rx, producer).await;
            Ok(())
        });
        tasks.spawn(async move {
            relay::run_sender(consumer, audio_tx).await;
            Ok(())
        });
        tasks.spawn(relay::run_receiver(results_rx, assembler, store));

        println!("Listening... Speak into your microphone");

        let outcome = tokio::select! {
            joined = tasks.join_next() => match joined {
                Some(Ok(Err(e))) => Err(e),
                Some(Ok(Ok(()))) => Err(ScribeError::Transcription(
                    "pipeline task ended unexpectedly".to_string(),
                )),
                Some(Err(e)) => Err(ScribeError::Transcription(format!(
                    "pipeline task failed: {}",
                    e
                ))),
                None => Err(ScribeError::Transcription(
                    "pipeline tasks missing".to_string(),
                )),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("CTRL-C received; stopping meeting");
                Ok(())
            }
        };

        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        drop(stream);
        debug!("audio device released");

        outcome
    }

    /// Run the summary console loop until Ctrl-C.
    pub async fn run_summary(&self, summarizer: Arc<dyn SummaryPort>) -> ScribeResult<()> {
        let display = SummaryDisplay::new(true);
        display.show_initial();

        let mut scheduler = SummaryScheduler::create(
            self.config.transcript_dir(),
            self.config.notes_dir(),
            summarizer,
            SummaryConfig::default(),
            display,
        )
        .await?;

        tokio::select! {
            _ = scheduler.run() => Ok(()),
            _ = tokio::signal::ctrl_c() => {
                info!("CTRL-C received; stopping summary console");
                Ok(())
            }
        }
    }
}

/// Move frames from the capture callback channel into the bounded queue.
/// A full queue drops the frame: capture keeps pace with real time.
async fn run_capture_pump(
    mut chunks: mpsc::UnboundedReceiver<AudioFrame>,
    producer: FrameProducer,
) {
    while let Some(frame) = chunks.recv().await {
        if frame.bytes.is_empty() {
            continue;
        }
        if !producer.offer(frame, DEFAULT_OFFER_TIMEOUT).await {
            debug!("send queue saturated; dropped one frame");
        }
    }
    debug!("capture channel closed; pump finished");
}
