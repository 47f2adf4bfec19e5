//! # Scribe Core — live meeting transcription and rolling notes
//!
//! Moves audio from the microphone to a durable transcript through a
//! streaming recognition service, and keeps a meeting summary fresh from a
//! sliding window of recent transcript content.
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌───────────────┐   ┌─────────────┐
//! │  Audio In  │ → │ Frame Queue │ → │ Streaming STT │ → │   Segment   │
//! │   (cpal)   │   │ (bounded)   │   │  (websocket)  │   │  Assembler  │
//! └────────────┘   └─────────────┘   └───────────────┘   └──────┬──────┘
//!                                                               ↓
//! ┌────────────┐   ┌──────────────┐                      ┌─────────────┐
//! │  Summary   │ ← │   Sliding    │ ←──── poll file ──── │ Transcript  │
//! │ Scheduler  │   │ Window (90s) │                      │    Store    │
//! └────────────┘   └──────────────┘                      └─────────────┘
//! ```
//!
//! The transcript console and the summary console are separate processes
//! sharing only the transcript file; `meeting::MeetingService` runs one or
//! the other. External services sit behind two narrow seams:
//! [`transcribe::TranscriptionPort`] and [`summarize::SummaryPort`].

pub mod audio;
pub mod config;
pub mod display;
pub mod error;
pub mod meeting;
pub mod queue;
pub mod relay;
pub mod segment;
pub mod store;
pub mod summarize;
pub mod summary;
pub mod transcribe;

pub use audio::{AudioCapture, AudioConfig, AudioFrame};
pub use config::ScribeConfig;
pub use display::SummaryDisplay;
pub use error::{ScribeError, ScribeResult};
pub use meeting::{MeetingService, Mode};
pub use queue::{frame_queue, FrameConsumer, FrameProducer};
pub use segment::{AssemblerConfig, SegmentAssembler, TranscriptSegment};
pub use store::{StoreConfig, TranscriptStore};
pub use summarize::{
    build_prompt, OpenRouterSummarizer, PlaceholderSummarizer, SummaryPort, SummaryRequest,
    DEFAULT_TEMPLATE,
};
pub use summary::{
    SlidingWindow, SummaryConfig, SummaryDocument, SummaryScheduler, WAITING_NOTICE,
};
pub use transcribe::{
    RecognitionAlternative, RecognitionResult, RecognizedItem, ScriptedTranscriber,
    SonioxRealtime, TranscriptionPort, TranscriptionSession,
};
