//! Groups final recognition results into transcript segments.
//!
//! A result is worth emitting at a speaker turn boundary or a natural
//! sentence boundary; anything else is an intermediate fragment the service
//! will restate in a later final result, so it is discarded rather than
//! buffered. Emit-worthy pairs accumulate until a size or elapsed-time
//! threshold flushes them to the store in arrival order.

use crate::transcribe::RecognitionResult;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

const SENTENCE_ENDINGS: [char; 3] = ['.', '?', '!'];

/// The atomic unit written to the transcript. `text` is non-empty and
/// trimmed.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub speaker: Option<String>,
    pub text: String,
    pub produced_at: DateTime<Local>,
}

/// Flush thresholds. Defaults: 5 pending pairs or 2 s since the last flush.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub max_pending: usize,
    pub max_age: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_pending: 5,
            max_age: Duration::from_secs(2),
        }
    }
}

/// Turns the recognition stream into ordered transcript segments.
pub struct SegmentAssembler {
    config: AssemblerConfig,
    /// Speaker of the most recently emitted segment.
    current_speaker: Option<String>,
    pending: Vec<(Option<String>, String)>,
    last_flush: Instant,
}

impl SegmentAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            current_speaker: None,
            pending: Vec::new(),
            last_flush: Instant::now(),
        }
    }

    /// Feed one recognition result. Partial results are ignored. Returns the
    /// segments flushed by this call (usually none).
    pub fn push_result(&mut self, result: &RecognitionResult) -> Vec<TranscriptSegment> {
        if result.is_partial {
            return Vec::new();
        }

        let mut flushed = Vec::new();
        for alternative in &result.alternatives {
            let text = alternative.transcript.trim();
            if text.is_empty() {
                continue;
            }
            let speaker = alternative.speaker().map(str::to_string);
            if !self.should_emit(speaker.as_deref(), text) {
                continue;
            }

            self.pending.push((speaker, text.to_string()));

            if self.pending.len() >= self.config.max_pending
                || self.last_flush.elapsed() > self.config.max_age
            {
                flushed.extend(self.flush());
            }
        }
        flushed
    }

    /// Elapsed-time flush for the relay's periodic poll, so a lone buffered
    /// pair still reaches the store without waiting for the next result.
    pub fn poll(&mut self) -> Vec<TranscriptSegment> {
        if !self.pending.is_empty() && self.last_flush.elapsed() > self.config.max_age {
            self.flush()
        } else {
            Vec::new()
        }
    }

    /// Convert every pending pair into a segment, in order, updating the
    /// emitted-speaker state per pair.
    pub fn flush(&mut self) -> Vec<TranscriptSegment> {
        let mut segments = Vec::with_capacity(self.pending.len());
        for (speaker, text) in self.pending.drain(..) {
            self.current_speaker = speaker.clone();
            segments.push(TranscriptSegment {
                speaker,
                text,
                produced_at: Local::now(),
            });
        }
        self.last_flush = Instant::now();
        segments
    }

    fn should_emit(&self, speaker: Option<&str>, text: &str) -> bool {
        if self.is_speaker_change(speaker) {
            return true;
        }
        text.chars()
            .next_back()
            .map_or(false, |c| SENTENCE_ENDINGS.contains(&c))
    }

    /// A turn boundary registers only when the last emitted speaker and the
    /// new one are both known and differ; untagged results never read as a
    /// speaker change.
    fn is_speaker_change(&self, speaker: Option<&str>) -> bool {
        matches!(
            (self.current_speaker.as_deref(), speaker),
            (Some(current), Some(next)) if current != next
        )
    }
}
