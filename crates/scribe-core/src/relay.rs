//! Relay between the frame queue, the transcription service, and the
//! segment assembler.
//!
//! The two directions are independent tasks: draining the queue into the
//! service never waits on result handling, and vice versa. Send and write
//! faults are transient (log, brief pause, continue); the service closing
//! its result stream is the one fatal condition, surfaced to the supervisor.

use crate::audio::AudioFrame;
use crate::error::{ScribeError, ScribeResult};
use crate::queue::FrameConsumer;
use crate::segment::{SegmentAssembler, TranscriptSegment};
use crate::store::TranscriptStore;
use crate::transcribe::RecognitionResult;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const TRANSIENT_BACKOFF: Duration = Duration::from_millis(100);
/// Drives the assembler's elapsed-time flush between results.
const ASSEMBLER_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drain the bounded queue and forward frames to the service input.
pub async fn run_sender(
    mut frames: FrameConsumer,
    audio_tx: mpsc::Sender<AudioFrame>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = audio_tx.send(frame).await {
            warn!("audio frame forward failed: {}", e);
            tokio::time::sleep(TRANSIENT_BACKOFF).await;
        }
    }
    debug!("frame queue closed; sender finished");
}

/// Consume recognition results, assemble segments, and write them to the
/// store in arrival order. Returns once the service closes the stream.
pub async fn run_receiver(
    mut results_rx: mpsc::Receiver<RecognitionResult>,
    mut assembler: SegmentAssembler,
    mut store: TranscriptStore,
) -> ScribeResult<()> {
    let mut poll = tokio::time::interval(ASSEMBLER_POLL_INTERVAL);

    loop {
        tokio::select! {
            result = results_rx.recv() => match result {
                Some(result) => {
                    for segment in assembler.push_result(&result) {
                        write_segment(&mut store, &segment).await;
                    }
                }
                None => break,
            },
            _ = poll.tick() => {
                for segment in assembler.poll() {
                    write_segment(&mut store, &segment).await;
                }
            }
        }
    }

    // drain whatever was still pending before reporting the dead stream
    for segment in assembler.flush() {
        write_segment(&mut store, &segment).await;
    }
    if let Err(e) = store.flush().await {
        warn!("final transcript flush failed: {}", e);
    }

    Err(ScribeError::Transcription(
        "recognition stream ended".to_string(),
    ))
}

async fn write_segment(store: &mut TranscriptStore, segment: &TranscriptSegment) {
    if let Err(e) = store.write(segment).await {
        warn!("transcript write failed; lines retained for retry: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::frame_queue;

    #[tokio::test]
    async fn sender_forwards_in_order_and_finishes_on_close() {
        let (producer, consumer) = frame_queue(4);
        let (audio_tx, mut audio_rx) = mpsc::channel(4);

        let sender = tokio::spawn(run_sender(consumer, audio_tx));

        for tag in 0..3u8 {
            assert!(
                producer
                    .offer(AudioFrame { bytes: vec![tag] }, Duration::from_millis(10))
                    .await
            );
        }
        drop(producer);

        let mut seen = Vec::new();
        while let Some(frame) = audio_rx.recv().await {
            seen.push(frame.bytes[0]);
        }
        assert_eq!(seen, vec![0, 1, 2]);
        sender.await.unwrap();
    }
}
