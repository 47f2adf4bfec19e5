//! Bounded frame queue between capture and the network send loop.
//!
//! Capture must keep pace with real time: when the queue stays full past
//! the offer timeout the frame is dropped rather than stalling the
//! microphone path or growing memory without bound.

use crate::audio::AudioFrame;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// Frames buffered between capture and send.
pub const DEFAULT_CAPACITY: usize = 10;

/// How long a producer waits on a full queue before dropping the frame.
pub const DEFAULT_OFFER_TIMEOUT: Duration = Duration::from_millis(100);

/// Create a bounded frame queue.
pub fn frame_queue(capacity: usize) -> (FrameProducer, FrameConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (FrameProducer { tx }, FrameConsumer { rx })
}

/// Capture-side handle.
#[derive(Clone)]
pub struct FrameProducer {
    tx: mpsc::Sender<AudioFrame>,
}

impl FrameProducer {
    /// Enqueue a frame, waiting at most `wait` for capacity. Returns `false`
    /// when the frame was dropped (queue full past the timeout, or consumer
    /// gone).
    pub async fn offer(&self, frame: AudioFrame, wait: Duration) -> bool {
        match timeout(wait, self.tx.send(frame)).await {
            Ok(Ok(())) => true,
            Ok(Err(_)) => false,
            Err(_) => {
                debug!("frame queue full; dropping one frame");
                false
            }
        }
    }
}

/// Send-loop-side handle.
pub struct FrameConsumer {
    rx: mpsc::Receiver<AudioFrame>,
}

impl FrameConsumer {
    /// Await the next frame; `None` once all producers are gone.
    pub async fn recv(&mut self) -> Option<AudioFrame> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> AudioFrame {
        AudioFrame { bytes: vec![tag] }
    }

    #[tokio::test]
    async fn drops_when_full_past_timeout() {
        let (producer, mut consumer) = frame_queue(2);
        let wait = Duration::from_millis(10);

        assert!(producer.offer(frame(1), wait).await);
        assert!(producer.offer(frame(2), wait).await);
        assert!(!producer.offer(frame(3), wait).await);

        assert_eq!(consumer.recv().await.unwrap().bytes, vec![1]);
        assert_eq!(consumer.recv().await.unwrap().bytes, vec![2]);
    }

    #[tokio::test]
    async fn preserves_arrival_order() {
        let (producer, mut consumer) = frame_queue(4);
        for tag in 0..4u8 {
            assert!(producer.offer(frame(tag), Duration::from_millis(10)).await);
        }
        drop(producer);

        let mut seen = Vec::new();
        while let Some(f) = consumer.recv().await {
            seen.push(f.bytes[0]);
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn offer_fails_after_consumer_dropped() {
        let (producer, consumer) = frame_queue(1);
        drop(consumer);
        assert!(!producer.offer(frame(9), Duration::from_millis(10)).await);
    }
}
