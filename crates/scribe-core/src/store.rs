//! Durable transcript session file with buffered appends.
//!
//! One file per session, created with a header at startup. Lines are echoed
//! to the live display immediately and buffered in memory; a flush appends
//! every buffered line in a single write. A failed flush keeps the buffer so
//! the same lines retry, in order, on the next write.

use crate::error::ScribeResult;
use crate::segment::TranscriptSegment;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Flush thresholds and echo switch. Defaults: 5 buffered lines or 2 s.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub max_buffered: usize,
    pub max_age: Duration,
    /// Print each line to the console as it is written.
    pub echo: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_buffered: 5,
            max_age: Duration::from_secs(2),
            echo: true,
        }
    }
}

/// Append-only transcript writer for one session.
pub struct TranscriptStore {
    path: PathBuf,
    buffer: Vec<String>,
    last_flush: Instant,
    config: StoreConfig,
}

impl TranscriptStore {
    /// Create the session file under `dir` with its header line.
    pub async fn create(dir: &Path, config: StoreConfig) -> ScribeResult<Self> {
        fs::create_dir_all(dir).await?;

        let stamp = Local::now().format("%Y%m%d_%H%M");
        let path = dir.join(format!("transcript_{}.txt", stamp));
        let header = format!(
            "Transcript started at {}\n\n",
            Local::now().format("%Y-%m-%d %I:%M %p")
        );
        fs::write(&path, header).await?;

        debug!("transcript session file: {}", path.display());

        Ok(Self {
            path,
            buffer: Vec::new(),
            last_flush: Instant::now(),
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format, echo, and buffer one segment; flush when the buffer or its
    /// age crosses a threshold.
    pub async fn write(&mut self, segment: &TranscriptSegment) -> ScribeResult<()> {
        let line = format_line(segment);
        if self.config.echo {
            println!("{}", line);
        }
        self.buffer.push(line);

        if self.buffer.len() >= self.config.max_buffered
            || self.last_flush.elapsed() >= self.config.max_age
        {
            self.flush().await?;
        }
        Ok(())
    }

    /// Append all buffered lines in one write. The buffer is cleared only on
    /// success; on failure it is retained for the next attempt.
    pub async fn flush(&mut self) -> ScribeResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let chunk = self.buffer.join("\n") + "\n";
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(chunk.as_bytes()).await?;
        file.flush().await?;

        self.buffer.clear();
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Lines currently awaiting a flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

fn format_line(segment: &TranscriptSegment) -> String {
    let timestamp = segment.produced_at.format("%m-%d-%Y %I:%M %p");
    match &segment.speaker {
        Some(speaker) => format!("[{}] Speaker {}: {}", timestamp, speaker, segment.text),
        None => format!("[{}] Transcript: {}", timestamp, segment.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::tempdir;

    fn segment(speaker: Option<&str>, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            speaker: speaker.map(str::to_string),
            text: text.to_string(),
            produced_at: Local::now(),
        }
    }

    fn quiet_config() -> StoreConfig {
        StoreConfig {
            echo: false,
            ..StoreConfig::default()
        }
    }

    #[tokio::test]
    async fn creates_file_with_header() {
        let dir = tempdir().unwrap();
        let store = TranscriptStore::create(dir.path(), quiet_config())
            .await
            .unwrap();

        let content = fs::read_to_string(store.path()).await.unwrap();
        assert!(content.starts_with("Transcript started at "));
        assert!(content.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn line_format_matches_speaker_presence() {
        let with_speaker = format_line(&segment(Some("1"), "Hello."));
        assert!(with_speaker.contains("] Speaker 1: Hello."));

        let without = format_line(&segment(None, "Hello."));
        assert!(without.contains("] Transcript: Hello."));
    }

    #[tokio::test]
    async fn preserves_order_across_flush_boundaries() {
        let dir = tempdir().unwrap();
        let mut store = TranscriptStore::create(dir.path(), quiet_config())
            .await
            .unwrap();

        let texts = ["A.", "B.", "C.", "D.", "E.", "F.", "G."];
        for text in texts {
            store.write(&segment(Some("1"), text)).await.unwrap();
        }
        // five lines auto-flushed, two still buffered
        assert_eq!(store.buffered(), 2);
        store.flush().await.unwrap();

        let content = fs::read_to_string(store.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().skip(2).collect();
        assert_eq!(lines.len(), 7);
        for (line, text) in lines.iter().zip(texts) {
            assert!(line.ends_with(text), "{} should end with {}", line, text);
        }
    }

    #[tokio::test]
    async fn full_buffer_flushes_before_age_threshold() {
        let dir = tempdir().unwrap();
        let mut store = TranscriptStore::create(dir.path(), quiet_config())
            .await
            .unwrap();

        for i in 0..5 {
            store
                .write(&segment(Some("1"), &format!("Line {}.", i)))
                .await
                .unwrap();
        }

        assert_eq!(store.buffered(), 0);
        let content = fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(content.lines().skip(2).count(), 5);
    }

    #[tokio::test]
    async fn aged_buffer_flushes_on_next_write() {
        let dir = tempdir().unwrap();
        let config = StoreConfig {
            max_buffered: 5,
            max_age: Duration::from_millis(20),
            echo: false,
        };
        let mut store = TranscriptStore::create(dir.path(), config).await.unwrap();

        store.write(&segment(Some("1"), "First.")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.write(&segment(Some("1"), "Second.")).await.unwrap();

        assert_eq!(store.buffered(), 0);
        let content = fs::read_to_string(store.path()).await.unwrap();
        assert!(content.contains("First."));
        assert!(content.contains("Second."));
    }

    #[tokio::test]
    async fn failed_flush_retains_buffer_for_retry() {
        let dir = tempdir().unwrap();
        let mut store = TranscriptStore::create(dir.path(), quiet_config())
            .await
            .unwrap();
        let path = store.path().to_path_buf();

        store.write(&segment(Some("1"), "Kept line.")).await.unwrap();
        assert_eq!(store.buffered(), 1);

        // make the append target disappear: flush must fail and keep the line
        fs::remove_file(&path).await.unwrap();
        assert!(store.flush().await.is_err());
        assert_eq!(store.buffered(), 1);

        // once the file is back, the retained line lands on the next flush
        fs::write(&path, "").await.unwrap();
        store.flush().await.unwrap();
        assert_eq!(store.buffered(), 0);

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("Kept line."));
    }
}
