//! Rolling summary scheduler over a sliding transcript window.
//!
//! The scheduler polls every 5 s and regenerates once 30 s have passed since
//! the last successful summary. Each trigger snapshots the newest transcript
//! file wholesale into a 90 s sliding window; the window concatenation is
//! what the summarization service sees, together with the previous notes as
//! context. A failed regeneration keeps the stale summary and is never fatal.

use crate::display::SummaryDisplay;
use crate::error::ScribeResult;
use crate::summarize::{SummaryPort, SummaryRequest};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info, warn};

/// Initial content of the summary file before the first generation.
pub const WAITING_NOTICE: &str = "Waiting for meeting content...\n";

/// Scheduler timing. Defaults: poll 5 s, regenerate after 30 s, retain 90 s.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub poll_interval: Duration,
    pub min_gap: Duration,
    pub retention: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            min_gap: Duration::from_secs(30),
            retention: Duration::from_secs(90),
        }
    }
}

/// The single current summary; replaced wholesale each regeneration.
#[derive(Debug, Clone)]
pub struct SummaryDocument {
    pub body: String,
    pub generated_at: DateTime<Local>,
}

struct WindowEntry {
    content: String,
    captured_at: Instant,
}

/// Time-bounded retention of recent transcript snapshots.
pub struct SlidingWindow {
    entries: VecDeque<WindowEntry>,
    retention: Duration,
}

impl SlidingWindow {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
        }
    }

    pub fn push(&mut self, content: String, now: Instant) {
        self.entries.push_back(WindowEntry {
            content,
            captured_at: now,
        });
    }

    /// Drop entries strictly older than the retention; an entry exactly at
    /// the boundary is kept.
    pub fn prune(&mut self, now: Instant) {
        while let Some(front) = self.entries.front() {
            if now.duration_since(front.captured_at) > self.retention {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Concatenate retained snapshots, oldest first.
    pub fn concat(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Polls the transcript directory and keeps the notes file fresh.
pub struct SummaryScheduler {
    config: SummaryConfig,
    transcript_dir: PathBuf,
    summary_path: PathBuf,
    window: SlidingWindow,
    document: SummaryDocument,
    display: SummaryDisplay,
    port: Arc<dyn SummaryPort>,
    last_summary: Instant,
}

impl SummaryScheduler {
    /// Create the notes file (with the waiting notice) and an idle scheduler.
    pub async fn create(
        transcript_dir: PathBuf,
        notes_dir: PathBuf,
        port: Arc<dyn SummaryPort>,
        config: SummaryConfig,
        display: SummaryDisplay,
    ) -> ScribeResult<Self> {
        fs::create_dir_all(&notes_dir).await?;

        let stamp = Local::now().format("%Y%m%d_%H%M");
        let summary_path = notes_dir.join(format!("meeting_notes_{}.md", stamp));
        fs::write(&summary_path, WAITING_NOTICE).await?;

        debug!("summary file: {}", summary_path.display());

        let retention = config.retention;
        Ok(Self {
            config,
            transcript_dir,
            summary_path,
            window: SlidingWindow::new(retention),
            document: SummaryDocument {
                body: WAITING_NOTICE.to_string(),
                generated_at: Local::now(),
            },
            display,
            port,
            last_summary: Instant::now(),
        })
    }

    pub fn document(&self) -> &SummaryDocument {
        &self.document
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// Poll loop; runs until cancelled by the supervisor.
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        loop {
            interval.tick().await;
            if self.last_summary.elapsed() >= self.config.min_gap {
                self.tick(Instant::now()).await;
            }
        }
    }

    /// One regeneration attempt: snapshot, prune, summarize, persist.
    pub async fn tick(&mut self, now: Instant) {
        let content = read_latest_transcript(&self.transcript_dir).await;
        if !content.trim().is_empty() {
            self.window.push(content, now);
        }
        self.window.prune(now);

        let transcript = self.window.concat();
        if transcript.trim().is_empty() {
            debug!("no transcript content yet; skipping summary tick");
            return;
        }

        let request = SummaryRequest {
            prior_notes: self.document.body.clone(),
            transcript,
        };

        match self.port.summarize(&request).await {
            Ok(body) => {
                if let Err(e) = fs::write(&self.summary_path, &body).await {
                    warn!("failed to persist summary: {}", e);
                }
                if self.display.update(&body) {
                    info!("meeting notes refreshed");
                }
                self.document = SummaryDocument {
                    body,
                    generated_at: Local::now(),
                };
                self.last_summary = now;
            }
            Err(e) => {
                warn!("summary generation failed; keeping previous notes: {}", e);
            }
        }
    }
}

/// Full content of the newest transcript file, or empty when none exists.
async fn read_latest_transcript(dir: &Path) -> String {
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return String::new();
    };

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_transcript = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("transcript_") && n.ends_with(".txt"))
            .unwrap_or(false);
        if !is_transcript {
            continue;
        }
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if newest
            .as_ref()
            .map(|(when, _)| modified > *when)
            .unwrap_or(true)
        {
            newest = Some((modified, path));
        }
    }

    match newest {
        Some((_, path)) => fs::read_to_string(&path).await.unwrap_or_default(),
        None => String::new(),
    }
}
