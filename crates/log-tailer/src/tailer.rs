//! Rotation-aware tailing of one log file into the outbox.
//!
//! The tailer is a small state machine driven by [`Tailer::poll_once`]:
//!
//! ```text
//! WaitingForFile ──file appears──▶ Opened ──read──▶ Reading
//!       ▲                            ▲                │
//!       └──────── file vanished ─────┼────────────────┤
//!                                    └─ identity changed (rotation)
//! ```
//!
//! Reads are poll-with-sleep so rotation is noticed between polls. Every
//! complete line that passes the filter is classified, appended to the
//! outbox together with the advanced cursor, and followed by a best-effort
//! flush.

use crate::classifier::{classify, MAX_MESSAGE_CHARS};
use crate::filter::LineFilter;
use crate::identity::file_identity;
use crate::{TailerError, TailerResult};
use log_outbox::FlushCoordinator;
use outbox_database::{AppendOutcome, FileIdentity, OutboxStore, TailCursor};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, error, info, warn};

/// Default sleep between polls when there is nothing to read.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on bytes read per poll.
const READ_CHUNK_BYTES: u64 = 64 * 1024;

/// Longest line kept in memory while waiting for its newline. Anything
/// past this is emitted truncated and the rest of the line is skipped.
pub const MAX_LINE_BYTES: usize = MAX_MESSAGE_CHARS * 4;

/// Where to start reading a newly opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Replay the whole file.
    Beginning,
    /// Only lines written after opening.
    #[default]
    End,
}

/// Tailer settings.
#[derive(Debug, Clone)]
pub struct TailerConfig {
    pub path: PathBuf,
    pub start: StartPosition,
    pub poll_interval: Duration,
    pub filter: LineFilter,
}

impl TailerConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start: StartPosition::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            filter: LineFilter::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPhase {
    WaitingForFile,
    Opened,
    Reading,
}

/// Counts for one batch of complete lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub lines: usize,
    pub appended: usize,
    pub duplicates: usize,
    /// Blank lines and lines rejected by the filter.
    pub skipped: usize,
}

/// What one [`Tailer::poll_once`] step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The file is still absent.
    Waiting,
    /// The file was opened and positioned at `offset`.
    Opened { offset: u64, resumed: bool },
    /// The path now names a different file, which was opened instead.
    Rotated { offset: u64 },
    /// The file shrank below the read position; reading restarts at 0.
    Truncated,
    /// The file went away while open.
    Vanished,
    /// New bytes were read; complete lines were processed.
    Lines(LineStats),
    /// No new bytes.
    Idle,
}

impl PollOutcome {
    /// Whether the caller should sleep before polling again.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Waiting | Self::Idle)
    }
}

struct OpenFile {
    file: File,
    identity: FileIdentity,
}

/// Follows one path and feeds the outbox.
///
/// Owns the ingestion context's store and remote handles through its
/// [`FlushCoordinator`].
pub struct Tailer {
    config: TailerConfig,
    cursor_key: String,
    coordinator: FlushCoordinator,
    phase: TailPhase,
    open: Option<OpenFile>,
    /// Bytes of complete lines consumed from the current file.
    offset: u64,
    partial: Vec<u8>,
    /// Skipping the tail of an overlong line up to its newline.
    discarding: bool,
    first_open: bool,
    cursor_dirty: bool,
}

impl Tailer {
    pub fn new(config: TailerConfig, coordinator: FlushCoordinator) -> Self {
        let cursor_key = config.path.to_string_lossy().to_string();
        Self {
            config,
            cursor_key,
            coordinator,
            phase: TailPhase::WaitingForFile,
            open: None,
            offset: 0,
            partial: Vec::new(),
            discarding: false,
            first_open: true,
            cursor_dirty: false,
        }
    }

    pub fn phase(&self) -> TailPhase {
        self.phase
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn store(&self) -> &OutboxStore {
        self.coordinator.store()
    }

    /// Run forever.
    ///
    /// I/O errors are logged and retried after the poll interval. Only an
    /// outbox append failure ends the loop, since dropping lines silently
    /// is worse than stopping.
    pub async fn run(mut self) -> TailerResult<()> {
        info!(
            path = %self.config.path.display(),
            start = ?self.config.start,
            filter = self.config.filter.pattern().unwrap_or("<all lines>"),
            "Starting tailer"
        );

        loop {
            match self.poll_once().await {
                Ok(outcome) if outcome.is_idle() => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Ok(_) => {}
                Err(TailerError::Io(e)) => {
                    warn!(path = %self.config.path.display(), error = %e, "Tailer I/O error, retrying");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Err(e) => {
                    error!(error = %e, "Tailer stopped");
                    return Err(e);
                }
            }
        }
    }

    /// Advance the state machine by one step.
    pub async fn poll_once(&mut self) -> TailerResult<PollOutcome> {
        match self.phase {
            TailPhase::WaitingForFile => self.try_open().await,
            TailPhase::Opened | TailPhase::Reading => self.read_cycle().await,
        }
    }

    async fn try_open(&mut self) -> TailerResult<PollOutcome> {
        let file = match File::open(&self.config.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PollOutcome::Waiting),
            Err(e) => return Err(e.into()),
        };

        let allow_resume = self.first_open;
        let (offset, resumed) = self.attach(file, allow_resume).await?;
        self.first_open = false;
        Ok(PollOutcome::Opened { offset, resumed })
    }

    /// Position a freshly opened file and make it current.
    async fn attach(&mut self, mut file: File, allow_resume: bool) -> TailerResult<(u64, bool)> {
        let meta = file.metadata().await?;
        let identity = file_identity(&meta);
        let len = meta.len();

        let saved = if allow_resume {
            self.store().load_cursor(&self.cursor_key).await?
        } else {
            None
        };

        let (offset, resumed) = match saved {
            Some(cursor) if cursor.identity == identity && cursor.offset <= len => {
                (cursor.offset, true)
            }
            _ => match self.config.start {
                StartPosition::Beginning => (0, false),
                StartPosition::End => (len, false),
            },
        };

        file.seek(SeekFrom::Start(offset)).await?;

        self.open = Some(OpenFile { file, identity });
        self.offset = offset;
        self.partial.clear();
        self.discarding = false;
        self.phase = TailPhase::Opened;
        self.cursor_dirty = !resumed;

        info!(
            path = %self.config.path.display(),
            device = identity.device,
            inode = identity.inode,
            offset,
            resumed,
            "Opened log file"
        );
        Ok((offset, resumed))
    }

    fn detach(&mut self) {
        self.open = None;
        self.partial.clear();
        self.discarding = false;
        self.offset = 0;
        self.phase = TailPhase::WaitingForFile;
    }

    async fn read_cycle(&mut self) -> TailerResult<PollOutcome> {
        self.phase = TailPhase::Reading;

        let meta = match tokio::fs::metadata(&self.config.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.config.path.display(), "Log file disappeared, waiting");
                self.detach();
                return Ok(PollOutcome::Vanished);
            }
            Err(e) => return Err(e.into()),
        };

        let current = file_identity(&meta);
        if self.open.as_ref().map(|o| o.identity) != Some(current) {
            info!(path = %self.config.path.display(), "Log file rotated, reopening");
            let file = match File::open(&self.config.path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    self.detach();
                    return Ok(PollOutcome::Vanished);
                }
                Err(e) => return Err(e.into()),
            };
            let (offset, _) = self.attach(file, false).await?;
            return Ok(PollOutcome::Rotated { offset });
        }

        let read_pos = self.offset + self.partial.len() as u64;
        if meta.len() < read_pos {
            info!(
                path = %self.config.path.display(),
                len = meta.len(),
                offset = read_pos,
                "Log file truncated, reading from start"
            );
            if let Some(open) = self.open.as_mut() {
                open.file.seek(SeekFrom::Start(0)).await?;
            }
            self.offset = 0;
            self.partial.clear();
            self.discarding = false;
            self.cursor_dirty = true;
            return Ok(PollOutcome::Truncated);
        }

        let Some(open) = self.open.as_mut() else {
            self.detach();
            return Ok(PollOutcome::Vanished);
        };

        let mut buf = Vec::new();
        let n = (&mut open.file)
            .take(READ_CHUNK_BYTES)
            .read_to_end(&mut buf)
            .await?;

        if n == 0 {
            self.persist_idle_cursor().await?;
            return Ok(PollOutcome::Idle);
        }

        self.partial.extend_from_slice(&buf);
        let stats = self.drain_lines().await?;
        Ok(PollOutcome::Lines(stats))
    }

    fn cursor(&self) -> Option<TailCursor> {
        self.open.as_ref().map(|open| TailCursor {
            path: self.cursor_key.clone(),
            identity: open.identity,
            offset: self.offset,
        })
    }

    /// Record progress made over lines that produced no event.
    async fn persist_idle_cursor(&mut self) -> TailerResult<()> {
        if !self.cursor_dirty {
            return Ok(());
        }
        if let Some(cursor) = self.cursor() {
            self.store().save_cursor(cursor).await?;
        }
        self.cursor_dirty = false;
        Ok(())
    }

    async fn drain_lines(&mut self) -> TailerResult<LineStats> {
        let mut stats = LineStats::default();

        while let Some(raw) = self.next_line() {
            self.offset += raw.len() as u64;
            stats.lines += 1;

            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(['\n', '\r']);

            if !self.config.filter.matches(line) {
                stats.skipped += 1;
                self.cursor_dirty = true;
                continue;
            }
            let Some(event) = classify(line) else {
                stats.skipped += 1;
                self.cursor_dirty = true;
                continue;
            };

            let event_id = event.event_id.clone();
            let severity = event.severity;
            let outcome = match self.cursor() {
                Some(cursor) => self.store().append_with_cursor(event, cursor).await?,
                None => self.store().append(event).await?,
            };

            match outcome {
                AppendOutcome::Inserted => {
                    stats.appended += 1;
                    self.cursor_dirty = false;
                    info!(event_id = %event_id, severity = %severity, "Persisted log event");
                    self.flush_best_effort().await;
                }
                AppendOutcome::AlreadyExists => {
                    stats.duplicates += 1;
                    self.cursor_dirty = true;
                    info!(event_id = %event_id, "Event already in outbox, skipped");
                }
            }
        }

        Ok(stats)
    }

    /// Next complete line from the buffer, or the first [`MAX_LINE_BYTES`]
    /// of a line that has grown past the limit without a newline.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        if self.discarding {
            let newline = self.partial.iter().position(|b| *b == b'\n');
            let skipped = newline.map_or(self.partial.len(), |pos| pos + 1);
            self.partial.drain(..skipped);
            self.offset += skipped as u64;
            self.cursor_dirty = true;
            if newline.is_none() {
                return None;
            }
            self.discarding = false;
        }

        if let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            return Some(self.partial.drain(..=pos).collect());
        }

        if self.partial.len() >= MAX_LINE_BYTES {
            warn!(
                path = %self.config.path.display(),
                limit = MAX_LINE_BYTES,
                "Line too long, truncating"
            );
            self.discarding = true;
            return Some(self.partial.drain(..MAX_LINE_BYTES).collect());
        }

        None
    }

    /// Latency optimisation only; the retry scheduler guarantees delivery.
    async fn flush_best_effort(&self) {
        match self.coordinator.flush().await {
            Ok(report) => {
                debug!(delivered = report.delivered, "Immediate flush done");
            }
            Err(e) => {
                debug!(error = %e, "Immediate flush failed, leaving events for retry");
            }
        }
    }
}

impl std::fmt::Debug for Tailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tailer")
            .field("path", &self.config.path)
            .field("phase", &self.phase)
            .field("offset", &self.offset)
            .field("buffered", &self.partial.len())
            .finish_non_exhaustive()
    }
}
