use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Converted,
    Skipped,
    Failed,
}

/// Terminal result of one post's trip through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub slug: String,
    pub title: String,
    pub output_path: Option<PathBuf>,
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostErrorKind {
    Parse,
    Write,
    Fatal,
}

impl fmt::Display for PostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostErrorKind::Parse => write!(f, "parse"),
            PostErrorKind::Write => write!(f, "write"),
            PostErrorKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// A classified per-post failure. Caught at the post boundary; never
/// propagates past the orchestrator loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostError {
    pub kind: PostErrorKind,
    pub message: String,
}

impl PostError {
    pub(crate) fn new(kind: PostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for PostError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFailure {
    pub slug: String,
    pub message: String,
}

/// Aggregate result of a full run, finalized after the last post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<PostFailure>,
    pub elapsed: Duration,
}

/// Observable pipeline events. For a run over posts 1..=N, every event of
/// post `i` (including its asset events) is emitted before any event of
/// post `i + 1`; `PostCompleted` fires exactly once per post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertEvent {
    PostStarted {
        slug: String,
        index: usize,
        total: usize,
    },
    /// One per distinguishable asset outcome within a post.
    AssetProcessed {
        slug: String,
        filename: String,
        success: bool,
        permanent: bool,
        error: Option<String>,
    },
    PostCompleted {
        outcome: ConversionOutcome,
        index: usize,
        total: usize,
        elapsed: Duration,
    },
    Error {
        kind: PostErrorKind,
        slug: Option<String>,
        message: String,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ConvertEvent);
}

/// Sink that drops every event; the pipeline must work unobserved.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: ConvertEvent) {}
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<ConvertEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<ConvertEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ConvertEvent) {
        let _ = self.tx.send(event);
    }
}
