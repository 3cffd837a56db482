//! Episode score sinks.
//!
//! The worker reports each finished episode through a [`ScoreSink`]. Two
//! shapes are supported: a structured summary writer that stamps every value
//! with a tag and the global step ([`SummarySink`]), and a raw scalar feed
//! that only receives the value ([`ScalarFeed`]).

/// Receives one normalized score per finished episode.
pub trait ScoreSink {
    /// Records `score` for the episode that ended while the shared counter was `global_step`.
    fn record_episode_score(&mut self, score: f64, global_step: u64);
}

/// Structured, step-indexed scalar log (e.g. an event-file writer).
pub trait SummaryWriter {
    /// Appends a tagged scalar at `step`.
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64);

    /// Persists buffered values.
    fn flush(&mut self) {}
}

/// Tag under which episode scores are written.
pub const SCORE_TAG: &str = "score";

/// Adapts a [`SummaryWriter`] into a [`ScoreSink`], flushing after every score.
#[derive(Debug, Default)]
pub struct SummarySink<W> {
    writer: W,
}

impl<W: SummaryWriter> SummarySink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns a reference to the underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: SummaryWriter> ScoreSink for SummarySink<W> {
    fn record_episode_score(&mut self, score: f64, global_step: u64) {
        self.writer.add_scalar(SCORE_TAG, score, global_step);
        self.writer.flush();
    }
}

/// Adapts a closure receiving bare scores into a [`ScoreSink`].
///
/// The global step is dropped; feeds of this shape track their own position.
pub struct ScalarFeed<F> {
    feed: F,
}

impl<F: FnMut(f64)> ScalarFeed<F> {
    /// Wraps `feed`.
    pub fn new(feed: F) -> Self {
        Self { feed }
    }
}

impl<F: FnMut(f64)> ScoreSink for ScalarFeed<F> {
    fn record_episode_score(&mut self, score: f64, _global_step: u64) {
        (self.feed)(score)
    }
}

/// A single tagged scalar held by [`MemorySummaryWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarEntry {
    pub tag: String,
    pub value: f64,
    pub step: u64,
}

/// In-memory [`SummaryWriter`].
#[derive(Debug, Default, Clone)]
pub struct MemorySummaryWriter {
    /// Flushed entries.
    pub entries: Vec<ScalarEntry>,
    pending: Vec<ScalarEntry>,
    /// Number of flush calls.
    pub flushes: usize,
}

impl MemorySummaryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushed values recorded under `tag`, in order.
    pub fn values(&self, tag: &str) -> Vec<f64> {
        self.entries
            .iter()
            .filter(|e| e.tag == tag)
            .map(|e| e.value)
            .collect()
    }
}

impl SummaryWriter for MemorySummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64) {
        self.pending.push(ScalarEntry {
            tag: tag.to_string(),
            value,
            step,
        });
    }

    fn flush(&mut self) {
        self.entries.append(&mut self.pending);
        self.flushes += 1;
    }
}

/// Sink that discards every score.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ScoreSink for NullSink {
    fn record_episode_score(&mut self, _score: f64, _global_step: u64) {}
}
