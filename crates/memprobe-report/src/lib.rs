//! Render memory samples for humans and fold them into a run summary.
//!
//! The reporter prints one metric per line in decimal megabytes — the same
//! shape engineers eyeball when hunting a leak by hand — and accumulates
//! first/last/delta per metric so the trend across a whole run can be
//! judged independent of collector noise between any two samples.
//!
//! Sinks compose: wrap a [`Reporter`] in a [`RecordingSink`] when the raw
//! series should also be exported to a sample log after the run.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use anyhow::{Context, Result};
use memprobe_core::{megabytes, MemorySample, SampleSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

/// Prints each sample as it arrives and tracks the endpoints of the series.
///
/// Generic over the output stream so tests can capture the rendered text.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    name: String,
    first: Option<MemorySample>,
    last: Option<MemorySample>,
    count: u64,
}

impl Reporter<io::Stdout> {
    /// Reporter writing to standard output.
    #[must_use]
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    /// Reporter writing to an arbitrary stream.
    #[must_use]
    pub fn new(name: impl Into<String>, out: W) -> Self {
        Self {
            out,
            name: name.into(),
            first: None,
            last: None,
            count: 0,
        }
    }

    /// The most recently reported sample, if any.
    ///
    /// On an aborted run this is the sample to print next to the error so
    /// the failure point can be correlated with the memory trend.
    #[must_use]
    pub const fn last_sample(&self) -> Option<&MemorySample> {
        self.last.as_ref()
    }

    /// Number of samples reported so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Consume the reporter, yielding the run summary.
    ///
    /// `None` when no sample was ever reported (the run failed on the very
    /// first iteration, before the first cadence point).
    #[must_use]
    pub fn finish(self) -> Option<RunSummary> {
        let first = self.first?;
        let last = self.last?;
        Some(RunSummary {
            name: self.name,
            samples: self.count,
            first,
            last,
        })
    }

    fn render(&mut self, s: &MemorySample) -> io::Result<()> {
        writeln!(self.out, "[{}] iteration {}", self.name, s.iteration_index)?;
        writeln!(self.out, "  heap_used  {:.2} MB", megabytes(s.heap_used_bytes))?;
        writeln!(self.out, "  heap_total {:.2} MB", megabytes(s.heap_total_bytes))?;
        writeln!(self.out, "  external   {:.2} MB", megabytes(s.external_bytes))?;
        writeln!(self.out, "  rss        {:.2} MB", megabytes(s.rss_bytes))?;
        writeln!(self.out)
    }
}

impl<W: Write> SampleSink for Reporter<W> {
    fn record(&mut self, sample: &MemorySample) -> Result<()> {
        self.render(sample).context("write sample report")?;

        if self.first.is_none() {
            self.first = Some(*sample);
        }
        self.last = Some(*sample);
        self.count += 1;
        Ok(())
    }
}

/// Endpoints of one run's sample series.
///
/// `delta_*` values are signed: a healthy probe hovers near zero once the
/// collector keeps up, while a leak trends positive across the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Diagnostic run label.
    pub name: String,
    /// Number of samples in the series.
    pub samples: u64,
    /// First sample of the run.
    pub first: MemorySample,
    /// Last sample of the run.
    pub last: MemorySample,
}

impl RunSummary {
    /// Signed change in live tracked heap bytes across the run.
    #[must_use]
    pub fn delta_heap_used(&self) -> i128 {
        i128::from(self.last.heap_used_bytes) - i128::from(self.first.heap_used_bytes)
    }

    /// Signed change in native/off-heap bytes across the run.
    #[must_use]
    pub fn delta_external(&self) -> i128 {
        i128::from(self.last.external_bytes) - i128::from(self.first.external_bytes)
    }

    /// Signed change in resident set size across the run.
    #[must_use]
    pub fn delta_rss(&self) -> i128 {
        i128::from(self.last.rss_bytes) - i128::from(self.first.rss_bytes)
    }
}

#[allow(clippy::cast_precision_loss)] // display-only conversion
fn signed_mb(delta: i128) -> f64 {
    delta as f64 / memprobe_core::BYTES_PER_MB
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "probe '{}': {} samples over iterations {}..={}",
            self.name, self.samples, self.first.iteration_index, self.last.iteration_index
        )?;
        writeln!(
            f,
            "  heap_used  first {:.2} MB, last {:.2} MB, delta {:+.2} MB",
            megabytes(self.first.heap_used_bytes),
            megabytes(self.last.heap_used_bytes),
            signed_mb(self.delta_heap_used())
        )?;
        writeln!(
            f,
            "  external   first {:.2} MB, last {:.2} MB, delta {:+.2} MB",
            megabytes(self.first.external_bytes),
            megabytes(self.last.external_bytes),
            signed_mb(self.delta_external())
        )?;
        write!(
            f,
            "  rss        first {:.2} MB, last {:.2} MB, delta {:+.2} MB",
            megabytes(self.first.rss_bytes),
            megabytes(self.last.rss_bytes),
            signed_mb(self.delta_rss())
        )
    }
}

/// Forwards samples to an inner sink while keeping a copy of the series.
#[derive(Debug)]
pub struct RecordingSink<S> {
    inner: S,
    samples: Vec<MemorySample>,
}

impl<S: SampleSink> RecordingSink<S> {
    /// Wrap a sink, recording everything that passes through.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            samples: Vec::new(),
        }
    }

    /// Recorded series so far, in capture order.
    #[must_use]
    pub fn samples(&self) -> &[MemorySample] {
        &self.samples
    }

    /// Unwrap into the inner sink and the recorded series.
    #[must_use]
    pub fn into_parts(self) -> (S, Vec<MemorySample>) {
        (self.inner, self.samples)
    }
}

impl<S: SampleSink> SampleSink for RecordingSink<S> {
    fn record(&mut self, sample: &MemorySample) -> Result<()> {
        self.inner.record(sample)?;
        self.samples.push(*sample);
        Ok(())
    }
}

/// A sink that only collects. Useful for tests and quiet bench runs.
#[derive(Debug, Default)]
pub struct CollectSink {
    samples: Vec<MemorySample>,
}

impl CollectSink {
    /// Empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Collected series, in capture order.
    #[must_use]
    pub fn samples(&self) -> &[MemorySample] {
        &self.samples
    }

    /// Unwrap into the collected series.
    #[must_use]
    pub fn into_samples(self) -> Vec<MemorySample> {
        self.samples
    }
}

impl SampleSink for CollectSink {
    fn record(&mut self, sample: &MemorySample) -> Result<()> {
        self.samples.push(*sample);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(idx: u64, heap: u64, rss: u64) -> MemorySample {
        MemorySample::new(heap, heap, 0, rss, idx)
    }

    #[test]
    fn renders_one_metric_per_line() {
        let mut reporter = Reporter::new("Basic", Vec::new());
        reporter.record(&sample(0, 1_500_000, 40_000_000)).unwrap();

        let text = String::from_utf8(reporter.out).unwrap();
        assert!(text.contains("[Basic] iteration 0"));
        assert!(text.contains("heap_used  1.50 MB"));
        assert!(text.contains("rss        40.00 MB"));
    }

    #[test]
    fn summary_tracks_endpoints_and_delta() {
        let mut reporter = Reporter::new("Tensor", Vec::new());
        reporter.record(&sample(0, 400_000, 40_000_000)).unwrap();
        reporter.record(&sample(10_000, 800_000, 41_000_000)).unwrap();
        reporter.record(&sample(20_000, 1_200_000, 43_000_000)).unwrap();

        let summary = reporter.finish().unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.first.iteration_index, 0);
        assert_eq!(summary.last.iteration_index, 20_000);
        assert_eq!(summary.delta_heap_used(), 800_000);
        assert_eq!(summary.delta_rss(), 3_000_000);

        let rendered = summary.to_string();
        assert!(rendered.contains("3 samples"));
        assert!(rendered.contains("delta +0.80 MB"));
    }

    #[test]
    fn finish_is_none_without_samples() {
        let reporter = Reporter::new("empty", Vec::new());
        assert!(reporter.finish().is_none());
    }

    #[test]
    fn recording_sink_forwards_and_captures() {
        let mut sink = RecordingSink::new(CollectSink::new());
        sink.record(&sample(0, 1, 1)).unwrap();
        sink.record(&sample(10, 2, 2)).unwrap();

        assert_eq!(sink.samples().len(), 2);
        let (inner, recorded) = sink.into_parts();
        assert_eq!(inner.samples(), recorded.as_slice());
    }

    #[test]
    fn summary_serde_roundtrip() {
        let summary = RunSummary {
            name: "Model".to_owned(),
            samples: 2,
            first: sample(0, 100, 1_000),
            last: sample(10, 200, 2_000),
        };
        let ser = serde_json::to_string(&summary).unwrap();
        let de: RunSummary = serde_json::from_str(&ser).unwrap();
        assert_eq!(de, summary);
    }
}
