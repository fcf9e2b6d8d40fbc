//! JSON Lines (NDJSON) helpers for streaming `MemorySample` I/O.
//!
//! These functions provide memory-efficient line-by-line reading/writing —
//! a sample log from a long probe run can be large, and loading it should
//! not distort the very counters being studied. Each line is a single JSON
//! object.
//!
//! - **Reader**: returns an iterator that *owns* its underlying reader,
//!   yielding `Result<MemorySample>` so callers can surface per-line errors.
//! - **Writer**: uses `serde_json::to_writer` to avoid intermediate allocations.
//!
//! # Formats
//! We treat both `.jsonl` and `.ndjson` as equivalent line-delimited JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::types::MemorySample;

/// Owning JSONL iterator over `MemorySample`.
///
/// Holds the file and buffered reader internally to avoid lifetime pitfalls
/// of returning a borrowed `Lines<'_>` iterator.
pub struct JsonlSampleIter {
    rdr: BufReader<File>,
    buf: String,
    line_no: usize,
}

impl JsonlSampleIter {
    fn new(file: File) -> Self {
        Self {
            rdr: BufReader::new(file),
            buf: String::with_capacity(256),
            line_no: 0,
        }
    }
}

impl Iterator for JsonlSampleIter {
    type Item = Result<MemorySample>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.rdr.read_line(&mut self.buf) {
            Ok(0) => None, // EOF
            Ok(_) => {
                self.line_no += 1;
                // Trim a single trailing '\n' or '\r\n'
                if self.buf.ends_with('\n') {
                    self.buf.pop();
                    if self.buf.ends_with('\r') {
                        self.buf.pop();
                    }
                }
                if self.buf.is_empty() {
                    // Allow blank lines but surface them clearly as parse errors.
                    return Some(Err(anyhow::anyhow!(
                        "parse jsonl line {}: empty line",
                        self.line_no
                    )));
                }
                let parsed: Result<MemorySample> = serde_json::from_str(&self.buf)
                    .with_context(|| format!("parse jsonl line {}", self.line_no));
                Some(parsed)
            }
            Err(e) => Some(Err(e).with_context(|| format!("read line {}", self.line_no + 1))),
        }
    }
}

/// Stream read: one JSON object per line → yields `MemorySample` items.
///
/// Each line is parsed independently; the iterator yields `Err` with a line
/// number if parsing fails.
///
/// # Errors
/// Opening the file may fail. Individual iteration items may be `Err` if a
/// particular line is malformed.
pub fn stream_samples_jsonl<P: AsRef<Path>>(path: P) -> Result<JsonlSampleIter> {
    let f = File::open(path.as_ref())
        .with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(JsonlSampleIter::new(f))
}

/// Write samples as JSON Lines (one object per line).
///
/// Uses `serde_json::to_writer` directly to avoid temporary `String`s.
pub fn write_samples_jsonl<P: AsRef<Path>>(path: P, samples: &[MemorySample]) -> Result<()> {
    let f = File::create(path.as_ref())
        .with_context(|| format!("create {}", path.as_ref().display()))?;
    let mut w = BufWriter::new(f);
    for s in samples {
        serde_json::to_writer(&mut w, s).context("serialize sample to json")?;
        w.write_all(b"\n").context("write newline")?;
    }
    w.flush().context("flush writer")?;
    Ok(())
}

/// Generic JSONL writer (handy if you want to dump other streams later).
pub fn write_jsonl<P: AsRef<Path>, T: Serialize>(path: P, items: &[T]) -> Result<()> {
    let f = File::create(path.as_ref())
        .with_context(|| format!("create {}", path.as_ref().display()))?;
    let mut w = BufWriter::new(f);
    for it in items {
        serde_json::to_writer(&mut w, it).context("serialize jsonl item")?;
        w.write_all(b"\n").context("write newline")?;
    }
    w.flush().context("flush writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("memprobe_core_jsonl_{name}_{nanos}.jsonl"));
        p
    }

    #[test]
    fn jsonl_iterator_streams_in_order() {
        let path = tmp_path("order");
        let samples = vec![
            MemorySample::new(1, 1, 0, 100, 0),
            MemorySample::new(2, 2, 0, 101, 10),
            MemorySample::new(3, 3, 0, 102, 20),
        ];
        write_samples_jsonl(&path, &samples).unwrap();

        let got: Vec<MemorySample> = stream_samples_jsonl(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(got, samples);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let path = tmp_path("malformed");
        std::fs::write(&path, "{\"not\": \"a sample\"}\n").unwrap();

        let mut it = stream_samples_jsonl(&path).unwrap();
        let err = it.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 1"));
        let _ = std::fs::remove_file(path);
    }
}
