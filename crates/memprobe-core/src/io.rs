//! Serialization helpers for sample logs.
//!
//! JSON and CBOR read/write utilities with extension-based auto-detection.
//! Unknown/missing extensions are rejected for reads and default to JSON
//! for writes.
//!
//! Extras:
//! - Streaming helper: [`stream_samples_auto`] returning a boxed iterator
//!   so callers can uniformly consume JSONL/NDJSON (true streaming) or
//!   JSON/CBOR (load-then-iterate) without caring about concrete iterator
//!   types.

use crate::types::MemorySample;
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Ensure the parent directory for a file exists (no-op if none).
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", display(dir)))?;
        }
    }
    Ok(())
}

/// Read `Vec<MemorySample>` from **JSON**.
pub fn read_samples_json<P: AsRef<Path>>(path: P) -> Result<Vec<MemorySample>> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let rdr = BufReader::new(f);
    let v: Vec<MemorySample> =
        serde_json::from_reader(rdr).with_context(|| "deserialize JSON sample log")?;
    Ok(v)
}

/// Write `Vec<MemorySample>` to **JSON** (pretty).
pub fn write_samples_json<P: AsRef<Path>>(path: P, v: &[MemorySample]) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let w = BufWriter::new(f);
    serde_json::to_writer_pretty(w, v).with_context(|| "serialize JSON sample log")?;
    Ok(())
}

/// Read `Vec<MemorySample>` from **CBOR**.
pub fn read_samples_cbor<P: AsRef<Path>>(path: P) -> Result<Vec<MemorySample>> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let mut rdr = BufReader::new(f);
    let v: Vec<MemorySample> =
        ciborium::de::from_reader(&mut rdr).with_context(|| "deserialize CBOR sample log")?;
    Ok(v)
}

/// Write `Vec<MemorySample>` to **CBOR**.
pub fn write_samples_cbor<P: AsRef<Path>>(path: P, v: &[MemorySample]) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(v, &mut w).with_context(|| "serialize CBOR sample log")?;
    Ok(())
}

/// Auto-detect read by extension `.json` / `.cbor` / `.jsonl` / `.ndjson`
/// (case-insensitive). JSONL inputs are collected into a vector.
pub fn read_samples_auto<P: AsRef<Path>>(path: P) -> Result<Vec<MemorySample>> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => read_samples_json(path),
        Some("cbor") => read_samples_cbor(path),
        Some("jsonl" | "ndjson") => crate::io_jsonl::stream_samples_jsonl(path)?.collect(),
        Some(other) => Err(anyhow!(
            "unsupported sample-log extension: {} (supported: .json, .cbor, .jsonl, .ndjson)",
            other
        )),
        None => Err(anyhow!(
            "path has no extension (expected .json, .cbor, .jsonl, or .ndjson)"
        )),
    }
}

/// Auto-detect write (defaults to **JSON** if unknown or missing).
pub fn write_samples_auto<P: AsRef<Path>>(path: P, v: &[MemorySample]) -> Result<()> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("cbor") => write_samples_cbor(path, v),
        Some("jsonl" | "ndjson") => crate::io_jsonl::write_samples_jsonl(path, v),
        _ => write_samples_json(path, v),
    }
}

/// Return a boxed iterator over samples for the given path.
///
/// - **`.jsonl` / `.ndjson`**: true streaming (no materialization).
/// - **`.json` / `.cbor`**: load the vector, then iterate (compat fallback).
#[must_use = "iterating the samples is the point"]
pub fn stream_samples_auto<P: AsRef<Path>>(
    path: P,
) -> Result<Box<dyn Iterator<Item = Result<MemorySample>> + Send>> {
    // Own the path so the iterator type doesn't capture `P`.
    let pb = path.as_ref().to_owned();

    match ext_lower(&pb).as_deref() {
        Some("jsonl" | "ndjson") => {
            let it = crate::io_jsonl::stream_samples_jsonl(pb)?;
            Ok(Box::new(it))
        }
        Some("json") => {
            let v = read_samples_json(&pb)?;
            Ok(Box::new(v.into_iter().map(Ok)))
        }
        Some("cbor") => {
            let v = read_samples_cbor(&pb)?;
            Ok(Box::new(v.into_iter().map(Ok)))
        }
        Some(other) => Err(anyhow!(
            "unsupported sample-log extension: {} (supported: .json, .cbor, .jsonl, .ndjson)",
            other
        )),
        None => Err(anyhow!(
            "path has no extension (expected .json, .cbor, .jsonl, or .ndjson)"
        )),
    }
}

/// Return the lowercase extension (without dot) if present.
fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Human-friendly path display for error messages.
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(name: &str, ext: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("memprobe_core_io_{}_{}.{}", name, nanos, ext));
        p
    }

    fn fixture() -> Vec<MemorySample> {
        vec![
            MemorySample::new(1_000_000, 1_000_000, 0, 40_000_000, 0),
            MemorySample::new(1_400_000, 1_400_000, 0, 41_000_000, 10_000),
        ]
    }

    #[test]
    fn samples_json_roundtrip() {
        let path = tmp_path("samples", "json");
        let samples = fixture();
        write_samples_auto(&path, &samples).unwrap();
        let got = read_samples_auto(&path).unwrap();
        assert_eq!(got, samples);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn samples_cbor_roundtrip() {
        let path = tmp_path("samples", "cbor");
        let samples = fixture();
        write_samples_auto(&path, &samples).unwrap();
        let got = read_samples_auto(&path).unwrap();
        assert_eq!(got, samples);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn samples_jsonl_roundtrip_via_auto() {
        let path = tmp_path("samples", "jsonl");
        let samples = fixture();
        write_samples_auto(&path, &samples).unwrap();
        let got: Vec<MemorySample> = stream_samples_auto(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(got, samples);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unknown_extension_is_rejected_for_reads() {
        let err = read_samples_auto("samples.csv").unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
