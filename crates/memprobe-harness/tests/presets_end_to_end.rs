//! Drive the real presets through the drive loop.
//!
//! Assertions stay order-insensitive where the global gauges are involved:
//! other tests in this binary (and the background sweeper) touch the same
//! counters, so we check cadence exactly but memory only monotonically.

use memprobe_core::ProbeSpec;
use memprobe_harness::ProbeHarness;
use memprobe_probes::{BasicFactory, ModelFactory, ModelSource, Reclaimer, TensorFactory};
use memprobe_report::CollectSink;

#[test]
fn tensor_preset_emits_full_cadence() {
    let spec = ProbeSpec::new("tensor-e2e", 100, 10);
    let mut factory = TensorFactory::f32_default();
    let mut sink = CollectSink::new();

    ProbeHarness::new()
        .run(&spec, &mut factory, &mut sink)
        .unwrap();

    let samples = sink.samples();
    assert_eq!(samples.len(), 10);
    // A 400 kB buffer existed at some point, so the high-water mark must
    // have seen at least that much.
    assert!(samples.iter().all(|s| s.heap_total_bytes >= 400_000));

    let _ = Reclaimer::global().drain_now();
}

#[test]
fn basic_preset_runs_cooperatively() {
    let spec = ProbeSpec::new("basic-e2e", 500, 100);
    let mut sink = CollectSink::new();

    ProbeHarness::cooperative()
        .run(&spec, &mut BasicFactory, &mut sink)
        .unwrap();

    assert_eq!(sink.samples().len(), 5);
}

#[test]
fn model_preset_survives_repeated_parsing() {
    let source = ModelSource::generate(8, 7);
    let spec = ProbeSpec::new("model-e2e", 50, 25);
    let mut factory = ModelFactory::new(source);
    let mut sink = CollectSink::new();

    ProbeHarness::new()
        .run(&spec, &mut factory, &mut sink)
        .unwrap();

    let indices: Vec<u64> = sink.samples().iter().map(|s| s.iteration_index).collect();
    assert_eq!(indices, vec![0, 25]);

    let _ = Reclaimer::global().drain_now();
}
