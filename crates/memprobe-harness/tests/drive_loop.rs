//! Invariants for the drive loop.
//!
//! These tests treat:
//! - the **cadence** as authoritative: the emitted series must hit exactly
//!   the indices divisible by the interval, in order, and
//! - the **fail-fast contract** as non-negotiable: nothing runs after a
//!   factory failure, and the failing index is reported.

use memprobe_core::{AllocError, ProbeError, ProbeSpec, RunMode};
use memprobe_harness::{NoYield, ProbeHarness, Yielder};
use memprobe_report::CollectSink;
use proptest::prelude::*;

/// A factory counting its invocations, failing (once) at `fail_at`.
fn counting_factory(
    fail_at: Option<u64>,
) -> (std::rc::Rc<std::cell::Cell<u64>>, impl FnMut() -> Result<Vec<u8>, AllocError>) {
    let calls = std::rc::Rc::new(std::cell::Cell::new(0u64));
    let seen = std::rc::Rc::clone(&calls);
    let factory = move || {
        let n = seen.get();
        seen.set(n + 1);
        if Some(n) == fail_at {
            return Err(AllocError::new("injected allocator failure"));
        }
        Ok(vec![0u8; 256])
    };
    (calls, factory)
}

/// Mock scheduler: counts turn boundaries.
#[derive(Debug, Default)]
struct CountingYield {
    turns: u64,
}

impl Yielder for CountingYield {
    fn pause(&mut self) {
        self.turns += 1;
    }
}

#[test]
fn hundred_iterations_interval_ten_samples_at_expected_indices() {
    let spec = ProbeSpec::new("cadence", 100, 10);
    let (calls, mut factory) = counting_factory(None);
    let mut sink = CollectSink::new();

    ProbeHarness::new()
        .run(&spec, &mut factory, &mut sink)
        .unwrap();

    assert_eq!(calls.get(), 100);
    let indices: Vec<u64> = sink.samples().iter().map(|s| s.iteration_index).collect();
    assert_eq!(indices, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90]);
}

#[test]
fn zero_iterations_rejected_before_any_invocation() {
    let spec = ProbeSpec::new("empty", 0, 10);
    let (calls, mut factory) = counting_factory(None);
    let mut sink = CollectSink::new();

    let err = ProbeHarness::new()
        .run(&spec, &mut factory, &mut sink)
        .unwrap_err();

    assert!(matches!(err, ProbeError::InvalidSpec(_)));
    assert_eq!(calls.get(), 0);
    assert!(sink.samples().is_empty());
}

#[test]
fn failure_on_fifth_call_aborts_remaining_iterations() {
    let spec = ProbeSpec::new("failing", 100, 10);
    // Fifth call = iteration index 4.
    let (calls, mut factory) = counting_factory(Some(4));
    let mut sink = CollectSink::new();

    let err = ProbeHarness::new()
        .run(&spec, &mut factory, &mut sink)
        .unwrap_err();

    match err {
        ProbeError::Allocation { iteration, source } => {
            assert_eq!(iteration, 4);
            assert!(source.reason().contains("injected"));
        }
        other => panic!("expected Allocation, got {other:?}"),
    }
    // Iterations 5..100 never ran; only the index-0 sample was captured.
    assert_eq!(calls.get(), 5);
    let indices: Vec<u64> = sink.samples().iter().map(|s| s.iteration_index).collect();
    assert_eq!(indices, vec![0]);
}

#[test]
fn cooperative_mode_yields_once_per_invocation() {
    let spec = ProbeSpec::new("yields", 37, 5).with_mode(RunMode::Cooperative);
    let (_, mut factory) = counting_factory(None);
    let mut sink = CollectSink::new();

    let mut harness = ProbeHarness::with_yielder(CountingYield::default());
    harness.run(&spec, &mut factory, &mut sink).unwrap();

    assert_eq!(harness.yielder().turns, 37);
}

#[test]
fn sink_failure_surfaces_with_iteration_index() {
    struct FailingSink {
        records: u64,
    }
    impl memprobe_core::SampleSink for FailingSink {
        fn record(&mut self, _: &memprobe_core::MemorySample) -> anyhow::Result<()> {
            self.records += 1;
            if self.records == 2 {
                anyhow::bail!("report stream closed");
            }
            Ok(())
        }
    }

    let spec = ProbeSpec::new("sink", 100, 10);
    let (_, mut factory) = counting_factory(None);
    let mut sink = FailingSink { records: 0 };

    let err = ProbeHarness::new()
        .run(&spec, &mut factory, &mut sink)
        .unwrap_err();
    assert!(matches!(err, ProbeError::Report { iteration: 10, .. }));
}

#[test]
fn default_harness_is_eager() {
    // Compile-time shape check more than anything: the default harness is
    // the NoYield instantiation.
    let _harness: ProbeHarness<NoYield> = ProbeHarness::default();
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64, // good CI/runtime balance
        .. ProptestConfig::default()
    })]

    // Property: sample count and placement follow the cadence law for all
    // valid (iterations, interval) pairs.
    #[test]
    fn cadence_law(iterations in 1u64..=500, interval in 1u64..=500) {
        let spec = ProbeSpec::new("law", iterations, interval);
        let (_, mut factory) = counting_factory(None);
        let mut sink = CollectSink::new();

        ProbeHarness::new().run(&spec, &mut factory, &mut sink).unwrap();

        let samples = sink.samples();
        prop_assert_eq!(samples.len() as u64, spec.expected_samples());
        prop_assert!(!samples.is_empty());

        // Strictly increasing indices, each on the cadence, gaps exactly
        // one interval.
        for (n, s) in samples.iter().enumerate() {
            prop_assert_eq!(s.iteration_index, n as u64 * interval);
        }
    }
}
