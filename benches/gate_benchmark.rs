//! Benchmarks for hotfolder event admission
//!
//! Admission runs on the session's coordination task for every creation
//! event, so it has to stay cheap even when a copy drops hundreds of files
//! into the watched directory at once.
//!
//! **Benchmarks Included:**
//! - `gate_check`: filter a mixed batch of events (videos, other files, directories)
//! - `gate_allowlist`: single lookups against allowlists of growing size
//!
//! **Run benchmarks:**
//! ```bash
//! cargo bench                     # Run all benchmarks
//! cargo bench -- gate_check       # Batch filtering only
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hotfolder::watcher::{DebounceGate, FileEvent};
use hotfolder::WatchConfig;

/// Mixed batch: a third videos, a third other files, a third directories.
fn mixed_events(count: usize) -> Vec<FileEvent> {
    (0..count)
        .map(|i| match i % 3 {
            0 => FileEvent::file(format!("/media/inbox/clip_{i}.MP4")),
            1 => FileEvent::file(format!("/media/inbox/notes_{i}.txt")),
            _ => FileEvent::directory(format!("/media/inbox/batch_{i}.mkv")),
        })
        .collect()
}

fn default_gate() -> DebounceGate {
    let config = WatchConfig::new("/media/inbox").expect("valid config");
    DebounceGate::new(&config)
}

/// Benchmark: filtering batches of 10, 100 and 1000 events.
fn bench_gate_check(c: &mut Criterion) {
    let gate = default_gate();

    let mut group = c.benchmark_group("gate_check");
    for count in &[10, 100, 1000] {
        let events = mixed_events(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &events, |b, events| {
            b.iter(|| {
                events
                    .iter()
                    .filter(|event| gate.accepts(black_box(event)))
                    .count()
            });
        });
    }
    group.finish();
}

/// Benchmark: one lookup against allowlists of 3, 30 and 300 extensions.
fn bench_gate_allowlist(c: &mut Criterion) {
    let event = FileEvent::file("/media/inbox/holiday.mkv");

    let mut group = c.benchmark_group("gate_allowlist");
    for size in &[3usize, 30, 300] {
        let mut extensions: Vec<String> = (0..*size).map(|i| format!("x{i}")).collect();
        extensions.push("mkv".to_string());
        let config = WatchConfig::new("/media/inbox")
            .expect("valid config")
            .with_extensions(&extensions)
            .expect("valid extensions");
        let gate = DebounceGate::new(&config);

        group.bench_with_input(BenchmarkId::from_parameter(size), &gate, |b, gate| {
            b.iter(|| gate.check(black_box(&event)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gate_check, bench_gate_allowlist);
criterion_main!(benches);
