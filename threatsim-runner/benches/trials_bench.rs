//! Criterion benchmarks for ThreatSim trial batches.
//!
//! Run with: `cargo bench -p threatsim-runner`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use threatsim_runner::{run_trials, SimulationConfig, TrialsConfig};

fn bench_trials(c: &mut Criterion) {
    let mut config = SimulationConfig::default();
    config.scenarios.base.detection_ratio = 0.9;

    let mut group = c.benchmark_group("trials");
    for trials in [10usize, 100, 1_000] {
        for parallel in [false, true] {
            let id = format!("{trials}/{}", if parallel { "par" } else { "seq" });
            group.bench_with_input(BenchmarkId::from_parameter(id), &trials, |b, &n| {
                b.iter(|| {
                    let result = run_trials(
                        black_box(&config),
                        &TrialsConfig {
                            trials: n,
                            master_seed: 42,
                            parallel,
                        },
                    );
                    black_box(result.map(|r| r.scenarios.len()))
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_trials);
criterion_main!(benches);
