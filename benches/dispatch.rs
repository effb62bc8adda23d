use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use proptest::prelude::*;
use proptest::strategy::ValueTree;
use proptest::test_runner::TestRunner;
use sstf::sched::{Options, Request, RequestId, Sstf};
use std::env;
use std::hint::black_box;

const DEFAULT_SAMPLE_SIZE: usize = 32;
const DEFAULT_REQUESTS: usize = 4_096;

#[derive(Clone, Copy)]
struct Scenario {
    name: &'static str,
    disk_sectors: u64,
    queue_depth: usize,
}

const SCENARIOS: [Scenario; 3] = [
    Scenario {
        name: "shallow-small-disk",
        disk_sectors: 1 << 16,
        queue_depth: 4,
    },
    Scenario {
        name: "deep-small-disk",
        disk_sectors: 1 << 16,
        queue_depth: 128,
    },
    Scenario {
        name: "deep-large-disk",
        disk_sectors: 1 << 40,
        queue_depth: 128,
    },
];

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

fn build_requests(runner: &mut TestRunner, scenario: Scenario, count: usize) -> Vec<Request> {
    let strategy = prop::collection::vec((0..scenario.disk_sectors, 1u64..=256), count);
    let tree = strategy
        .new_tree(runner)
        .expect("failed to generate request offsets");

    tree.current()
        .into_iter()
        .enumerate()
        .map(|(i, (start, sectors))| Request::from_len(RequestId(i as u64), start, sectors))
        .collect()
}

/// Keeps `queue_depth` requests queued: admit one, dispatch one, then drain.
fn run_steady_state(requests: &[Request], queue_depth: usize) -> u64 {
    let mut sched = Sstf::new(Options::default());

    for (i, request) in requests.iter().enumerate() {
        sched.admit(*request);
        if i >= queue_depth {
            black_box(sched.dispatch(false));
        }
    }
    while let Some(request) = sched.dispatch(true) {
        black_box(request);
    }

    sched.counters().seek_distance
}

/// Seek distance of serving the same stream in arrival order.
fn arrival_order_seek(requests: &[Request]) -> u64 {
    let mut head = 0u64;
    requests.iter().fold(0u64, |total, request| {
        let distance = head.abs_diff(request.end());
        head = request.end();
        total.saturating_add(distance)
    })
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sstf_dispatch");
    group.sample_size(env_usize("SSTF_BENCH_SAMPLE_SIZE").unwrap_or(DEFAULT_SAMPLE_SIZE));

    // Env overrides: SSTF_BENCH_REQUESTS, SSTF_BENCH_SAMPLE_SIZE.
    let count = env_usize("SSTF_BENCH_REQUESTS")
        .unwrap_or(DEFAULT_REQUESTS)
        .max(1);

    for scenario in SCENARIOS {
        let mut runner = TestRunner::deterministic();
        let requests = build_requests(&mut runner, scenario, count);

        let sstf_seek = run_steady_state(&requests, scenario.queue_depth);
        let fifo_seek = arrival_order_seek(&requests);
        eprintln!(
            "{}: seek distance sstf={} arrival-order={}",
            scenario.name, sstf_seek, fifo_seek
        );

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("admit_dispatch", scenario.name),
            &requests,
            |b, requests| {
                b.iter(|| black_box(run_steady_state(requests, scenario.queue_depth)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
