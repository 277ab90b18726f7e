//! Criterion benchmarks for network analysis.
//!
//! Two benchmark groups:
//! - `single_output`: one output point fed by a long capped smelting chain
//! - `full_analyse`: many output points sharing one capped ore bus

use criterion::{criterion_group, criterion_main, Criterion};
use flowcalc_core::network::{Network, OutputPoint};
use flowcalc_core::test_utils::*;

// ===========================================================================
// Network builders
// ===========================================================================

/// Ore bus feeding `branches` smelter groups, each into its own plate line
/// with a distinct cap. Every plate line is registered as an output point.
fn build_branched_network(branches: usize) -> Network {
    let mut network = Network::new();
    let ore = network.add_source("iron_ore", Some(1000.0)).unwrap();
    let bus = network.add_buffer("ore bus", &[("iron_ore", 800.0)]).unwrap();
    network.connect(ore, bus, &[]).unwrap();

    for i in 0..branches {
        let smelters = network.add_station_group(smelter(), Some(50.0 + i as f64)).unwrap();
        let plates = network
            .add_buffer(format!("plates {i}"), &[("iron_plate", 40.0 + i as f64)])
            .unwrap();
        network.connect(bus, smelters, &[]).unwrap();
        network.connect(smelters, plates, &[]).unwrap();
        network.add_output_point(OutputPoint::new(plates, "iron_plate")).unwrap();
    }
    network
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_single_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_output");

    let caps: Vec<Option<f64>> = (0..40).map(|i| Some(100.0 + i as f64)).collect();
    let (network, point, _, _) = buffer_chain(Some(500.0), &caps);
    group.bench_function("buffer_chain_40_caps", |b| {
        b.iter(|| network.analyse(&point).unwrap());
    });

    let (network, point, _) = byproduct_network();
    group.bench_function("byproduct_waste", |b| {
        b.iter(|| network.analyse(&point).unwrap());
    });

    group.finish();
}

fn bench_full_analyse(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_analyse");

    let network = build_branched_network(20);
    group.bench_function("20_branches", |b| {
        b.iter(|| network.full_analyse().unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_single_output, bench_full_analyse);
criterion_main!(benches);
