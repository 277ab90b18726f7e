//! End-to-end analyses of small production networks.

use approx::assert_relative_eq;
use flowcalc_core::analysis::AnalysisError;
use flowcalc_core::id::{BufferLine, NodeId};
use flowcalc_core::network::{ConfigError, Network, OutputPoint};
use flowcalc_core::result::{Bottleneck, Rates};
use flowcalc_core::test_utils::*;

const EPS: f64 = 1e-6;

// ===========================================================================
// Rates and bottleneck chains
// ===========================================================================

#[test]
fn network_without_caps_is_unbounded() {
    let (network, point, _, buffers) = buffer_chain(None, &[None, None, None]);
    let result = network.analyse(&point).unwrap();
    assert!(result.rate.is_infinite());
    assert!(result.bottlenecks.is_empty());
    for buffer in buffers {
        assert!(result.rates.buffers.get(&BufferLine::new(buffer, "iron_ore")).is_infinite());
    }
}

fn assert_all_infinite(rates: &Rates) {
    assert!(rates.sources.iter().all(|(_, rate)| rate.is_infinite()));
    assert!(rates.buffers.iter().all(|(_, rate)| rate.is_infinite()));
    assert!(rates.stations.iter().all(|(_, rate)| rate.is_infinite()));
    assert!(rates.wastes.iter().all(|(_, rate)| rate.is_infinite()));
}

#[test]
fn uncapped_source_feeding_station_is_unbounded() {
    let mut network = Network::new();
    let ore = network.add_source("iron_ore", None).unwrap();
    let smelters = network.add_station_group(smelter(), None).unwrap();
    network.connect(ore, smelters, &[]).unwrap();

    let result = network.analyse(&OutputPoint::new(smelters, "iron_plate")).unwrap();
    assert!(result.rate.is_infinite());
    assert!(result.bottlenecks.is_empty());
    assert_all_infinite(&result.rates);
    assert!(result.rates.stations.contains(&smelters));
}

#[test]
fn uncapped_station_with_drained_byproduct_is_unbounded() {
    let mut network = Network::new();
    let crude = network.add_source("crude", None).unwrap();
    let refinery = network.add_station_group(refinery(), None).unwrap();
    network.connect(crude, refinery, &[]).unwrap();
    let fuel = network.add_buffer("fuel", &[]).unwrap();
    network.connect(refinery, fuel, &["fuel"]).unwrap();
    let waste = network.add_waste_point(refinery, "residue", None, 1.0).unwrap();

    let result = network.analyse(&OutputPoint::new(fuel, "fuel")).unwrap();
    assert!(result.rate.is_infinite());
    assert!(result.bottlenecks.is_empty());
    assert_all_infinite(&result.rates);
    assert!(result.rates.wastes.contains(&waste));
    assert!(result.rates.sources.contains(&crude));
}

#[test]
fn single_source_cap_gives_one_bottleneck() {
    let (network, point, ids) = ore_chain(Some(20.0), None);
    let result = network.analyse(&point).unwrap();
    assert_relative_eq!(result.rate, 20.0, epsilon = EPS);
    assert_eq!(result.bottlenecks.len(), 1);
    assert_relative_eq!(result.bottlenecks[0].0, 20.0, epsilon = EPS);
    assert_eq!(result.bottlenecks[0].1, Bottleneck::SourceCap { source: ids.source });
    assert_relative_eq!(result.rates.stations.get(&ids.smelter), 20.0, epsilon = EPS);
}

#[test]
fn tighter_buffer_cap_comes_first() {
    let (network, point, ids) = ore_chain(Some(20.0), Some(10.0));
    let result = network.analyse(&point).unwrap();
    assert_relative_eq!(result.rate, 10.0, epsilon = EPS);
    let chain: Vec<f64> = result.bottlenecks.iter().map(|(rate, _)| *rate).collect();
    assert_eq!(chain.len(), 2);
    assert_relative_eq!(chain[0], 10.0, epsilon = EPS);
    assert_relative_eq!(chain[1], 20.0, epsilon = EPS);
    assert!(matches!(result.bottlenecks[0].1, Bottleneck::BufferCap { buffer, .. } if buffer == ids.line));
}

#[test]
fn station_ratios_propagate() {
    let (mut network, _, ids) = ore_chain(Some(12.0), None);
    let plates = network.add_buffer("plates", &[]).unwrap();
    let gears = network.add_station_group(gear_assembler(), Some(4.0)).unwrap();
    network.connect(ids.smelter, plates, &[]).unwrap();
    network.connect(plates, gears, &[]).unwrap();

    let result = network.analyse(&OutputPoint::new(gears, "gear")).unwrap();
    assert_relative_eq!(result.rate, 4.0, epsilon = EPS);
    assert_eq!(result.limiting(), Some(&Bottleneck::StationCap { station: gears }));
    assert_relative_eq!(result.rates.sources.get(&ids.source), 8.0, epsilon = EPS);
    assert_relative_eq!(result.bottlenecks[1].0, 6.0, epsilon = EPS);
    let costs = result.source_costs();
    assert_eq!(costs.len(), 1);
    assert_relative_eq!(costs[0].1, 2.0, epsilon = EPS);
}

#[test]
fn removing_caps_replays_the_chain() {
    let caps = [Some(8.0), Some(3.0), Some(5.0)];
    let (network, point, source, buffers) = buffer_chain(Some(10.0), &caps);
    let result = network.analyse(&point).unwrap();
    let rates: Vec<f64> = result.bottlenecks.iter().map(|(rate, _)| *rate).collect();
    assert_eq!(rates.len(), 4);
    for (got, want) in rates.iter().zip([3.0, 5.0, 8.0, 10.0]) {
        assert_relative_eq!(*got, want, epsilon = EPS);
    }

    let mut source_cap = Some(10.0);
    let mut remaining = caps.to_vec();
    for (step, (_, bottleneck)) in result.bottlenecks.iter().enumerate() {
        match bottleneck {
            Bottleneck::SourceCap { source: id } if *id == source => source_cap = None,
            Bottleneck::BufferCap { buffer, .. } => {
                let index = buffers.iter().position(|b| b == buffer).unwrap();
                remaining[index] = None;
            }
            other => panic!("unexpected bottleneck {other:?}"),
        }
        let (replay, replay_point, _, _) = buffer_chain(source_cap, &remaining);
        let rate = replay.analyse(&replay_point).unwrap().rate;
        match result.bottlenecks.get(step + 1) {
            Some((next, _)) => assert_relative_eq!(rate, *next, epsilon = EPS),
            None => assert!(rate.is_infinite()),
        }
    }
}

#[test]
fn analyse_is_idempotent() {
    let (network, point, _) = byproduct_network();
    let first = network.analyse(&point).unwrap();
    let second = network.analyse(&point).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rates_follow_insertion_order() {
    let (network, point, ids) = byproduct_network();
    let result = network.analyse(&point).unwrap();
    let stations: Vec<NodeId> = result.rates.stations.keys().copied().collect();
    assert_eq!(stations, vec![ids.refinery, ids.crafter]);
    let wastes: Vec<NodeId> = result.rates.wastes.keys().copied().collect();
    assert_eq!(wastes, vec![ids.line_waste, ids.station_waste]);
}

// ===========================================================================
// Waste points
// ===========================================================================

#[test]
fn byproducts_are_discarded() {
    let (network, point, ids) = byproduct_network();
    let result = network.analyse(&point).unwrap();
    assert_relative_eq!(result.rate, 10.0, epsilon = EPS);
    assert_eq!(result.bottlenecks.len(), 1);
    assert_eq!(result.bottlenecks[0].1, Bottleneck::SourceCap { source: ids.source });
    assert_relative_eq!(result.rates.wastes.get(&ids.line_waste), 10.0, epsilon = EPS);
    assert_relative_eq!(result.rates.wastes.get(&ids.station_waste), 15.0, epsilon = EPS);
    assert_relative_eq!(
        result.rates.buffers.get(&BufferLine::new(ids.main_line, "C")),
        20.0,
        epsilon = EPS
    );
}

/// `crude (cap 10) -> refinery`, fuel into a line, residue split between two
/// dumps with the given waste weights. Returns the two waste points.
fn split_residue(cheap_weight: f64, dear_weight: f64) -> (Network, OutputPoint, NodeId, NodeId) {
    let mut network = Network::new();
    let crude = network.add_source("crude", Some(10.0)).unwrap();
    let refinery = network.add_station_group(refinery(), None).unwrap();
    network.connect(crude, refinery, &[]).unwrap();
    let fuel_line = network.add_buffer("fuel", &[]).unwrap();
    network.connect(refinery, fuel_line, &["fuel"]).unwrap();

    let residue = network.add_buffer("residue", &[]).unwrap();
    network.connect(refinery, residue, &["residue"]).unwrap();
    let first_dump = network.add_buffer("first dump", &[]).unwrap();
    let second_dump = network.add_buffer("second dump", &[]).unwrap();
    network.connect(residue, first_dump, &["residue"]).unwrap();
    network.connect(residue, second_dump, &["residue"]).unwrap();
    let first = network.add_waste_point(first_dump, "residue", None, cheap_weight).unwrap();
    let second = network.add_waste_point(second_dump, "residue", None, dear_weight).unwrap();

    (network, OutputPoint::new(fuel_line, "fuel"), first, second)
}

#[test]
fn waste_prefers_the_lighter_weight() {
    let (network, point, light, heavy) = split_residue(1.0, 5.0);
    let result = network.analyse(&point).unwrap();
    assert_relative_eq!(result.rate, 5.0, epsilon = EPS);
    assert_relative_eq!(result.rates.wastes.get(&light), 5.0, epsilon = EPS);
    assert_eq!(result.rates.wastes.get(&heavy), 0.0);

    let (network, point, heavy, light) = split_residue(5.0, 1.0);
    let result = network.analyse(&point).unwrap();
    assert_relative_eq!(result.rates.wastes.get(&light), 5.0, epsilon = EPS);
    assert_eq!(result.rates.wastes.get(&heavy), 0.0);
}

#[test]
fn unrelated_waste_point_stays_out() {
    let (mut network, point, _) = ore_chain(Some(5.0), None);
    let stone = network.add_source("stone", Some(3.0)).unwrap();
    let quarry = network.add_buffer("quarry", &[]).unwrap();
    network.connect(stone, quarry, &[]).unwrap();
    let dump = network.add_waste_point(quarry, "stone", None, 1.0).unwrap();

    let result = network.analyse(&point).unwrap();
    assert!(!result.rates.wastes.contains(&dump));
    assert!(!result.rates.sources.contains(&stone));
    assert_relative_eq!(result.rate, 5.0, epsilon = EPS);
}

// ===========================================================================
// Rejections
// ===========================================================================

#[test]
fn invalid_operations_are_rejected() {
    let mut network = Network::new();
    let ore = network.add_source("iron_ore", None).unwrap();
    let line = network.add_buffer("line", &[]).unwrap();
    assert_eq!(network.connect(line, ore, &["iron_ore"]), Err(ConfigError::ConnectIntoSource));
    assert!(matches!(
        network.analyse(&OutputPoint::new(ore, "iron_ore")),
        Err(AnalysisError::Config(ConfigError::OutputFromSource))
    ));

    network.connect(ore, line, &[]).unwrap();
    network.add_waste_point(line, "iron_ore", None, 1.0).unwrap();
    assert!(matches!(
        network.analyse(&OutputPoint::new(line, "iron_ore")),
        Err(AnalysisError::Config(ConfigError::WastePointAttached(_)))
    ));
}

// ===========================================================================
// Full analysis
// ===========================================================================

#[test]
fn full_analyse_takes_keywise_maximum() {
    let (mut network, _, ids) = ore_chain(Some(12.0), None);
    let capped = network.add_station_group(smelter(), Some(5.0)).unwrap();
    let second_line = network.add_buffer("second line", &[]).unwrap();
    network.connect(ids.source, second_line, &[]).unwrap();
    network.connect(second_line, capped, &[]).unwrap();

    network.add_output_point(OutputPoint::new(capped, "iron_plate")).unwrap();
    network.add_output_point(OutputPoint::new(ids.smelter, "iron_plate")).unwrap();
    let aggregate = network.full_analyse().unwrap();
    assert_eq!(aggregate.singles.len(), 2);

    let (_, first) = &aggregate.singles[0];
    let (_, second) = &aggregate.singles[1];
    assert_relative_eq!(first.rate, 5.0, epsilon = EPS);
    assert_relative_eq!(second.rate, 12.0, epsilon = EPS);

    for (source, rate) in aggregate.rates.sources.iter() {
        let expected = first.rates.sources.get(source).max(second.rates.sources.get(source));
        assert_eq!(rate, expected);
    }
    for (line, rate) in aggregate.rates.buffers.iter() {
        let expected = first.rates.buffers.get(line).max(second.rates.buffers.get(line));
        assert_eq!(rate, expected);
    }
    for (station, rate) in aggregate.rates.stations.iter() {
        let expected = first.rates.stations.get(station).max(second.rates.stations.get(station));
        assert_eq!(rate, expected);
    }
    assert_relative_eq!(aggregate.rates.stations.get(&capped), 5.0, epsilon = EPS);
    assert_relative_eq!(aggregate.rates.stations.get(&ids.smelter), 12.0, epsilon = EPS);
}
