//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`; downstream
//! crates enable the `test-utils` feature in their dev-dependencies.

use crate::id::NodeId;
use crate::network::{Network, OutputPoint};
use crate::station::RecipeStation;

// ===========================================================================
// Station constructors
// ===========================================================================

/// A one-second recipe station. Panics on invalid amounts.
pub fn recipe(name: &str, inputs: &[(&str, f64)], outputs: &[(&str, f64)]) -> RecipeStation {
    fn owned(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
        entries
            .iter()
            .map(|&(material, amount)| (material.to_string(), amount))
            .collect()
    }
    RecipeStation::new(name, owned(inputs), owned(outputs), 1.0).expect("valid test recipe")
}

/// 1 iron_ore -> 1 iron_plate.
pub fn smelter() -> RecipeStation {
    recipe("smelter", &[("iron_ore", 1.0)], &[("iron_plate", 1.0)])
}

/// 2 iron_plate -> 1 gear.
pub fn gear_assembler() -> RecipeStation {
    recipe("gear assembler", &[("iron_plate", 2.0)], &[("gear", 1.0)])
}

/// 2 crude -> 1 fuel + 1 residue.
pub fn refinery() -> RecipeStation {
    recipe("refinery", &[("crude", 2.0)], &[("fuel", 1.0), ("residue", 1.0)])
}

// ===========================================================================
// Network builders
// ===========================================================================

/// Node ids of [`ore_chain`].
#[derive(Debug, Clone, Copy)]
pub struct ChainIds {
    pub source: NodeId,
    pub line: NodeId,
    pub smelter: NodeId,
}

/// `iron_ore source -> "ore line" buffer -> smelter`, extracting iron_plate
/// straight from the smelter. The output point is not registered.
pub fn ore_chain(source_cap: Option<f64>, line_cap: Option<f64>) -> (Network, OutputPoint, ChainIds) {
    let mut network = Network::new();
    let source = network.add_source("iron_ore", source_cap).unwrap();
    let caps: Vec<(&str, f64)> = line_cap.map(|c| ("iron_ore", c)).into_iter().collect();
    let line = network.add_buffer("ore line", &caps).unwrap();
    let smelter = network.add_station_group(smelter(), None).unwrap();
    network.connect(source, line, &[]).unwrap();
    network.connect(line, smelter, &[]).unwrap();
    let point = OutputPoint::new(smelter, "iron_plate");
    (network, point, ChainIds { source, line, smelter })
}

/// A source followed by one buffer per entry of `caps`, each optionally
/// capping `iron_ore`. Extraction is at the last buffer. Returns the source
/// and the buffers in chain order.
pub fn buffer_chain(
    source_cap: Option<f64>,
    caps: &[Option<f64>],
) -> (Network, OutputPoint, NodeId, Vec<NodeId>) {
    let mut network = Network::new();
    let source = network.add_source("iron_ore", source_cap).unwrap();
    let mut buffers = Vec::new();
    let mut previous = source;
    for (i, cap) in caps.iter().enumerate() {
        let caps: Vec<(&str, f64)> = cap.map(|c| ("iron_ore", c)).into_iter().collect();
        let buffer = network.add_buffer(format!("segment {i}"), &caps).unwrap();
        network.connect(previous, buffer, &["iron_ore"]).unwrap();
        buffers.push(buffer);
        previous = buffer;
    }
    let point = OutputPoint::new(previous, "iron_ore");
    (network, point, source, buffers)
}

/// Node ids of [`byproduct_network`].
#[derive(Debug, Clone, Copy)]
pub struct ByproductIds {
    pub source: NodeId,
    pub refinery: NodeId,
    pub main_line: NodeId,
    pub crafter: NodeId,
    pub line_waste: NodeId,
    pub station_waste: NodeId,
}

/// A network that must discard part of its intermediates:
///
/// `A (cap 10) -> refinery (A -> B + 2 C + 1.5 E) -> main_line (B, C)`,
/// `main_line -> crafter (B + C -> D) -> main_line (D)`, with waste points on
/// `(main_line, C)` and `(refinery, E)`. Extraction is D at main_line and is
/// registered.
pub fn byproduct_network() -> (Network, OutputPoint, ByproductIds) {
    let mut network = Network::new();
    let source = network.add_source("A", Some(10.0)).unwrap();
    let refinery = network
        .add_station_group(
            recipe("A to B+C", &[("A", 1.0)], &[("B", 1.0), ("C", 2.0), ("E", 1.5)]),
            None,
        )
        .unwrap();
    network.connect(source, refinery, &[]).unwrap();

    let main_line = network.add_buffer("main_line", &[]).unwrap();
    network.connect(refinery, main_line, &["B", "C"]).unwrap();
    let line_waste = network.add_waste_point(main_line, "C", None, 1.0).unwrap();
    let station_waste = network.add_waste_point(refinery, "E", None, 1.0).unwrap();

    let crafter = network
        .add_station_group(recipe("crafter", &[("B", 1.0), ("C", 1.0)], &[("D", 1.0)]), None)
        .unwrap();
    network.connect(main_line, crafter, &["B", "C"]).unwrap();
    network.connect(crafter, main_line, &["D"]).unwrap();

    let point = OutputPoint::new(main_line, "D");
    network.add_output_point(point.clone()).unwrap();
    let ids = ByproductIds {
        source,
        refinery,
        main_line,
        crafter,
        line_waste,
        station_waste,
    };
    (network, point, ids)
}
