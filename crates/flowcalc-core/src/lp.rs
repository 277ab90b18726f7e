//! Translation of a discovered subgraph into a linear program.
//!
//! # Variable layout
//!
//! | index                | meaning                                   |
//! |----------------------|-------------------------------------------|
//! | 0                    | extraction rate at the output point       |
//! | 1 ..                 | throughput of each station group          |
//! | .. after stations    | flow along each transfer edge             |
//! | .. after transfers   | drained flow of each waste point          |
//!
//! All variables are non-negative. Equalities are homogeneous (flow
//! conservation and fixed ratios), so the zero vector is always feasible.

use std::collections::HashMap;

use crate::id::{BufferLine, NodeId};
use crate::network::{Network, OutputPoint};
use crate::node::{Node, NodeKind};
use crate::result::Bottleneck;
use crate::search::{Subgraph, Transfer};
use crate::station::RateTable;

/// Index of the extraction-rate variable.
pub const OBJECTIVE: usize = 0;

// ---------------------------------------------------------------------------
// Rows and constraints
// ---------------------------------------------------------------------------

/// A sparse linear combination of variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    terms: Vec<(usize, f64)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `coeff * x[var]`, merging with an existing term for `var`.
    pub fn add(&mut self, var: usize, coeff: f64) {
        match self.terms.iter_mut().find(|(v, _)| *v == var) {
            Some((_, c)) => *c += coeff,
            None => self.terms.push((var, coeff)),
        }
    }

    /// Add every term of `other` scaled by `factor`.
    pub fn add_row(&mut self, other: &Row, factor: f64) {
        for &(var, coeff) in &other.terms {
            self.add(var, coeff * factor);
        }
    }

    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    /// Whether every coefficient is zero.
    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|&(_, c)| c == 0.0)
    }

    /// Evaluate the row at `values`.
    pub fn dot(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values.get(var).copied().unwrap_or(0.0))
            .sum()
    }
}

/// `row = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equality {
    pub row: Row,
    pub rhs: f64,
}

/// `row <= bound`, tagged with the capacity it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    pub row: Row,
    pub bound: f64,
    pub bottleneck: Bottleneck,
}

impl Inequality {
    pub fn slack(&self, values: &[f64]) -> f64 {
        self.bound - self.row.dot(values)
    }
}

// ---------------------------------------------------------------------------
// Variable layout
// ---------------------------------------------------------------------------

/// Maps subgraph entities to LP variable indices.
#[derive(Debug, Clone, Default)]
pub struct VariableLayout {
    stations: Vec<NodeId>,
    transfers: Vec<Transfer>,
    wastes: Vec<NodeId>,
    station_index: HashMap<NodeId, usize>,
    transfer_index: HashMap<Transfer, usize>,
    waste_index: HashMap<NodeId, usize>,
}

impl VariableLayout {
    fn new(subgraph: &Subgraph) -> Self {
        let mut layout = Self::default();
        let mut next = OBJECTIVE + 1;
        for &station in &subgraph.stations {
            layout.station_index.insert(station, next);
            layout.stations.push(station);
            next += 1;
        }
        for transfer in &subgraph.transfers {
            layout.transfer_index.insert(transfer.clone(), next);
            layout.transfers.push(transfer.clone());
            next += 1;
        }
        for &waste in &subgraph.wastes {
            layout.waste_index.insert(waste, next);
            layout.wastes.push(waste);
            next += 1;
        }
        layout
    }

    /// Total number of variables, the objective included.
    pub fn variable_count(&self) -> usize {
        1 + self.stations.len() + self.transfers.len() + self.wastes.len()
    }

    pub fn station(&self, id: NodeId) -> Option<usize> {
        self.station_index.get(&id).copied()
    }

    pub fn transfer(&self, from: NodeId, to: NodeId, material: &str) -> Option<usize> {
        self.transfer_index
            .get(&Transfer {
                from,
                to,
                material: material.to_string(),
            })
            .copied()
    }

    pub fn waste(&self, id: NodeId) -> Option<usize> {
        self.waste_index.get(&id).copied()
    }

    pub fn stations(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.stations.iter().map(|&id| (id, self.station_index[&id]))
    }

    pub fn wastes(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.wastes.iter().map(|&id| (id, self.waste_index[&id]))
    }
}

// ---------------------------------------------------------------------------
// LinearProgram
// ---------------------------------------------------------------------------

/// The LP for one output point, plus the rows needed to report rates.
#[derive(Debug, Clone)]
pub struct LinearProgram {
    pub layout: VariableLayout,
    pub equalities: Vec<Equality>,
    /// Ordered: station caps, source caps, buffer caps, output cap, waste caps.
    pub inequalities: Vec<Inequality>,
    /// Total outgoing flow of each discovered source.
    pub source_flows: Vec<(NodeId, Row)>,
    /// Inflow of each discovered buffer line.
    pub buffer_flows: Vec<(BufferLine, Row)>,
    /// `(variable, weight)` of each waste point, for the waste re-solve.
    pub waste_weights: Vec<(usize, f64)>,
    /// Station groups that cannot run (missing input or unsunk output).
    pub idle_stations: Vec<NodeId>,
}

/// Per-unit rate tables of the discovered station groups, queried once.
struct StationRates {
    rates: HashMap<NodeId, (RateTable, RateTable)>,
}

impl StationRates {
    fn input(&self, id: NodeId, material: &str) -> f64 {
        self.rates
            .get(&id)
            .and_then(|(inputs, _)| inputs.get(material))
            .copied()
            .unwrap_or(0.0)
    }

    fn output(&self, id: NodeId, material: &str) -> f64 {
        self.rates
            .get(&id)
            .and_then(|(_, outputs)| outputs.get(material))
            .copied()
            .unwrap_or(0.0)
    }
}

fn is_target(point: &OutputPoint, node: NodeId, material: &str) -> bool {
    point.location == node && point.material == material
}

/// Whether a station group has a feeder for every input and somewhere to
/// put every output.
fn is_runnable(node: &Node, id: NodeId, inputs: &RateTable, outputs: &RateTable, point: &OutputPoint) -> bool {
    let fed = inputs
        .keys()
        .all(|material| !node.links.inputs(material).is_empty());
    let sunk = outputs
        .keys()
        .all(|material| node.links.has_output(material) || is_target(point, id, material));
    fed && sunk
}

/// Build the LP maximising extraction at `point` over `subgraph`.
pub fn build(network: &Network, subgraph: &Subgraph, point: &OutputPoint) -> LinearProgram {
    let layout = VariableLayout::new(subgraph);
    let station_rates = StationRates {
        rates: subgraph
            .stations
            .iter()
            .filter_map(|&id| {
                let group = network.node(id)?.as_station()?;
                Some((id, (group.station.input_rates(), group.station.output_rates())))
            })
            .collect(),
    };

    let mut equalities = Vec::new();
    let mut station_caps = Vec::new();
    let mut source_caps = Vec::new();
    let mut buffer_caps = Vec::new();
    let mut output_caps = Vec::new();
    let mut waste_caps = Vec::new();
    let mut waste_weights = Vec::new();
    let mut idle_stations = Vec::new();

    // Station groups: idle pinning, throughput caps, direct station feeds.
    for (id, var) in layout.stations() {
        let Some(node) = network.node(id) else {
            continue;
        };
        let Some(group) = node.as_station() else {
            continue;
        };
        if let Some((inputs, outputs)) = station_rates.rates.get(&id) {
            if !is_runnable(node, id, inputs, outputs, point) {
                let mut row = Row::new();
                row.add(var, 1.0);
                equalities.push(Equality { row, rhs: 0.0 });
                idle_stations.push(id);
            }
        }
        if let Some(cap) = group.max_rate {
            let mut row = Row::new();
            row.add(var, 1.0);
            station_caps.push(Inequality {
                row,
                bound: cap,
                bottleneck: Bottleneck::StationCap { station: id },
            });
        }
        for material in node.links.input_materials() {
            for &upstream in node.links.inputs(material) {
                let Some(upstream_var) = layout.station(upstream) else {
                    continue;
                };
                let mut row = Row::new();
                row.add(var, station_rates.input(id, material));
                row.add(upstream_var, -station_rates.output(upstream, material));
                equalities.push(Equality { row, rhs: 0.0 });
            }
        }
    }

    // Sources: total outgoing flow, optionally capped.
    let mut source_flows = Vec::new();
    for &id in &subgraph.sources {
        let Some(node) = network.node(id) else {
            continue;
        };
        let Some(source) = node.as_source() else {
            continue;
        };
        let mut flow = Row::new();
        for &downstream in node.links.outputs(&source.material) {
            if let Some(var) = layout.station(downstream) {
                flow.add(var, station_rates.input(downstream, &source.material));
            } else if let Some(var) = layout.transfer(id, downstream, &source.material) {
                flow.add(var, 1.0);
            }
        }
        if let Some(cap) = source.max_rate {
            source_caps.push(Inequality {
                row: flow.clone(),
                bound: cap,
                bottleneck: Bottleneck::SourceCap { source: id },
            });
        }
        source_flows.push((id, flow));
    }

    // Buffer lines: mass balance and throughput caps.
    let mut buffer_flows = Vec::new();
    for line in &subgraph.buffer_lines {
        let Some(node) = network.node(line.buffer) else {
            continue;
        };
        let Some(buffer) = node.as_buffer() else {
            continue;
        };
        let material = line.material.as_str();

        let mut inflow = Row::new();
        for &upstream in node.links.inputs(material) {
            if let Some(var) = layout.station(upstream) {
                inflow.add(var, station_rates.output(upstream, material));
            } else if let Some(var) = layout.transfer(upstream, line.buffer, material) {
                inflow.add(var, 1.0);
            }
        }

        let mut outflow = Row::new();
        for &downstream in node.links.outputs(material) {
            if let Some(var) = layout.station(downstream) {
                outflow.add(var, station_rates.input(downstream, material));
            } else if let Some(var) = layout.transfer(line.buffer, downstream, material) {
                outflow.add(var, 1.0);
            } else if let Some(var) = layout.waste(downstream) {
                outflow.add(var, 1.0);
            }
        }
        if is_target(point, line.buffer, material) {
            outflow.add(OBJECTIVE, 1.0);
        }

        let mut balance = inflow.clone();
        balance.add_row(&outflow, -1.0);
        equalities.push(Equality {
            row: balance,
            rhs: 0.0,
        });

        if let Some(&cap) = buffer.rate_caps.get(material) {
            buffer_caps.push(Inequality {
                row: inflow.clone(),
                bound: cap,
                bottleneck: Bottleneck::BufferCap {
                    buffer: line.buffer,
                    material: line.material.clone(),
                },
            });
        }
        buffer_flows.push((line.clone(), inflow));
    }

    // Extraction straight from a station group's output.
    if let Some(var) = layout.station(point.location) {
        let mut row = Row::new();
        row.add(OBJECTIVE, -1.0);
        row.add(var, station_rates.output(point.location, &point.material));
        equalities.push(Equality { row, rhs: 0.0 });
    }

    if let Some(cap) = point.max_rate {
        let mut row = Row::new();
        row.add(OBJECTIVE, 1.0);
        output_caps.push(Inequality {
            row,
            bound: cap,
            bottleneck: Bottleneck::OutputCap {
                location: point.location,
                material: point.material.clone(),
            },
        });
    }

    // Waste points: station-output drains are ratio-locked, all are capped.
    for (id, var) in layout.wastes() {
        let Some(waste) = network.node(id).and_then(Node::as_waste) else {
            continue;
        };
        waste_weights.push((var, waste.weight));
        let drains_station = network
            .node(waste.location)
            .is_some_and(|n| matches!(n.kind, NodeKind::Station(_)));
        if drains_station {
            if let Some(station_var) = layout.station(waste.location) {
                let mut row = Row::new();
                row.add(var, -1.0);
                row.add(station_var, station_rates.output(waste.location, &waste.material));
                equalities.push(Equality { row, rhs: 0.0 });
            }
        }
        if let Some(cap) = waste.max_rate {
            let mut row = Row::new();
            row.add(var, 1.0);
            waste_caps.push(Inequality {
                row,
                bound: cap,
                bottleneck: Bottleneck::WasteCap { waste: id },
            });
        }
    }

    let mut inequalities = station_caps;
    inequalities.extend(source_caps);
    inequalities.extend(buffer_caps);
    inequalities.extend(output_caps);
    inequalities.extend(waste_caps);

    LinearProgram {
        layout,
        equalities,
        inequalities,
        source_flows,
        buffer_flows,
        waste_weights,
        idle_stations,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
