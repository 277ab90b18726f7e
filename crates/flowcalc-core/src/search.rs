//! Backward reachability: which part of a network can feed an output point.
//!
//! The search walks "inputs" edges breadth-first from the extraction point.
//! Materials are tracked only through buffers; once a station group is
//! reachable all of its inputs are relevant. Waste points are then pulled in
//! by a fixed-point closure: a waste point joins when its own backward search
//! touches anything already discovered.

use std::collections::HashSet;

use crate::id::{BufferLine, NodeId};
use crate::network::Network;
use crate::node::NodeKind;

/// A flow edge that gets its own LP variable: source-to-buffer or
/// buffer-to-buffer, for one material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub from: NodeId,
    pub to: NodeId,
    pub material: String,
}

/// The part of a network relevant to one output point, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    pub sources: Vec<NodeId>,
    pub stations: Vec<NodeId>,
    pub buffer_lines: Vec<BufferLine>,
    pub transfers: Vec<Transfer>,
    pub wastes: Vec<NodeId>,
}

impl Subgraph {
    /// Whether this subgraph shares any source, station group or buffer line
    /// with `other`.
    fn touches(&self, other: &Subgraph) -> bool {
        self.sources.iter().any(|s| other.sources.contains(s))
            || self.stations.iter().any(|s| other.stations.contains(s))
            || self.buffer_lines.iter().any(|l| other.buffer_lines.contains(l))
    }

    /// Append everything from `other` not already present.
    fn merge(&mut self, other: Subgraph) {
        fn extend_unique<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
            for item in from {
                if !into.contains(&item) {
                    into.push(item);
                }
            }
        }
        extend_unique(&mut self.sources, other.sources);
        extend_unique(&mut self.stations, other.stations);
        extend_unique(&mut self.buffer_lines, other.buffer_lines);
        extend_unique(&mut self.transfers, other.transfers);
        extend_unique(&mut self.wastes, other.wastes);
    }
}

/// A search frontier entry. The material is only set for buffers.
type Visit = (NodeId, Option<String>);

fn visit_key(network: &Network, node: NodeId, material: &str) -> Visit {
    let is_buffer = network.node(node).is_some_and(|n| n.is_buffer());
    if is_buffer {
        (node, Some(material.to_string()))
    } else {
        (node, None)
    }
}

/// Breadth-first backward search from `material` at `start`.
pub fn search_from(network: &Network, start: NodeId, material: &str) -> Subgraph {
    let mut found = Subgraph::default();
    let first = visit_key(network, start, material);
    let mut searched: HashSet<Visit> = HashSet::from([first.clone()]);
    let mut frontier = vec![first];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (id, material) in frontier {
            let Some(node) = network.node(id) else {
                continue;
            };
            match (&node.kind, material) {
                (NodeKind::Station(_), _) => {
                    found.stations.push(id);
                    for input_material in node.links.input_materials() {
                        for &upstream in node.links.inputs(input_material) {
                            let key = visit_key(network, upstream, input_material);
                            if searched.insert(key.clone()) {
                                next.push(key);
                            }
                        }
                    }
                }
                (NodeKind::Source(_), _) => found.sources.push(id),
                (NodeKind::Buffer(_), Some(material)) => {
                    for &upstream in node.links.inputs(&material) {
                        let key = visit_key(network, upstream, &material);
                        if searched.insert(key.clone()) {
                            next.push(key);
                        }
                        let is_transfer = network.node(upstream).is_some_and(|n| {
                            matches!(n.kind, NodeKind::Buffer(_) | NodeKind::Source(_))
                        });
                        if is_transfer {
                            found.transfers.push(Transfer {
                                from: upstream,
                                to: id,
                                material: material.clone(),
                            });
                        }
                    }
                    found.buffer_lines.push(BufferLine::new(id, material));
                }
                // Waste points have no outputs, so they are never reached
                // backwards; a buffer is always visited with its material.
                (NodeKind::Buffer(_), None) | (NodeKind::Waste(_), _) => {}
            }
        }
        frontier = next;
    }
    found
}

/// Discover everything relevant to extracting `material` at `location`,
/// including waste points whose draining shares upstream capacity.
pub fn discover(network: &Network, location: NodeId, material: &str) -> Subgraph {
    let mut found = search_from(network, location, material);

    loop {
        let mut added = false;
        for (waste_id, waste) in network.waste_points() {
            if found.wastes.contains(&waste_id) {
                continue;
            }
            let sub = search_from(network, waste.location, &waste.material);
            if sub.touches(&found) {
                tracing::trace!(?waste_id, "waste point joins the analysed subgraph");
                found.merge(sub);
                found.wastes.push(waste_id);
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    found
}

// ===========================================================================
// Tests
// ===========================================================================
