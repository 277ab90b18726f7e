//! Node variants of a production network.
//!
//! Nodes are stored in the [`Network`](crate::network::Network) arena and
//! refer to each other only by [`NodeId`]. A node never owns its neighbours.

use std::collections::BTreeMap;

use crate::id::NodeId;
use crate::station::StationType;

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Material-labelled adjacency of a node, in connection order.
#[derive(Debug, Clone, Default)]
pub struct Links {
    /// Upstream nodes per material.
    inputs: Vec<(String, Vec<NodeId>)>,
    /// Downstream nodes per material.
    outputs: Vec<(String, Vec<NodeId>)>,
}

fn push_link(list: &mut Vec<(String, Vec<NodeId>)>, material: &str, node: NodeId) -> bool {
    match list.iter_mut().find(|(m, _)| m == material) {
        Some((_, nodes)) => {
            if nodes.contains(&node) {
                return false;
            }
            nodes.push(node);
        }
        None => list.push((material.to_string(), vec![node])),
    }
    true
}

fn lookup<'a>(list: &'a [(String, Vec<NodeId>)], material: &str) -> &'a [NodeId] {
    list.iter()
        .find(|(m, _)| m == material)
        .map(|(_, nodes)| nodes.as_slice())
        .unwrap_or(&[])
}

impl Links {
    /// Record `node` as an upstream neighbour for `material`. Returns false if
    /// the link already existed.
    pub(crate) fn add_input(&mut self, material: &str, node: NodeId) -> bool {
        push_link(&mut self.inputs, material, node)
    }

    /// Record `node` as a downstream neighbour for `material`. Returns false
    /// if the link already existed.
    pub(crate) fn add_output(&mut self, material: &str, node: NodeId) -> bool {
        push_link(&mut self.outputs, material, node)
    }

    /// Upstream nodes delivering `material`.
    pub fn inputs(&self, material: &str) -> &[NodeId] {
        lookup(&self.inputs, material)
    }

    /// Downstream nodes receiving `material`.
    pub fn outputs(&self, material: &str) -> &[NodeId] {
        lookup(&self.outputs, material)
    }

    /// Materials with at least one upstream link, in connection order.
    pub fn input_materials(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(m, _)| m.as_str())
    }

    /// Materials with at least one downstream link, in connection order.
    pub fn output_materials(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(m, _)| m.as_str())
    }

    /// Whether `material` has at least one downstream link.
    pub fn has_output(&self, material: &str) -> bool {
        !self.outputs(material).is_empty()
    }
}

// ---------------------------------------------------------------------------
// Node variants
// ---------------------------------------------------------------------------

/// A raw-material source.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub material: String,
    pub max_rate: Option<f64>,
}

/// A buffer (belt, pipe, chest line) that merges and splits flows of any
/// number of materials.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub name: String,
    /// Per-material throughput caps.
    pub rate_caps: BTreeMap<String, f64>,
}

/// A group of identical stations modelled as one throughput variable.
#[derive(Debug)]
pub struct StationGroup {
    pub station: Box<dyn StationType>,
    pub max_rate: Option<f64>,
}

/// A sink draining excess `material` from `location`.
#[derive(Debug, Clone, PartialEq)]
pub struct WastePoint {
    pub location: NodeId,
    pub material: String,
    pub max_rate: Option<f64>,
    /// Tie-break weight used when minimising total waste.
    pub weight: f64,
}

/// The variant-specific part of a node.
#[derive(Debug)]
pub enum NodeKind {
    Source(Source),
    Buffer(Buffer),
    Station(StationGroup),
    Waste(WastePoint),
}

/// A node of the production network: its variant plus its links.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub links: Links,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            links: Links::default(),
        }
    }

    pub fn as_source(&self) -> Option<&Source> {
        match &self.kind {
            NodeKind::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&Buffer> {
        match &self.kind {
            NodeKind::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_station(&self) -> Option<&StationGroup> {
        match &self.kind {
            NodeKind::Station(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_waste(&self) -> Option<&WastePoint> {
        match &self.kind {
            NodeKind::Waste(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.kind, NodeKind::Buffer(_))
    }

    /// Short variant name for error messages and logs.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Source(_) => "source",
            NodeKind::Buffer(_) => "buffer",
            NodeKind::Station(_) => "station group",
            NodeKind::Waste(_) => "waste point",
        }
    }
}
