use serde::Serialize;
use slotmap::{SecondaryMap, SlotMap};

use crate::config::AnalysisConfig;
use crate::id::NodeId;
use crate::node::*;
use crate::station::StationType;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Caller mistakes while building a network or choosing an output point.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("rate cap or weight must be non-negative and finite, got {0}")]
    InvalidRate(f64),
    #[error("cannot connect anything towards a source")]
    ConnectIntoSource,
    #[error("waste points only accept their own drain edge")]
    ConnectWastePoint,
    #[error("cannot connect a node to itself")]
    SelfLoop,
    #[error("source produces {expected}, cannot connect {got}")]
    SourceMaterialMismatch { expected: String, got: String },
    #[error("station group does not handle material {0}")]
    UnknownMaterial(String),
    #[error("station output {0} is already wired")]
    OutputAlreadyWired(String),
    #[error("station input {0} is already fed by another node")]
    StationInputTaken(String),
    #[error("unable to auto-detect material")]
    AmbiguousMaterial,
    #[error("taking output directly from a source is not supported")]
    OutputFromSource,
    #[error("taking output from a waste point is not supported")]
    OutputFromWaste,
    #[error("{0} already has a waste point attached")]
    WastePointAttached(String),
    #[error("{0} is already registered as an output point")]
    OutputPointRegistered(String),
    #[error("waste points can only drain buffers and station groups, not a {0}")]
    InvalidWasteLocation(&'static str),
}

fn check_rate(rate: Option<f64>) -> Result<(), ConfigError> {
    match rate {
        Some(r) if !r.is_finite() || r < 0.0 => Err(ConfigError::InvalidRate(r)),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Output points
// ---------------------------------------------------------------------------

/// Where throughput is extracted from the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputPoint {
    pub location: NodeId,
    pub material: String,
    pub max_rate: Option<f64>,
}

impl OutputPoint {
    pub fn new(location: NodeId, material: impl Into<String>) -> Self {
        Self {
            location,
            material: material.into(),
            max_rate: None,
        }
    }

    pub fn with_max_rate(mut self, max_rate: f64) -> Self {
        self.max_rate = Some(max_rate);
        self
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A production network: the arena owning every node, plus the registered
/// output points.
///
/// Nodes are never removed, so every `NodeId` handed out stays valid for the
/// life of the network. Insertion order is tracked separately and is the
/// canonical order for reporting.
#[derive(Debug, Default)]
pub struct Network {
    nodes: SlotMap<NodeId, Node>,
    order: Vec<NodeId>,
    positions: SecondaryMap<NodeId, usize>,
    output_points: Vec<OutputPoint>,
    config: AnalysisConfig,
}

impl Network {
    /// Create an empty network with the default analysis configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty network analysed with `config`.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.insert(Node::new(kind));
        self.positions.insert(id, self.order.len());
        self.order.push(id);
        id
    }

    fn get(&self, id: NodeId) -> Result<&Node, ConfigError> {
        self.nodes.get(id).ok_or(ConfigError::NodeNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Add a source of `material`, optionally capped at `max_rate`.
    pub fn add_source(
        &mut self,
        material: impl Into<String>,
        max_rate: Option<f64>,
    ) -> Result<NodeId, ConfigError> {
        check_rate(max_rate)?;
        Ok(self.insert(NodeKind::Source(Source {
            material: material.into(),
            max_rate,
        })))
    }

    /// Add a buffer with optional per-material throughput caps.
    pub fn add_buffer(
        &mut self,
        name: impl Into<String>,
        rate_caps: &[(&str, f64)],
    ) -> Result<NodeId, ConfigError> {
        for &(_, cap) in rate_caps {
            check_rate(Some(cap))?;
        }
        Ok(self.insert(NodeKind::Buffer(Buffer {
            name: name.into(),
            rate_caps: rate_caps
                .iter()
                .map(|&(material, cap)| (material.to_string(), cap))
                .collect(),
        })))
    }

    /// Add a station group whose throughput is optionally capped.
    pub fn add_station_group(
        &mut self,
        station: impl StationType + 'static,
        max_rate: Option<f64>,
    ) -> Result<NodeId, ConfigError> {
        check_rate(max_rate)?;
        Ok(self.insert(NodeKind::Station(StationGroup {
            station: Box::new(station),
            max_rate,
        })))
    }

    /// Add a waste point draining `material` from `location`, wiring its
    /// single drain edge.
    ///
    /// The location must be a buffer, or a station group producing
    /// `material` that is not yet wired anywhere.
    pub fn add_waste_point(
        &mut self,
        location: NodeId,
        material: impl Into<String>,
        max_rate: Option<f64>,
        weight: f64,
    ) -> Result<NodeId, ConfigError> {
        let material = material.into();
        check_rate(max_rate)?;
        check_rate(Some(weight))?;
        let node = self.get(location)?;
        match &node.kind {
            NodeKind::Buffer(_) => {
                if self.waste_point_at(location, &material).is_some() {
                    return Err(ConfigError::WastePointAttached(material));
                }
            }
            NodeKind::Station(group) => {
                if !group.station.output_rates().contains_key(&material) {
                    return Err(ConfigError::UnknownMaterial(material));
                }
                if node.links.has_output(&material) {
                    return Err(ConfigError::OutputAlreadyWired(material));
                }
            }
            NodeKind::Source(_) | NodeKind::Waste(_) => {
                return Err(ConfigError::InvalidWasteLocation(node.kind_name()));
            }
        }
        if self.output_point_at(location, &material).is_some() {
            return Err(ConfigError::OutputPointRegistered(material));
        }

        let waste = self.insert(NodeKind::Waste(WastePoint {
            location,
            material: material.clone(),
            max_rate,
            weight,
        }));
        if let Some(node) = self.nodes.get_mut(location) {
            node.links.add_output(&material, waste);
        }
        if let Some(node) = self.nodes.get_mut(waste) {
            node.links.add_input(&material, location);
        }
        Ok(waste)
    }

    /// Connect the output of `from` to the input of `to` for each material.
    ///
    /// With no materials given, one is auto-detected: the material of a
    /// source, or the only output of a station group on the `from` side, or
    /// the only input of a station group on the `to` side.
    ///
    /// All materials are validated before any edge is added.
    pub fn connect(&mut self, from: NodeId, to: NodeId, materials: &[&str]) -> Result<(), ConfigError> {
        let from_node = self.get(from)?;
        let to_node = self.get(to)?;
        if from == to {
            return Err(ConfigError::SelfLoop);
        }
        if matches!(to_node.kind, NodeKind::Source(_)) {
            return Err(ConfigError::ConnectIntoSource);
        }
        if matches!(from_node.kind, NodeKind::Waste(_)) || matches!(to_node.kind, NodeKind::Waste(_)) {
            return Err(ConfigError::ConnectWastePoint);
        }

        let materials: Vec<String> = if materials.is_empty() {
            vec![Self::detect_material(from_node, to_node)?]
        } else {
            materials.iter().map(|m| m.to_string()).collect()
        };

        for material in &materials {
            match &from_node.kind {
                NodeKind::Source(source) if &source.material != material => {
                    return Err(ConfigError::SourceMaterialMismatch {
                        expected: source.material.clone(),
                        got: material.clone(),
                    });
                }
                NodeKind::Station(group) => {
                    if !group.station.output_rates().contains_key(material) {
                        return Err(ConfigError::UnknownMaterial(material.clone()));
                    }
                    let wired = from_node.links.outputs(material);
                    if !wired.is_empty() && wired != [to] {
                        return Err(ConfigError::OutputAlreadyWired(material.clone()));
                    }
                    if self.output_point_at(from, material).is_some() {
                        return Err(ConfigError::OutputPointRegistered(material.clone()));
                    }
                }
                _ => {}
            }
            if let NodeKind::Station(group) = &to_node.kind {
                if !group.station.input_rates().contains_key(material) {
                    return Err(ConfigError::UnknownMaterial(material.clone()));
                }
                let feeders = to_node.links.inputs(material);
                if !feeders.is_empty() && feeders != [from] {
                    return Err(ConfigError::StationInputTaken(material.clone()));
                }
            }
        }

        for material in &materials {
            if let Some(node) = self.nodes.get_mut(to) {
                node.links.add_input(material, from);
            }
            if let Some(node) = self.nodes.get_mut(from) {
                node.links.add_output(material, to);
            }
        }
        Ok(())
    }

    fn detect_material(from: &Node, to: &Node) -> Result<String, ConfigError> {
        if let NodeKind::Source(source) = &from.kind {
            return Ok(source.material.clone());
        }
        if let NodeKind::Station(group) = &from.kind {
            let outputs = group.station.output_rates();
            if outputs.len() == 1 {
                if let Some(material) = outputs.into_keys().next() {
                    return Ok(material);
                }
            }
        }
        if let NodeKind::Station(group) = &to.kind {
            let inputs = group.station.input_rates();
            if inputs.len() == 1 {
                if let Some(material) = inputs.into_keys().next() {
                    return Ok(material);
                }
            }
        }
        Err(ConfigError::AmbiguousMaterial)
    }

    /// Register an output point for [`full_analyse`](Network::full_analyse).
    pub fn add_output_point(&mut self, point: OutputPoint) -> Result<(), ConfigError> {
        self.validate_output_point(&point)?;
        if self.output_point_at(point.location, &point.material).is_some() {
            return Err(ConfigError::OutputPointRegistered(point.material));
        }
        self.output_points.push(point);
        Ok(())
    }

    /// Check that throughput can be extracted at `point`.
    pub fn validate_output_point(&self, point: &OutputPoint) -> Result<(), ConfigError> {
        check_rate(point.max_rate)?;
        let node = self.get(point.location)?;
        match &node.kind {
            NodeKind::Source(_) => Err(ConfigError::OutputFromSource),
            NodeKind::Waste(_) => Err(ConfigError::OutputFromWaste),
            NodeKind::Station(group) => {
                if !group.station.output_rates().contains_key(&point.material) {
                    return Err(ConfigError::UnknownMaterial(point.material.clone()));
                }
                if self.waste_point_at(point.location, &point.material).is_some() {
                    return Err(ConfigError::WastePointAttached(point.material.clone()));
                }
                if node.links.has_output(&point.material) {
                    return Err(ConfigError::OutputAlreadyWired(point.material.clone()));
                }
                Ok(())
            }
            NodeKind::Buffer(_) => {
                if self.waste_point_at(point.location, &point.material).is_some() {
                    return Err(ConfigError::WastePointAttached(point.material.clone()));
                }
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.order
            .iter()
            .filter_map(|&id| self.nodes.get(id).map(|node| (id, node)))
    }

    /// Insertion index of a node, the canonical reporting order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Iterate over all waste points in insertion order.
    pub fn waste_points(&self) -> impl Iterator<Item = (NodeId, &WastePoint)> {
        self.nodes().filter_map(|(id, node)| node.as_waste().map(|w| (id, w)))
    }

    /// The waste point draining `material` from `location`, if any.
    pub fn waste_point_at(&self, location: NodeId, material: &str) -> Option<NodeId> {
        self.nodes.get(location)?.links.outputs(material).iter().copied().find(|&id| {
            self.nodes
                .get(id)
                .and_then(Node::as_waste)
                .is_some_and(|w| w.location == location && w.material == material)
        })
    }

    /// Registered output points, in registration order.
    pub fn output_points(&self) -> &[OutputPoint] {
        &self.output_points
    }

    fn output_point_at(&self, location: NodeId, material: &str) -> Option<&OutputPoint> {
        self.output_points
            .iter()
            .find(|p| p.location == location && p.material == material)
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
