//! Analysis results: rate snapshots, bottleneck chains and aggregates.

use serde::Serialize;

use crate::id::{BufferLine, NodeId};
use crate::network::{Network, OutputPoint};

// ---------------------------------------------------------------------------
// Bottleneck
// ---------------------------------------------------------------------------

/// The capacity constraint that limits a rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Bottleneck {
    /// A source's maximum rate.
    SourceCap { source: NodeId },
    /// A station group's throughput cap.
    StationCap { station: NodeId },
    /// A buffer's per-material throughput cap.
    BufferCap { buffer: NodeId, material: String },
    /// The output point's own rate cap.
    OutputCap { location: NodeId, material: String },
    /// A waste point's rate cap.
    WasteCap { waste: NodeId },
}

impl Bottleneck {
    /// The node owning the constraint.
    pub fn node(&self) -> NodeId {
        match self {
            Bottleneck::SourceCap { source } => *source,
            Bottleneck::StationCap { station } => *station,
            Bottleneck::BufferCap { buffer, .. } => *buffer,
            Bottleneck::OutputCap { location, .. } => *location,
            Bottleneck::WasteCap { waste } => *waste,
        }
    }
}

// ---------------------------------------------------------------------------
// RateMap
// ---------------------------------------------------------------------------

/// Ordered `key -> rate` entries. Missing keys read as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateMap<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for RateMap<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> RateMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate for `key`, zero when absent.
    pub fn get(&self, key: &K) -> f64 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Set the rate for `key`, keeping its position if already present.
    pub fn insert(&mut self, key: K, rate: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = rate,
            None => self.entries.push((key, rate)),
        }
    }

    /// Raise every entry to at least the matching entry of `other`.
    pub fn merge_max(&mut self, other: &RateMap<K>)
    where
        K: Clone,
    {
        for (key, rate) in &other.entries {
            match self.entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => *existing = existing.max(*rate),
                None => self.entries.push((key.clone(), *rate)),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.entries.iter().map(|(k, rate)| (k, *rate))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop exact zeros and order entries by `position` (stable).
    fn finish(&mut self, position: impl Fn(&K) -> usize) {
        self.entries.retain(|(_, rate)| *rate != 0.0);
        self.entries.sort_by_key(|(k, _)| position(k));
    }
}

impl<K: PartialEq> FromIterator<(K, f64)> for RateMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, rate) in iter {
            map.insert(key, rate);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Per-entity rates of one analysis (or the envelope of several).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rates {
    /// Total outgoing flow per source.
    pub sources: RateMap<NodeId>,
    /// Inflow per buffer line.
    pub buffers: RateMap<BufferLine>,
    /// Throughput per station group, in group units.
    pub stations: RateMap<NodeId>,
    /// Drained flow per waste point.
    pub wastes: RateMap<NodeId>,
}

impl Rates {
    /// Key-wise maximum with `other`.
    pub fn merge_max(&mut self, other: &Rates) {
        self.sources.merge_max(&other.sources);
        self.buffers.merge_max(&other.buffers);
        self.stations.merge_max(&other.stations);
        self.wastes.merge_max(&other.wastes);
    }

    /// Drop zero entries and sort everything into network insertion order.
    pub(crate) fn finish(&mut self, network: &Network) {
        let position = |id: &NodeId| network.position(*id).unwrap_or(usize::MAX);
        self.sources.finish(position);
        self.buffers.finish(|line| position(&line.buffer));
        self.stations.finish(position);
        self.wastes.finish(position);
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The outcome of analysing one output point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleResult {
    /// Maximum sustainable extraction rate; infinite when nothing limits it.
    pub rate: f64,
    pub rates: Rates,
    /// `(rate while binding, constraint)`, most restrictive first.
    pub bottlenecks: Vec<(f64, Bottleneck)>,
    /// Rate reached once every constraint in `bottlenecks` is removed.
    /// Infinite unless the chain stopped with nothing binding.
    pub residual_rate: f64,
}

impl SingleResult {
    pub fn is_unbounded(&self) -> bool {
        self.rate.is_infinite()
    }

    /// The constraint limiting the current rate, if any.
    pub fn limiting(&self) -> Option<&Bottleneck> {
        self.bottlenecks.first().map(|(_, b)| b)
    }

    /// Source flow needed per unit of output. Empty for zero or infinite
    /// output rates.
    pub fn source_costs(&self) -> Vec<(NodeId, f64)> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Vec::new();
        }
        self.rates
            .sources
            .iter()
            .map(|(&source, rate)| (source, rate / self.rate))
            .collect()
    }
}

/// The outcome of analysing every registered output point, one at a time.
///
/// `rates` is the key-wise maximum over all single results: the capacity
/// needed to serve each output point on its own, not a jointly feasible
/// operating point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub rates: Rates,
    pub singles: Vec<(OutputPoint, SingleResult)>,
}

impl AggregateResult {
    /// The single result for `point`, if it was analysed.
    pub fn single(&self, point: &OutputPoint) -> Option<&SingleResult> {
        self.singles
            .iter()
            .find(|(p, _)| p == point)
            .map(|(_, result)| result)
    }
}
