use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node (source, buffer, station group or waste point) in a
    /// production network.
    pub struct NodeId;
}

/// A buffer line: one material flowing through one buffer node.
///
/// Buffers are material-agnostic containers, so most per-buffer quantities
/// (throughput, caps, mass balance) are tracked per line rather than per node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferLine {
    pub buffer: NodeId,
    pub material: String,
}

impl BufferLine {
    pub fn new(buffer: NodeId, material: impl Into<String>) -> Self {
        Self {
            buffer,
            material: material.into(),
        }
    }
}
