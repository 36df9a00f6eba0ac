//! Strongly-typed handles and tags shared across the graph.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Stable handle into a [`SceneGraph`](crate::SceneGraph) arena.
///
/// Handles stay valid for the graph's lifetime, including after the node is
/// removed from the tree; only [`SceneGraph::clear`](crate::SceneGraph::clear)
/// invalidates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of node uids.
///
/// Increments atomically so nodes may be built from several threads, but each
/// graph owns its own allocator: two scenes in one process do not share ids.
#[derive(Debug, Default)]
pub struct UidAllocator {
    last: AtomicU32,
}

impl UidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next uid; the first one handed out is 1.
    pub fn next_uid(&self) -> u32 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Role of a vanishing point inside its space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VpRole {
    #[default]
    Normal,
    /// Moving the point reorients the enclosing space.
    SpaceKey,
}

impl VpRole {
    pub fn as_str(self) -> &'static str {
        match self {
            VpRole::Normal => "NORMAL",
            VpRole::SpaceKey => "SPACE",
        }
    }
}

impl FromStr for VpRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(VpRole::Normal),
            "SPACE" => Ok(VpRole::SpaceKey),
            _ => Err(()),
        }
    }
}

/// Typed edge stored in a node's relation list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Upward, non-owning pointer to the containing node.
    Parent,
    /// Projection the node is displayed through.
    View,
    /// "I feed this node."
    Compute,
    /// "I am fed by this node."
    ComputeSrc,
}

impl Relation {
    /// The other half of a compute pair.
    pub fn mirror(self) -> Option<Relation> {
        match self {
            Relation::Compute => Some(Relation::ComputeSrc),
            Relation::ComputeSrc => Some(Relation::Compute),
            Relation::Parent | Relation::View => None,
        }
    }
}

impl From<Relation> for EdgeKind {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::Parent => EdgeKind::Parent,
            Relation::View => EdgeKind::View,
            Relation::Compute => EdgeKind::Compute,
            Relation::ComputeSrc => EdgeKind::ComputeSrc,
        }
    }
}

/// Edge type tag of the exchange format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    #[default]
    Child,
    Parent,
    View,
    Compute,
    ComputeSrc,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Child => "CHILD",
            EdgeKind::Parent => "PARENT",
            EdgeKind::View => "VIEW",
            EdgeKind::Compute => "COMPUTE",
            EdgeKind::ComputeSrc => "COMPUTE_SRC",
        }
    }
}

impl FromStr for EdgeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHILD" => Ok(EdgeKind::Child),
            "PARENT" => Ok(EdgeKind::Parent),
            "VIEW" => Ok(EdgeKind::View),
            "COMPUTE" => Ok(EdgeKind::Compute),
            "COMPUTE_SRC" => Ok(EdgeKind::ComputeSrc),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
