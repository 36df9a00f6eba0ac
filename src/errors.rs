//! Error types for scene ingestion and graph operations
//!
//! Every variant carries a stable diagnostic code so hosts can match on it
//! without parsing the message.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by ingestion, attachment and graph mutation.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum GraphError {
    // ========================================================================
    // Malformed input
    // ========================================================================
    #[error("unsupported format version: {found}")]
    #[diagnostic(
        code(vanishing::ingest::unsupported_version),
        help("this engine reads version {supported}")
    )]
    UnsupportedVersion {
        found: String,
        supported: &'static str,
    },

    #[error("node `{node}` is missing field `{field}`")]
    #[diagnostic(code(vanishing::ingest::missing_field))]
    MissingField { node: String, field: &'static str },

    #[error("node `{node}` field `{field}` has {len} components")]
    #[diagnostic(
        code(vanishing::ingest::bad_vector),
        help("positions take 2 components; directions and rotations take 3 or 4")
    )]
    BadVector {
        node: String,
        field: &'static str,
        len: usize,
    },

    #[error("unknown node type `{kind}` on node `{node}`")]
    #[diagnostic(
        code(vanishing::ingest::unknown_node_type),
        help("expected one of VP, RectilinearProjection, CurvilinearPerspective, Group, Plane, Space")
    )]
    UnknownNodeType { node: String, kind: String },

    #[error("unknown edge type `{kind}` between `{src}` and `{dst}`")]
    #[diagnostic(
        code(vanishing::ingest::unknown_edge_type),
        help("expected one of CHILD, PARENT, VIEW, COMPUTE, COMPUTE_SRC")
    )]
    UnknownEdgeType {
        kind: String,
        src: String,
        dst: String,
    },

    #[error("unknown vanishing point role `{role}` on node `{node}`")]
    #[diagnostic(
        code(vanishing::ingest::unknown_role),
        help("expected NORMAL or SPACE")
    )]
    UnknownRole { node: String, role: String },

    #[error("node id `{id}` appears more than once")]
    #[diagnostic(code(vanishing::ingest::duplicate_id))]
    DuplicateId { id: String },

    #[error("reference to unknown node `{id}`")]
    #[diagnostic(code(vanishing::ingest::unresolved_node))]
    UnresolvedNode { id: String },

    #[error("VIEW edge from `{src}` targets `{dst}`, which is not a projection")]
    #[diagnostic(code(vanishing::ingest::not_a_view))]
    NotAView { src: String, dst: String },

    #[error("node `{node}` is the target of more than one CHILD edge")]
    #[diagnostic(
        code(vanishing::ingest::duplicate_parent),
        help("every node except the root has exactly one parent")
    )]
    DuplicateParent { node: String },

    #[error("CHILD edges around node `{node}` form a cycle")]
    #[diagnostic(code(vanishing::ingest::parent_cycle))]
    ParentCycle { node: String },

    // ========================================================================
    // Unsupported operations
    // ========================================================================
    #[error("unknown compute function `{name}`")]
    #[diagnostic(
        code(vanishing::compute::unknown_function),
        help("known functions: plane, compute_mirrored_points, compute_measure_points, compute_measure_points_2, cross_product, 2d_direction, 2d_direction_90, horizon_1, space_2p_rect")
    )]
    UnknownComputeFunction { name: String },

    #[error("compute function `{function}` expects {expected} at source {index} of node {uid}")]
    #[diagnostic(code(vanishing::compute::source_kind))]
    ComputeSourceKind {
        function: &'static str,
        uid: u32,
        index: usize,
        expected: &'static str,
    },

    #[error("compute function `{function}` cannot write to node {uid}, which is not {expected}")]
    #[diagnostic(code(vanishing::compute::target_kind))]
    ComputeTargetKind {
        function: &'static str,
        uid: u32,
        expected: &'static str,
    },

    #[error("compute function `{function}` on node {uid} needs a parameter")]
    #[diagnostic(code(vanishing::compute::missing_param))]
    MissingComputeParam { function: &'static str, uid: u32 },

    #[error("node {uid} is not a vanishing point")]
    #[diagnostic(code(vanishing::graph::not_a_point))]
    NotAPoint { uid: u32 },

    #[error("node {uid} has no view")]
    #[diagnostic(
        code(vanishing::graph::missing_view),
        help("attach the node below a projection or add a VIEW edge")
    )]
    MissingView { uid: u32 },

    #[error("no insertion target: nothing is chosen and the graph has no main view")]
    #[diagnostic(code(vanishing::graph::no_insertion_target))]
    NoInsertionTarget,

    #[error("node {uid} cannot be attached below its own descendant")]
    #[diagnostic(
        code(vanishing::graph::attach_cycle),
        help("choose an insertion point outside the subtree being attached")
    )]
    AttachCycle { uid: u32 },

    #[error("node handle {index} does not belong to this graph")]
    #[diagnostic(code(vanishing::graph::invalid_node))]
    InvalidNode { index: usize },

    // ========================================================================
    // Invariant violations
    // ========================================================================
    #[error("compute cascade exceeded {steps} steps")]
    #[diagnostic(
        code(vanishing::cascade::budget_exceeded),
        help("the COMPUTE edges most likely form a cycle")
    )]
    CascadeBudgetExceeded { steps: usize },
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
