//! Scene nodes: a geometric payload plus flags and typed relations

use crate::projection::Projection;
use crate::scene::compute::ComputeFn;
use crate::scene::payload::{Plane, PerspectiveGroup, PerspectiveSpace, VanishingPoint};
use crate::types::{NodeId, Relation, VpRole};

/// Geometric payload of a node, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Space(PerspectiveSpace),
    Plane(Plane),
    VanishingPoint(VanishingPoint),
    Projection(Projection),
    Group(PerspectiveGroup),
}

impl NodeKind {
    /// Exchange type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Space(_) => "Space",
            NodeKind::Plane(_) => "Plane",
            NodeKind::VanishingPoint(_) => "VP",
            NodeKind::Projection(projection) => projection.type_name(),
            NodeKind::Group(_) => "Group",
        }
    }

    /// Whether nodes of this kind are shown as UI entries unless told otherwise.
    fn default_ui(&self) -> bool {
        matches!(self, NodeKind::VanishingPoint(_) | NodeKind::Group(_))
    }
}

impl From<VanishingPoint> for NodeKind {
    fn from(vp: VanishingPoint) -> Self {
        NodeKind::VanishingPoint(vp)
    }
}

impl From<PerspectiveSpace> for NodeKind {
    fn from(space: PerspectiveSpace) -> Self {
        NodeKind::Space(space)
    }
}

impl From<Plane> for NodeKind {
    fn from(plane: Plane) -> Self {
        NodeKind::Plane(plane)
    }
}

impl From<Projection> for NodeKind {
    fn from(projection: Projection) -> Self {
        NodeKind::Projection(projection)
    }
}

impl From<PerspectiveGroup> for NodeKind {
    fn from(group: PerspectiveGroup) -> Self {
        NodeKind::Group(group)
    }
}

/// One entry of a node's relation list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationItem {
    pub node: NodeId,
    pub relation: Relation,
}

/// A scene node.
///
/// Containment lives in two places: the ordered `children` list on the parent
/// and a single [`Relation::Parent`] entry on the child. Relations are
/// non-owning handles into the same [`SceneGraph`](crate::SceneGraph) arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    uid: u32,
    pub name: String,
    enabled: bool,
    locked: bool,
    parent_enabled: bool,
    parent_locked: bool,
    /// Only meaningful for vanishing points.
    pub role: VpRole,
    /// RGBA, only meaningful for vanishing points.
    pub color: i64,
    is_ui: bool,
    kind: NodeKind,
    relations: Vec<RelationItem>,
    children: Vec<NodeId>,
    compute: Option<ComputeFn>,
    compute_params: Vec<f64>,
    is_compute: bool,
}

impl Node {
    pub fn new(uid: u32, name: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        let kind = kind.into();
        Self {
            uid,
            name: name.into(),
            enabled: true,
            locked: false,
            parent_enabled: true,
            parent_locked: false,
            role: VpRole::Normal,
            color: 0,
            is_ui: kind.default_ui(),
            kind,
            relations: Vec::new(),
            children: Vec::new(),
            compute: None,
            compute_params: Vec::new(),
            is_compute: false,
        }
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable payload access. The variant itself is never replaced.
    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    // ------------------------------------------------------------------------
    // Payload accessors
    // ------------------------------------------------------------------------

    pub fn as_point(&self) -> Option<&VanishingPoint> {
        match &self.kind {
            NodeKind::VanishingPoint(vp) => Some(vp),
            _ => None,
        }
    }

    pub fn as_point_mut(&mut self) -> Option<&mut VanishingPoint> {
        match &mut self.kind {
            NodeKind::VanishingPoint(vp) => Some(vp),
            _ => None,
        }
    }

    pub fn as_space(&self) -> Option<&PerspectiveSpace> {
        match &self.kind {
            NodeKind::Space(space) => Some(space),
            _ => None,
        }
    }

    pub fn as_space_mut(&mut self) -> Option<&mut PerspectiveSpace> {
        match &mut self.kind {
            NodeKind::Space(space) => Some(space),
            _ => None,
        }
    }

    pub fn as_plane(&self) -> Option<&Plane> {
        match &self.kind {
            NodeKind::Plane(plane) => Some(plane),
            _ => None,
        }
    }

    pub fn as_plane_mut(&mut self) -> Option<&mut Plane> {
        match &mut self.kind {
            NodeKind::Plane(plane) => Some(plane),
            _ => None,
        }
    }

    pub fn as_projection(&self) -> Option<&Projection> {
        match &self.kind {
            NodeKind::Projection(projection) => Some(projection),
            _ => None,
        }
    }

    pub fn as_projection_mut(&mut self) -> Option<&mut Projection> {
        match &mut self.kind {
            NodeKind::Projection(projection) => Some(projection),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Classifiers
    // ------------------------------------------------------------------------

    pub fn is_point(&self) -> bool {
        matches!(self.kind, NodeKind::VanishingPoint(_))
    }

    pub fn is_vanishing_point(&self) -> bool {
        self.is_point()
    }

    pub fn is_view(&self) -> bool {
        matches!(self.kind, NodeKind::Projection(_))
    }

    pub fn is_projection(&self) -> bool {
        self.is_view()
    }

    pub fn is_space(&self) -> bool {
        matches!(self.kind, NodeKind::Space(_))
    }

    pub fn is_plane(&self) -> bool {
        matches!(self.kind, NodeKind::Plane(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// Views, spaces and groups hold children.
    pub fn is_grouping(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Projection(_) | NodeKind::Space(_) | NodeKind::Group(_)
        )
    }

    /// Groups are transparent to geometry.
    pub fn is_ui_only(&self) -> bool {
        self.is_group()
    }

    pub fn is_ui(&self) -> bool {
        self.is_ui
    }

    pub fn set_ui(&mut self, value: bool) {
        self.is_ui = value;
    }

    /// A vanishing point whose movement reorients its space.
    pub fn is_key(&self) -> bool {
        self.is_point() && self.role == VpRole::SpaceKey
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn parent_enabled(&self) -> bool {
        self.parent_enabled
    }

    pub fn parent_locked(&self) -> bool {
        self.parent_locked
    }

    /// Enabled itself and through every ancestor.
    pub fn is_visible(&self) -> bool {
        self.enabled && self.parent_enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub(crate) fn set_inherited(&mut self, parent_enabled: bool, parent_locked: bool) {
        self.parent_enabled = parent_enabled;
        self.parent_locked = parent_locked;
    }

    // ------------------------------------------------------------------------
    // Compute binding
    // ------------------------------------------------------------------------

    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    pub(crate) fn set_compute(&mut self, is_compute: bool) {
        self.is_compute = is_compute;
    }

    pub fn compute_fn(&self) -> Option<ComputeFn> {
        self.compute
    }

    pub(crate) fn bind_compute(&mut self, function: ComputeFn) {
        self.compute = Some(function);
    }

    pub fn compute_params(&self) -> &[f64] {
        &self.compute_params
    }

    pub(crate) fn set_compute_params(&mut self, params: Vec<f64>) {
        self.compute_params = params;
    }

    // ------------------------------------------------------------------------
    // Relations and children
    // ------------------------------------------------------------------------

    pub fn relations(&self) -> &[RelationItem] {
        &self.relations
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn first(&self, relation: Relation) -> Option<NodeId> {
        self.relations
            .iter()
            .find(|item| item.relation == relation)
            .map(|item| item.node)
    }

    fn all(&self, relation: Relation) -> Vec<NodeId> {
        self.relations
            .iter()
            .filter(|item| item.relation == relation)
            .map(|item| item.node)
            .collect()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.first(Relation::Parent)
    }

    pub fn view(&self) -> Option<NodeId> {
        self.first(Relation::View)
    }

    /// Nodes this one feeds.
    pub fn compute_children(&self) -> Vec<NodeId> {
        self.all(Relation::Compute)
    }

    /// Nodes this one is fed by, in edge order.
    pub fn compute_sources(&self) -> Vec<NodeId> {
        self.all(Relation::ComputeSrc)
    }

    pub fn has_relative(&self, node: NodeId, relation: Relation) -> bool {
        self.relations
            .iter()
            .any(|item| item.node == node && item.relation == relation)
    }

    pub(crate) fn add_relative(&mut self, node: NodeId, relation: Relation) {
        self.relations.push(RelationItem { node, relation });
    }

    /// Replace the parent pointer.
    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.relations.retain(|item| item.relation != Relation::Parent);
        self.add_relative(parent, Relation::Parent);
    }

    pub(crate) fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        if let Some(index) = self.children.iter().position(|&c| c == child) {
            self.children.remove(index);
        }
    }

    /// Drop every relation of type `relation` targeting `node`.
    pub(crate) fn remove_relation(&mut self, node: NodeId, relation: Relation) {
        self.relations
            .retain(|item| !(item.node == node && item.relation == relation));
    }

    /// Drop every non-parent relation targeting `node`; returns how many went.
    pub(crate) fn scrub_references_to(&mut self, node: NodeId) -> usize {
        let before = self.relations.len();
        self.relations
            .retain(|item| item.node != node || item.relation == Relation::Parent);
        before - self.relations.len()
    }

    /// Remove all COMPUTE_SRC entries, returning the sources they named.
    pub(crate) fn take_compute_sources(&mut self) -> Vec<NodeId> {
        let sources = self.compute_sources();
        self.relations
            .retain(|item| item.relation != Relation::ComputeSrc);
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec3;
    use crate::projection::RectilinearProjection;
    use glam::dvec2;

    fn point(uid: u32) -> Node {
        Node::new(uid, "p", VanishingPoint::from_direction(vec3(0.0, 0.0, 1.0)))
    }

    #[test]
    fn classifiers_follow_kind() {
        let vp = point(1);
        assert!(vp.is_point() && vp.is_ui() && !vp.is_grouping());

        let view: Projection =
            RectilinearProjection::new(dvec2(-1.0, 0.0), dvec2(1.0, 0.0)).into();
        let view = Node::new(2, "v", view);
        assert!(view.is_view() && view.is_grouping() && !view.is_ui());

        let space = Node::new(3, "s", PerspectiveSpace::default());
        assert!(space.is_space() && space.is_grouping() && !space.is_ui_only());

        let group = Node::new(4, "g", PerspectiveGroup);
        assert!(group.is_group() && group.is_ui_only() && group.is_ui());

        let plane = Node::new(5, "h", Plane::default());
        assert!(plane.is_plane() && !plane.is_grouping() && !plane.is_ui());
        assert_eq!(plane.kind().type_name(), "Plane");
    }

    #[test]
    fn key_requires_point_and_role() {
        let mut vp = point(1);
        assert!(!vp.is_key());
        vp.role = VpRole::SpaceKey;
        assert!(vp.is_key());

        let mut space = Node::new(2, "s", PerspectiveSpace::default());
        space.role = VpRole::SpaceKey;
        assert!(!space.is_key());
    }

    #[test]
    fn set_parent_replaces() {
        let mut vp = point(1);
        vp.set_parent(NodeId(3));
        vp.add_relative(NodeId(4), Relation::View);
        vp.set_parent(NodeId(7));
        assert_eq!(vp.parent(), Some(NodeId(7)));
        assert_eq!(vp.view(), Some(NodeId(4)));
        assert_eq!(vp.relations().len(), 2);
    }

    #[test]
    fn compute_relations() {
        let mut vp = point(1);
        vp.add_relative(NodeId(2), Relation::ComputeSrc);
        vp.add_relative(NodeId(3), Relation::Compute);
        vp.add_relative(NodeId(4), Relation::ComputeSrc);
        assert_eq!(vp.compute_sources(), vec![NodeId(2), NodeId(4)]);
        assert_eq!(vp.compute_children(), vec![NodeId(3)]);
        assert_eq!(vp.take_compute_sources(), vec![NodeId(2), NodeId(4)]);
        assert!(vp.compute_sources().is_empty());
        assert_eq!(vp.compute_children(), vec![NodeId(3)]);
    }

    #[test]
    fn scrub_keeps_parent() {
        let mut vp = point(1);
        vp.set_parent(NodeId(9));
        vp.add_relative(NodeId(9), Relation::View);
        vp.add_relative(NodeId(9), Relation::ComputeSrc);
        vp.add_relative(NodeId(8), Relation::ComputeSrc);
        assert_eq!(vp.scrub_references_to(NodeId(9)), 2);
        assert_eq!(vp.parent(), Some(NodeId(9)));
        assert_eq!(vp.compute_sources(), vec![NodeId(8)]);
    }

    #[test]
    fn children_keep_order() {
        let mut group = Node::new(1, "g", PerspectiveGroup);
        for i in 2..6 {
            group.add_child(NodeId(i));
        }
        group.remove_child(NodeId(3));
        group.remove_child(NodeId(42));
        assert_eq!(group.children(), &[NodeId(2), NodeId(4), NodeId(5)]);
    }
}
