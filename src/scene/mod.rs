//! Scene graph: node arena, indexes, traversal and queries
//!
//! This module is organized into submodules:
//! - `payload`: geometry carried by nodes
//! - `node`: the node type and its relation list
//! - `compute`: named compute functions
//! - `cascade`: group updates, drags and the compute cascade
//! - `attach`: inserting ingested subtrees into the scene

mod attach;
mod cascade;
pub mod compute;
pub mod node;
pub mod payload;

use std::collections::HashMap;

use glam::{DQuat, DVec2};

use crate::defaults::{GraphConfig, ROOT_NAME};
use crate::errors::{GraphError, Result};
use crate::geometry::vector_to_angle;
use crate::log::debug;
use crate::projection::{HorizonLine, PerspectiveLine, Project};
use crate::types::{NodeId, UidAllocator};

pub use compute::{ComputeFn, ComputeInput, ComputeOutput};
pub use node::{Node, NodeKind, RelationItem};
pub use payload::{PerspectiveGroup, PerspectiveSpace, Plane, VanishingPoint};

/// Labelled list of node uids, carried through ingest and export untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisualizationData {
    pub label: String,
    pub nodes: Vec<u32>,
}

/// Owner of every node in a scene.
///
/// Nodes live in an arena addressed by [`NodeId`]; the root, the main view, the
/// insertion point and both indexes are handles into it. A synthetic root group
/// exists from construction so the graph is never empty of nodes.
#[derive(Debug)]
pub struct SceneGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) uids: UidAllocator,
    pub(crate) config: GraphConfig,
    pub(crate) root: NodeId,
    pub(crate) main_view: Option<NodeId>,
    pub(crate) chosen_point: Option<NodeId>,
    pub(crate) by_uid: HashMap<u32, NodeId>,
    pub(crate) by_tag: HashMap<String, NodeId>,
    pub(crate) visualizations: Vec<VisualizationData>,
    pub(crate) is_empty: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            uids: UidAllocator::new(),
            config,
            root: NodeId(0),
            main_view: None,
            chosen_point: None,
            by_uid: HashMap::new(),
            by_tag: HashMap::new(),
            visualizations: Vec::new(),
            is_empty: true,
        };
        graph.create_root();
        graph
    }

    fn create_root(&mut self) {
        let root = Node::new(self.uids.next_uid(), ROOT_NAME, PerspectiveGroup);
        self.root = self.push_node(root);
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.by_uid.insert(node.uid(), id);
        self.nodes.push(node);
        id
    }

    /// Drop every node and start over with a fresh root.
    ///
    /// Uids keep counting; handles from before the call are invalid.
    pub fn clear(&mut self) {
        self.reset();
        self.create_root();
    }

    /// Empty the arena and indexes without creating a root.
    pub(crate) fn reset(&mut self) {
        debug!(nodes = self.nodes.len(), "clearing scene graph");
        self.nodes.clear();
        self.by_uid.clear();
        self.by_tag.clear();
        self.visualizations.clear();
        self.main_view = None;
        self.chosen_point = None;
        self.is_empty = true;
    }

    /// True until something has been ingested.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn main_view(&self) -> Option<NodeId> {
        self.main_view
    }

    pub fn chosen_point(&self) -> Option<NodeId> {
        self.chosen_point
    }

    /// Set the insertion point used by [`SceneGraph::connect_sub_graph`].
    pub fn set_chosen_point(&mut self, node: Option<NodeId>) -> Result<()> {
        if let Some(id) = node {
            self.check(id)?;
        }
        self.chosen_point = node;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::InvalidNode { index: id.0 })
        }
    }

    pub fn get_visualizations(&self) -> &[VisualizationData] {
        &self.visualizations
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get_by_uid(&self, uid: u32) -> Option<NodeId> {
        self.by_uid.get(&uid).copied()
    }

    pub fn get_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.by_tag.get(tag).copied()
    }

    /// Detach a node from the scene.
    ///
    /// The node leaves its parent's child list and both indexes, and every
    /// view or compute relation naming it is dropped. Its descendants stay in
    /// the arena but are no longer reachable from the root. Returns the node
    /// when it had a parent to be detached from.
    pub fn remove_by_uid(&mut self, uid: u32) -> Option<NodeId> {
        let id = self.by_uid.remove(&uid)?;
        self.by_tag.retain(|_, node| *node != id);

        for node in &mut self.nodes {
            node.scrub_references_to(id);
        }
        if self.chosen_point == Some(id) {
            self.chosen_point = None;
        }
        if self.main_view == Some(id) {
            self.main_view = None;
        }
        debug!(uid, "removed node");

        let parent = self.nodes[id.0].parent()?;
        self.nodes[parent.0].remove_child(id);
        Some(id)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first walk from `start`, children in order, reporting each node
    /// with its parent (`None` for `start`). Visits nothing when `start` is
    /// not a node of this graph.
    pub fn traverse(&self, start: NodeId, mut visit: impl FnMut(NodeId, Option<NodeId>)) {
        if self.nodes.get(start.0).is_none() {
            return;
        }
        let mut stack = vec![(start, None)];
        while let Some((id, parent)) = stack.pop() {
            visit(id, parent);
            for &child in self.nodes[id.0].children().iter().rev() {
                stack.push((child, Some(id)));
            }
        }
    }

    pub fn get_all_nodes(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.traverse(start, |id, _| result.push(id));
        result
    }

    /// Every vanishing point in the subtree.
    pub fn get_points(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.traverse(start, |id, _| {
            if self.nodes[id.0].is_point() {
                result.push(id);
            }
        });
        result
    }

    /// Vanishing points under the root, skipping disabled subtrees and, when
    /// `skip_locked` is set, locked ones.
    pub fn get_all_enabled_points(&self, skip_locked: bool) -> Vec<NodeId> {
        let mut stack = vec![self.root];
        let mut result = Vec::new();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.enabled() || (skip_locked && node.locked()) {
                continue;
            }
            if node.is_point() {
                result.push(id);
            }
            stack.extend(node.children().iter().rev());
        }
        result
    }

    /// Descendants with UI-only groups collapsed away.
    pub fn get_logic_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut groups = vec![node];
        let mut result = Vec::new();
        while let Some(group) = groups.pop() {
            let Some(group) = self.nodes.get(group.0) else {
                continue;
            };
            for &child in group.children() {
                if self.nodes[child.0].is_ui_only() {
                    groups.push(child);
                } else {
                    result.push(child);
                }
            }
        }
        result
    }

    fn find_ancestor(&self, node: NodeId, matches: impl Fn(&Node) -> bool) -> Option<NodeId> {
        let mut current = self.nodes.get(node.0)?.parent();
        while let Some(id) = current {
            let ancestor = &self.nodes[id.0];
            if matches(ancestor) {
                return Some(id);
            }
            current = ancestor.parent();
        }
        None
    }

    /// True when `node` is `ancestor` or sits somewhere below it.
    pub(crate) fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        for _ in 0..=self.nodes.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.nodes.get(id.0).and_then(Node::parent),
                None => return false,
            }
        }
        false
    }

    pub fn find_parent_space(&self, node: NodeId) -> Option<NodeId> {
        self.find_ancestor(node, Node::is_space)
    }

    pub fn find_parent_view(&self, node: NodeId) -> Option<NodeId> {
        self.find_ancestor(node, Node::is_view)
    }

    pub fn find_ui_parent(&self, node: NodeId) -> Option<NodeId> {
        self.find_ancestor(node, Node::is_ui)
    }

    // ========================================================================
    // Flags
    // ========================================================================

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.check(id)?;
        self.nodes[id.0].set_enabled(enabled);
        self.refresh_inherited_flags(id);
        Ok(())
    }

    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> Result<()> {
        self.check(id)?;
        self.nodes[id.0].set_locked(locked);
        self.refresh_inherited_flags(id);
        Ok(())
    }

    pub fn toggle(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        let enabled = self.nodes[id.0].enabled();
        self.set_enabled(id, !enabled)
    }

    pub fn toggle_lock(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        let locked = self.nodes[id.0].locked();
        self.set_locked(id, !locked)
    }

    /// Recompute `parent_enabled` and `parent_locked` below `start`.
    pub(crate) fn refresh_inherited_flags(&mut self, start: NodeId) {
        let mut pairs = Vec::new();
        self.traverse(start, |id, parent| pairs.push((id, parent)));
        // `start` itself inherits from its real parent, not from the walk.
        if let Some(first) = pairs.first_mut() {
            first.1 = self.nodes[start.0].parent();
        }
        for (id, parent) in pairs {
            let Some(parent) = parent else { continue };
            let parent = &self.nodes[parent.0];
            let enabled = parent.enabled() && parent.parent_enabled();
            let locked = parent.locked() || parent.parent_locked();
            self.nodes[id.0].set_inherited(enabled, locked);
        }
    }

    // ========================================================================
    // Geometry queries
    // ========================================================================

    /// Perspective line through `origin` toward the vanishing point, drawn in
    /// the point's view.
    pub fn line(&self, vp: NodeId, origin: DVec2) -> Result<PerspectiveLine> {
        self.check(vp)?;
        let node = &self.nodes[vp.0];
        let point = node.as_point().ok_or(GraphError::NotAPoint { uid: node.uid() })?;
        let projection = node
            .view()
            .and_then(|view| self.nodes[view.0].as_projection())
            .ok_or(GraphError::MissingView { uid: node.uid() })?;
        Ok(projection.line(point, origin))
    }

    /// Horizon of a rectilinear view for the given up direction.
    pub fn horizon_line(&self, view: NodeId, up: DQuat) -> Option<HorizonLine> {
        self.node(view)?.as_projection()?.horizon_line(up)
    }

    /// Yaw and pitch of a vanishing point, in radians.
    pub fn angles(&self, vp: NodeId) -> Option<(f64, f64)> {
        let point = self.node(vp)?.as_point()?;
        Some(vector_to_angle(point.direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec3;
    use crate::projection::RectilinearProjection;
    use crate::types::Relation;
    use glam::dvec2;

    /// root > view > [a, group > [b, c]]
    fn small_graph() -> (SceneGraph, [NodeId; 5]) {
        let mut graph = SceneGraph::new();
        let projection: crate::projection::Projection =
            RectilinearProjection::new(dvec2(-100.0, 0.0), dvec2(100.0, 0.0)).into();
        let view = graph.add_test_node("view", projection, graph.root());
        let a = graph.add_test_node(
            "a",
            VanishingPoint::from_direction(vec3(1.0, 0.0, 1.0)),
            view,
        );
        let group = graph.add_test_node("group", PerspectiveGroup, view);
        let b = graph.add_test_node(
            "b",
            VanishingPoint::from_direction(vec3(-1.0, 0.0, 1.0)),
            group,
        );
        let c = graph.add_test_node("c", Plane::default(), group);
        for id in [a, b, c] {
            graph.nodes[id.0].add_relative(view, Relation::View);
        }
        graph.main_view = Some(view);
        (graph, [view, a, group, b, c])
    }

    impl SceneGraph {
        fn add_test_node(&mut self, name: &str, kind: impl Into<NodeKind>, parent: NodeId) -> NodeId {
            let node = Node::new(self.uids.next_uid(), name, kind);
            let id = self.push_node(node);
            self.nodes[parent.0].add_child(id);
            self.nodes[id.0].set_parent(parent);
            id
        }
    }

    #[test]
    fn new_graph_has_root_group() {
        let graph = SceneGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 1);
        let root = graph.node(graph.root()).unwrap();
        assert!(root.is_group());
        assert_eq!(root.name, "root");
        assert_eq!(graph.main_view(), None);
    }

    #[test]
    fn clear_keeps_counting_uids() {
        let (mut graph, _) = small_graph();
        let before = graph.node(graph.root()).unwrap().uid();
        graph.clear();
        assert_eq!(graph.len(), 1);
        assert!(graph.node(graph.root()).unwrap().uid() > before);
        assert_eq!(graph.main_view(), None);
    }

    #[test]
    fn traversal_is_preorder() {
        let (graph, [view, a, group, b, c]) = small_graph();
        let mut visited = Vec::new();
        graph.traverse(graph.root(), |id, parent| visited.push((id, parent)));
        assert_eq!(
            visited,
            vec![
                (graph.root(), None),
                (view, Some(graph.root())),
                (a, Some(view)),
                (group, Some(view)),
                (b, Some(group)),
                (c, Some(group)),
            ]
        );
        assert_eq!(graph.get_points(graph.root()), vec![a, b]);
        assert_eq!(graph.get_all_nodes(group), vec![group, b, c]);
    }

    #[test]
    fn logic_children_collapse_groups() {
        let (graph, [view, a, _, b, c]) = small_graph();
        let mut children = graph.get_logic_children(view);
        children.sort();
        assert_eq!(children, vec![a, b, c]);
    }

    #[test]
    fn ancestors() {
        let (graph, [view, _, group, b, _]) = small_graph();
        assert_eq!(graph.find_parent_view(b), Some(view));
        assert_eq!(graph.find_parent_space(b), None);
        assert_eq!(graph.find_ui_parent(b), Some(group));
        assert_eq!(graph.find_parent_view(graph.root()), None);
    }

    #[test]
    fn disabled_and_locked_subtrees() {
        let (mut graph, [_, a, group, b, _]) = small_graph();
        assert_eq!(graph.get_all_enabled_points(false), vec![a, b]);

        graph.toggle_lock(group).unwrap();
        assert_eq!(graph.get_all_enabled_points(false), vec![a, b]);
        assert_eq!(graph.get_all_enabled_points(true), vec![a]);
        assert!(graph.node(b).unwrap().parent_locked());

        graph.toggle(group).unwrap();
        assert_eq!(graph.get_all_enabled_points(false), vec![a]);
        assert!(!graph.node(b).unwrap().parent_enabled());
        assert!(!graph.node(b).unwrap().is_visible());

        graph.set_enabled(group, true).unwrap();
        graph.set_locked(group, false).unwrap();
        let b = graph.node(b).unwrap();
        assert!(b.parent_enabled() && !b.parent_locked());
    }

    #[test]
    fn inherited_flags_reach_grandchildren() {
        let (mut graph, [view, _, _, b, _]) = small_graph();
        graph.set_enabled(view, false).unwrap();
        assert!(!graph.node(b).unwrap().parent_enabled());
        graph.toggle(view).unwrap();
        assert!(graph.node(b).unwrap().parent_enabled());
    }

    #[test]
    fn remove_scrubs_relations() {
        let (mut graph, [view, a, _, b, c]) = small_graph();
        graph.nodes[a.0].add_relative(b, Relation::Compute);
        graph.nodes[b.0].add_relative(a, Relation::ComputeSrc);
        graph.by_tag.insert("first".into(), a);
        graph.chosen_point = Some(a);

        let uid = graph.node(a).unwrap().uid();
        assert_eq!(graph.remove_by_uid(uid), Some(a));
        assert_eq!(graph.get_by_uid(uid), None);
        assert_eq!(graph.get_by_tag("first"), None);
        assert_eq!(graph.chosen_point(), None);
        assert!(!graph.node(view).unwrap().children().contains(&a));
        for node in &graph.nodes {
            assert!(node.relations().iter().all(|item| item.node != a));
        }
        assert_eq!(graph.get_points(graph.root()), vec![b]);
        assert_eq!(graph.node(c).unwrap().view(), Some(view));

        assert_eq!(graph.remove_by_uid(uid), None);
    }

    #[test]
    fn remove_view_clears_main_view() {
        let (mut graph, [view, a, _, _, _]) = small_graph();
        let uid = graph.node(view).unwrap().uid();
        assert_eq!(graph.remove_by_uid(uid), Some(view));
        assert_eq!(graph.main_view(), None);
        assert_eq!(graph.node(a).unwrap().view(), None);
        // Detached children keep pointing at their old parent.
        assert_eq!(graph.node(a).unwrap().parent(), Some(view));
    }

    #[test]
    fn line_and_angles() {
        let (mut graph, [view, a, _, _, c]) = small_graph();
        graph.update_groups(view);
        let line = graph.line(a, dvec2(0.0, 50.0)).unwrap();
        assert!(matches!(line, PerspectiveLine::Straight(_)));
        assert_eq!(
            graph.line(c, DVec2::ZERO).unwrap_err(),
            GraphError::NotAPoint {
                uid: graph.node(c).unwrap().uid()
            }
        );

        let (yaw, pitch) = graph.angles(a).unwrap();
        assert!((yaw - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(pitch, 0.0);
        assert_eq!(graph.angles(view), None);

        assert!(graph.horizon_line(view, vec3(0.0, 1.0, 0.5)).is_some());
        assert!(graph.horizon_line(a, vec3(0.0, 1.0, 0.5)).is_none());
    }

    #[test]
    fn stale_handles_read_as_empty() {
        let (mut graph, [view, a, group, _, _]) = small_graph();
        graph.clear();
        assert_eq!(graph.node(view), None);
        assert!(graph.get_points(view).is_empty());
        assert!(graph.get_all_nodes(group).is_empty());
        assert!(graph.get_logic_children(view).is_empty());
        assert_eq!(graph.find_parent_view(a), None);
        assert_eq!(graph.find_parent_space(a), None);
        assert_eq!(graph.find_ui_parent(a), None);
        assert!(graph.update_groups(view).is_empty());
        assert_eq!(graph.horizon_line(view, vec3(0.0, 1.0, 0.5)), None);
        assert_eq!(graph.angles(a), None);
        assert_eq!(graph.line(a, DVec2::ZERO), Err(GraphError::InvalidNode { index: a.0 }));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn invalid_handles_are_rejected() {
        let mut graph = SceneGraph::new();
        assert_eq!(
            graph.set_chosen_point(Some(NodeId(5))),
            Err(GraphError::InvalidNode { index: 5 })
        );
        assert!(graph.toggle(NodeId(9)).is_err());
    }
}
