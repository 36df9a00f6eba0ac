//! Attaching ingested subtrees to the scene

use crate::errors::{GraphError, Result};
use crate::exchange::GraphRecord;
use crate::log::debug;
use crate::projection::Project;
use crate::scene::SceneGraph;
use crate::types::{NodeId, Relation};

/// Where a new subtree goes: the group that adopts it, the view it is drawn
/// through and the space it joins, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InsertionTarget {
    group: NodeId,
    view: NodeId,
    space: Option<NodeId>,
}

impl SceneGraph {
    fn insertion_target(&self) -> Result<InsertionTarget> {
        let group = match self.chosen_point {
            Some(chosen) if self.nodes[chosen.0].is_grouping() => chosen,
            Some(chosen) => self.nodes[chosen.0]
                .parent()
                .or(self.main_view)
                .ok_or(GraphError::NoInsertionTarget)?,
            None => self.main_view.ok_or(GraphError::NoInsertionTarget)?,
        };

        let node = &self.nodes[group.0];
        let (view, space) = if node.is_view() {
            (Some(group), None)
        } else if node.is_space() {
            (node.view(), Some(group))
        } else {
            (node.view(), self.find_parent_space(group))
        };
        let view = view.ok_or(GraphError::MissingView { uid: node.uid() })?;
        Ok(InsertionTarget { group, view, space })
    }

    /// Hang an already ingested subtree below the insertion point.
    ///
    /// The insertion point is the chosen node when it can hold children, its
    /// parent otherwise, and the main view when nothing is chosen. Nodes
    /// without a view adopt the target's view and every vanishing point is
    /// re-projected. A subtree cannot be attached below one of its own nodes.
    pub fn connect_sub_graph(&mut self, local_root: NodeId) -> Result<NodeId> {
        self.check(local_root)?;
        let target = self.insertion_target()?;
        if self.is_within(target.group, local_root) {
            return Err(GraphError::AttachCycle {
                uid: self.nodes[local_root.0].uid(),
            });
        }
        self.attach(local_root, target);
        Ok(local_root)
    }

    /// Ingest a record and attach it like [`SceneGraph::connect_sub_graph`].
    ///
    /// Fails without touching the graph when the record is malformed or
    /// there is nowhere to put it.
    pub fn add_sub_graph(&mut self, record: &GraphRecord) -> Result<NodeId> {
        let target = self.insertion_target()?;
        let staged = self.stage(record, self.nodes.len())?;
        let local_root = self.commit(staged);
        self.attach(local_root, target);
        Ok(local_root)
    }

    /// Replace the whole scene with a record.
    ///
    /// The record's root becomes the graph root. Groups directly under it are
    /// brought up to date and the compute nodes they report are evaluated.
    /// A malformed record leaves the current scene in place.
    pub fn initialize_from_structure(&mut self, record: &GraphRecord) -> Result<NodeId> {
        let staged = self.stage(record, 0)?;
        self.reset();
        let root = self.commit(staged);
        self.root = root;
        self.refresh_inherited_flags(root);

        let mut pending = Vec::new();
        for child in self.nodes[root.0].children().to_vec() {
            pending.extend(self.update_groups(child));
        }
        let mut cascade = self.cascade();
        for id in pending {
            self.compute_with(id, &mut cascade)?;
        }
        debug!(nodes = self.nodes.len(), "scene initialized");
        Ok(root)
    }

    fn attach(&mut self, local_root: NodeId, target: InsertionTarget) {
        let projection = self.nodes[target.view.0].as_projection().copied();
        let frame = target
            .space
            .and_then(|space| self.nodes[space.0].as_space().copied());

        let root = &mut self.nodes[local_root.0];
        if let Some(vp) = root.as_point_mut() {
            if let Some(projection) = &projection {
                let position = vp.position;
                projection.update_child_to(vp, position);
            }
            if let Some(frame) = &frame {
                frame.move_child_to_space(vp);
            }
        } else if let Some(subspace) = root.as_space_mut() {
            if let Some(frame) = &frame {
                frame.move_subspace_to_space(subspace);
            }
        }

        if let Some(old_parent) = self.nodes[local_root.0].parent() {
            self.nodes[old_parent.0].remove_child(local_root);
        }
        self.nodes[target.group.0].add_child(local_root);
        self.nodes[local_root.0].set_parent(target.group);

        for id in self.get_all_nodes(local_root) {
            let view = match self.nodes[id.0].view() {
                Some(view) => view,
                None => {
                    self.nodes[id.0].add_relative(target.view, Relation::View);
                    target.view
                }
            };
            let projection = self.nodes[view.0].as_projection().copied();
            if let (Some(projection), Some(vp)) = (projection, self.nodes[id.0].as_point_mut()) {
                projection.update_child(vp);
            }
        }
        self.refresh_inherited_flags(local_root);
        debug!(
            root = self.nodes[local_root.0].uid(),
            group = self.nodes[target.group.0].uid(),
            "attached subtree"
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::dvec2;

    use super::*;
    use crate::defaults::FORMAT_VERSION;
    use crate::exchange::{EdgeRecord, NodeRecord};
    use crate::geometry::{normalize, vec3};
    use crate::projection::{Projection, RectilinearProjection};
    use crate::scene::{Node, PerspectiveGroup, PerspectiveSpace, VanishingPoint};

    fn scene_with_view() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let projection: Projection =
            RectilinearProjection::new(dvec2(-100.0, 0.0), dvec2(100.0, 0.0)).into();
        let view = graph.push_node(Node::new(graph.uids.next_uid(), "view", projection));
        graph.nodes[root.0].add_child(view);
        graph.nodes[view.0].set_parent(root);
        graph.main_view = Some(view);
        (graph, view)
    }

    fn single_point(direction: [f64; 3]) -> GraphRecord {
        let mut vp = NodeRecord::new("VP", "p");
        vp.direction = Some(direction.to_vec());
        GraphRecord {
            version: Some(FORMAT_VERSION.to_string()),
            root: "p".into(),
            nodes: vec![vp],
            edges: vec![],
            visualizations: None,
        }
    }

    #[test]
    fn attaches_under_main_view() {
        let (mut graph, view) = scene_with_view();
        let point = graph.add_sub_graph(&single_point([0.0, 0.0, 1.0])).unwrap();
        assert_eq!(graph.node(view).unwrap().children(), &[point]);
        let node = graph.node(point).unwrap();
        assert_eq!(node.parent(), Some(view));
        assert_eq!(node.view(), Some(view));
    }

    #[test]
    fn root_point_is_placed_from_its_position() {
        let (mut graph, _) = scene_with_view();
        let mut record = single_point([0.0, 0.0, 1.0]);
        record.nodes[0].position = Some(vec![100.0, 0.0]);
        let point = graph.add_sub_graph(&record).unwrap();
        let vp = graph.node(point).unwrap().as_point().unwrap();
        let expected = normalize(vec3(1.0, 0.0, 1.0));
        assert!((vp.direction - expected).length() < 1e-12);
        assert!((vp.position - dvec2(100.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn chosen_point_redirects_to_its_parent() {
        let (mut graph, view) = scene_with_view();
        let group = graph.push_node(Node::new(graph.uids.next_uid(), "g", PerspectiveGroup));
        graph.nodes[view.0].add_child(group);
        graph.nodes[group.0].set_parent(view);
        graph.nodes[group.0].add_relative(view, Relation::View);
        let first = graph.add_sub_graph(&single_point([1.0, 0.0, 1.0])).unwrap();

        graph.set_chosen_point(Some(group)).unwrap();
        let second = graph.add_sub_graph(&single_point([-1.0, 0.0, 1.0])).unwrap();
        assert_eq!(graph.node(second).unwrap().parent(), Some(group));

        graph.set_chosen_point(Some(second)).unwrap();
        let third = graph.add_sub_graph(&single_point([0.0, 0.0, 1.0])).unwrap();
        assert_eq!(graph.node(third).unwrap().parent(), Some(group));
        assert_eq!(graph.node(view).unwrap().children(), &[group, first]);
    }

    #[test]
    fn joins_the_enclosing_space() {
        let (mut graph, view) = scene_with_view();
        let turned = PerspectiveSpace::from_up(vec3(1.0, 1.0, 0.0));
        let space = graph.push_node(Node::new(graph.uids.next_uid(), "space", turned));
        graph.nodes[view.0].add_child(space);
        graph.nodes[space.0].set_parent(view);
        graph.nodes[space.0].add_relative(view, Relation::View);
        graph.set_chosen_point(Some(space)).unwrap();

        let point = graph.add_sub_graph(&single_point([0.0, 0.0, 1.0])).unwrap();
        let vp = *graph.node(point).unwrap().as_point().unwrap();
        let mut check = vp;
        turned.update_child_dir(&mut check);
        assert!((check.direction - vp.direction).length() < 1e-12);
        assert_eq!(graph.node(point).unwrap().parent(), Some(space));
    }

    #[test]
    fn nowhere_to_attach() {
        let mut graph = SceneGraph::new();
        assert_eq!(
            graph.add_sub_graph(&single_point([0.0, 0.0, 1.0])),
            Err(GraphError::NoInsertionTarget)
        );
        assert_eq!(graph.len(), 1);

        let group = graph.push_node(Node::new(graph.uids.next_uid(), "g", PerspectiveGroup));
        graph.set_chosen_point(Some(group)).unwrap();
        let uid = graph.node(group).unwrap().uid();
        assert_eq!(
            graph.add_sub_graph(&single_point([0.0, 0.0, 1.0])),
            Err(GraphError::MissingView { uid })
        );
    }

    #[test]
    fn connect_moves_an_existing_subtree() {
        let (mut graph, view) = scene_with_view();
        let group = graph.push_node(Node::new(graph.uids.next_uid(), "g", PerspectiveGroup));
        graph.nodes[view.0].add_child(group);
        graph.nodes[group.0].set_parent(view);
        graph.nodes[group.0].add_relative(view, Relation::View);

        let loose = graph
            .create_from_structure(&single_point([1.0, 0.0, 1.0]))
            .unwrap();
        assert_eq!(graph.node(loose).unwrap().view(), None);
        graph.connect_sub_graph(loose).unwrap();
        assert_eq!(graph.node(loose).unwrap().parent(), Some(view));

        graph.set_chosen_point(Some(group)).unwrap();
        graph.connect_sub_graph(loose).unwrap();
        assert_eq!(graph.node(loose).unwrap().parent(), Some(group));
        assert_eq!(graph.node(view).unwrap().children(), &[group]);
        assert_eq!(graph.node(loose).unwrap().relations().len(), 2);
    }

    #[test]
    fn cannot_attach_below_itself() {
        let (mut graph, view) = scene_with_view();
        let root = graph.root();
        assert_eq!(
            graph.connect_sub_graph(root),
            Err(GraphError::AttachCycle {
                uid: graph.node(root).unwrap().uid()
            })
        );
        assert_eq!(graph.node(root).unwrap().parent(), None);
        assert!(graph.node(view).unwrap().children().is_empty());

        let group = graph.push_node(Node::new(graph.uids.next_uid(), "g", PerspectiveGroup));
        graph.nodes[view.0].add_child(group);
        graph.nodes[group.0].set_parent(view);
        graph.nodes[group.0].add_relative(view, Relation::View);
        graph.set_chosen_point(Some(group)).unwrap();
        assert!(matches!(
            graph.connect_sub_graph(view),
            Err(GraphError::AttachCycle { .. })
        ));
        assert!(matches!(
            graph.connect_sub_graph(group),
            Err(GraphError::AttachCycle { .. })
        ));
        assert_eq!(graph.node(view).unwrap().parent(), Some(root));
        assert_eq!(graph.node(group).unwrap().parent(), Some(view));
        assert_eq!(graph.get_all_nodes(root), vec![root, view, group]);
    }

    #[test]
    fn attached_subtree_inherits_flags() {
        let (mut graph, view) = scene_with_view();
        graph.set_locked(view, true).unwrap();
        let mut record = single_point([0.0, 0.0, 1.0]);
        record.nodes.insert(0, NodeRecord::new("Group", "g"));
        record.root = "g".into();
        record.edges.push(EdgeRecord::new("g", "p"));
        let group = graph.add_sub_graph(&record).unwrap();
        let point = graph.node(group).unwrap().children()[0];
        assert!(graph.node(point).unwrap().parent_locked());
        assert_eq!(graph.node(point).unwrap().view(), Some(view));
        let vp: &VanishingPoint = graph.node(point).unwrap().as_point().unwrap();
        assert!(vp.position.length() < 1e-9);
    }

    #[test]
    fn initialize_replaces_the_scene() {
        let (mut graph, _) = scene_with_view();
        let record = single_point([0.0, 0.0, 1.0]);
        let root = graph.initialize_from_structure(&record).unwrap();
        assert_eq!(root, NodeId(0));
        assert_eq!(graph.root(), root);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.main_view(), None);
        assert!(!graph.is_empty());

        let mut bad = single_point([0.0, 0.0, 1.0]);
        bad.root = "missing".into();
        assert!(graph.initialize_from_structure(&bad).is_err());
        assert_eq!(graph.root(), root);
        assert_eq!(graph.len(), 1);
    }
}
