//! Graph to record

use std::collections::{HashMap, HashSet};

use glam::{DQuat, DVec2};

use super::{EdgeRecord, GraphRecord, NodeRecord, VisualizationRecord};
use crate::defaults::FORMAT_VERSION;
use crate::projection::Project;
use crate::scene::{Node, NodeKind, SceneGraph};
use crate::types::{EdgeKind, NodeId};

impl SceneGraph {
    /// Describe everything reachable from the root as a record.
    ///
    /// Record ids are node uids. Relations that point outside the reachable
    /// tree are left out so the record always ingests cleanly.
    pub fn to_record(&self) -> GraphRecord {
        let reachable: HashSet<NodeId> = self.get_all_nodes(self.root).into_iter().collect();

        let mut sorted: Vec<(&String, &NodeId)> = self.by_tag.iter().collect();
        sorted.sort();
        let mut tags: HashMap<NodeId, &str> = HashMap::new();
        // Smallest tag wins when a node carries several.
        for (tag, id) in sorted.into_iter().rev() {
            tags.insert(*id, tag.as_str());
        }

        let mut nodes = Vec::with_capacity(reachable.len());
        let mut edges = Vec::new();
        self.traverse(self.root, |id, parent| {
            let node = &self.nodes[id.0];
            if let Some(parent) = parent {
                edges.push(
                    EdgeRecord::new(self.nodes[parent.0].uid(), node.uid())
                        .with_kind(EdgeKind::Child.as_str()),
                );
            }
            for item in node.relations() {
                if !reachable.contains(&item.node) {
                    continue;
                }
                edges.push(
                    EdgeRecord::new(node.uid(), self.nodes[item.node.0].uid())
                        .with_kind(EdgeKind::from(item.relation).as_str()),
                );
            }
            nodes.push(node_record(node, tags.get(&id).copied()));
        });

        let visualizations = self
            .visualizations
            .iter()
            .map(|visualization| VisualizationRecord {
                label: visualization.label.clone(),
                nodes: visualization.nodes.iter().map(|&uid| uid.into()).collect(),
            })
            .collect();

        GraphRecord {
            version: Some(FORMAT_VERSION.to_string()),
            root: self.nodes[self.root.0].uid().into(),
            nodes,
            edges,
            visualizations: Some(visualizations),
        }
    }
}

fn node_record(node: &Node, tag: Option<&str>) -> NodeRecord {
    let mut record = NodeRecord::new(node.kind().type_name(), node.uid());
    record.name = Some(node.name.clone());
    record.is_ui = Some(node.is_ui());
    record.enabled = Some(node.enabled());
    record.locked = Some(node.locked());
    record.parent_enabled = Some(node.parent_enabled());
    record.parent_locked = Some(node.parent_locked());
    record.is_compute = Some(node.is_compute());
    record.color = Some(node.color);
    record.tag = tag.map(str::to_string);
    if node.is_compute() {
        record.compute_fct = node.compute_fn().map(|function| function.as_str().to_string());
        record.compute_params = Some(node.compute_params().to_vec());
    }

    match node.kind() {
        NodeKind::VanishingPoint(vp) => {
            record.role = Some(node.role.as_str().to_string());
            record.direction = Some(xyz(vp.direction));
            record.direction_local = Some(xyz(vp.direction_local));
            record.position = Some(xy(vp.position));
        }
        NodeKind::Projection(projection) => {
            let (left, right) = projection.frame().reference_points();
            record.left = Some(xy(left));
            record.right = Some(xy(right));
        }
        NodeKind::Space(space) => {
            record.rotation = Some(xyzw(space.rotation));
            record.rotation_local = Some(xyzw(space.rotation_local));
        }
        NodeKind::Plane(_) | NodeKind::Group(_) => {}
    }
    record
}

fn xy(v: DVec2) -> Vec<f64> {
    vec![v.x, v.y]
}

fn xyz(q: DQuat) -> Vec<f64> {
    vec![q.x, q.y, q.z]
}

fn xyzw(q: DQuat) -> Vec<f64> {
    vec![q.x, q.y, q.z, q.w]
}
