//! Record validation and staging
//!
//! A record is turned into nodes and wired up entirely off to the side; the
//! graph only changes in `SceneGraph::commit`, which cannot fail. A bad
//! record therefore leaves the graph as it was.

use std::collections::HashMap;

use glam::{DQuat, DVec2, dvec2};

use super::{GraphRecord, NodeRecord, RecordKey};
use crate::defaults::FORMAT_VERSION;
use crate::errors::{GraphError, Result};
use crate::geometry::vec3;
use crate::log::debug;
use crate::projection::{CurvilinearPerspective, Projection, RectilinearProjection};
use crate::scene::{
    ComputeFn, Node, NodeKind, PerspectiveGroup, PerspectiveSpace, Plane, SceneGraph,
    VanishingPoint, VisualizationData,
};
use crate::types::{EdgeKind, NodeId, Relation, VpRole};

/// Nodes built from a record, with handles already pointing at the arena
/// slots they will occupy.
#[derive(Debug)]
pub(crate) struct StagedGraph {
    base: usize,
    nodes: Vec<Node>,
    root: NodeId,
    tags: Vec<(String, NodeId)>,
    main_view: Option<NodeId>,
    visualizations: Vec<VisualizationData>,
}

impl SceneGraph {
    /// Ingest a record without attaching it anywhere; returns its root.
    pub fn create_from_structure(&mut self, record: &GraphRecord) -> Result<NodeId> {
        let staged = self.stage(record, self.nodes.len())?;
        Ok(self.commit(staged))
    }

    /// Build the record's nodes as they will sit at arena index `base`.
    pub(crate) fn stage(&self, record: &GraphRecord, base: usize) -> Result<StagedGraph> {
        if let Some(version) = &record.version {
            if version != FORMAT_VERSION {
                return Err(GraphError::UnsupportedVersion {
                    found: version.clone(),
                    supported: FORMAT_VERSION,
                });
            }
        }

        let mut keys: HashMap<&str, NodeId> = HashMap::with_capacity(record.nodes.len());
        let mut nodes = Vec::with_capacity(record.nodes.len());
        let mut tags = Vec::new();
        let mut main_view = None;
        for (index, node_record) in record.nodes.iter().enumerate() {
            let id = NodeId(base + index);
            if keys.insert(node_record.id.as_str(), id).is_some() {
                return Err(GraphError::DuplicateId {
                    id: node_record.id.to_string(),
                });
            }
            let node = node_from_record(node_record, self.uids.next_uid())?;
            if node.is_view() && main_view.is_none() {
                main_view = Some(id);
            }
            if let Some(tag) = &node_record.tag {
                tags.push((tag.clone(), id));
            }
            nodes.push(node);
        }

        let resolve = |key: &RecordKey| {
            keys.get(key.as_str())
                .copied()
                .ok_or_else(|| GraphError::UnresolvedNode { id: key.to_string() })
        };

        for edge in &record.edges {
            let src = resolve(&edge.src)?;
            let dst = resolve(&edge.dst)?;
            let kind = match &edge.kind {
                None => EdgeKind::Child,
                Some(kind) => kind.parse::<EdgeKind>().map_err(|()| GraphError::UnknownEdgeType {
                    kind: kind.clone(),
                    src: edge.src.to_string(),
                    dst: edge.dst.to_string(),
                })?,
            };
            let (s, d) = (src.0 - base, dst.0 - base);
            match kind {
                EdgeKind::Child => {
                    if nodes[d].parent().is_some() {
                        return Err(GraphError::DuplicateParent {
                            node: edge.dst.to_string(),
                        });
                    }
                    nodes[s].add_child(dst);
                    nodes[d].set_parent(src);
                }
                // Implied by CHILD.
                EdgeKind::Parent => {}
                EdgeKind::View => {
                    if !nodes[d].is_view() {
                        return Err(GraphError::NotAView {
                            src: edge.src.to_string(),
                            dst: edge.dst.to_string(),
                        });
                    }
                    nodes[s].add_relative(dst, Relation::View);
                }
                EdgeKind::Compute => nodes[s].add_relative(dst, Relation::Compute),
                EdgeKind::ComputeSrc => nodes[s].add_relative(dst, Relation::ComputeSrc),
            }
        }

        for index in 0..nodes.len() {
            let mut current = nodes[index].parent();
            for _ in 0..nodes.len() {
                let Some(parent) = current else { break };
                if parent.0 - base == index {
                    return Err(GraphError::ParentCycle {
                        node: record.nodes[index].id.to_string(),
                    });
                }
                current = nodes[parent.0 - base].parent();
            }
        }

        // A record may list only one half of a compute pair.
        let mut halves: Vec<(usize, NodeId, Relation)> = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            let id = NodeId(base + index);
            for item in node.relations() {
                let Some(mirror) = item.relation.mirror() else { continue };
                let half = (item.node.0 - base, id, mirror);
                if !nodes[half.0].has_relative(id, mirror) && !halves.contains(&half) {
                    halves.push(half);
                }
            }
        }
        for (index, target, relation) in halves {
            nodes[index].add_relative(target, relation);
        }

        let root = resolve(&record.root)?;

        let mut visualizations = Vec::new();
        for visualization in record.visualizations.iter().flatten() {
            let uids = visualization
                .nodes
                .iter()
                .map(|key| resolve(key).map(|id| nodes[id.0 - base].uid()))
                .collect::<Result<Vec<_>>>()?;
            visualizations.push(VisualizationData {
                label: visualization.label.clone(),
                nodes: uids,
            });
        }

        Ok(StagedGraph {
            base,
            nodes,
            root,
            tags,
            main_view,
            visualizations,
        })
    }

    /// Move staged nodes into the arena and register them.
    pub(crate) fn commit(&mut self, staged: StagedGraph) -> NodeId {
        debug_assert_eq!(staged.base, self.nodes.len());
        debug!(nodes = staged.nodes.len(), base = staged.base, "committing record");
        for node in staged.nodes {
            self.push_node(node);
        }
        for (tag, id) in staged.tags {
            self.by_tag.insert(tag, id);
        }
        if self.main_view.is_none() {
            self.main_view = staged.main_view;
        }
        self.visualizations.extend(staged.visualizations);
        self.is_empty = false;
        staged.root
    }
}

fn node_from_record(record: &NodeRecord, uid: u32) -> Result<Node> {
    let key = record.id.as_str();
    let kind: NodeKind = match record.kind.as_str() {
        "VP" => vp_from_record(record)?.into(),
        "RectilinearProjection" => {
            let (left, right) = reference_points(record)?;
            Projection::from(RectilinearProjection::new(left, right)).into()
        }
        "CurvilinearPerspective" => {
            let (left, right) = reference_points(record)?;
            Projection::from(CurvilinearPerspective::new(left, right)).into()
        }
        "Group" => PerspectiveGroup.into(),
        "Plane" => Plane::default().into(),
        "Space" => space_from_record(record)?.into(),
        other => {
            return Err(GraphError::UnknownNodeType {
                node: key.to_string(),
                kind: other.to_string(),
            });
        }
    };

    let mut node = Node::new(uid, record.name.clone().unwrap_or_default(), kind);
    if let Some(is_ui) = record.is_ui {
        node.set_ui(is_ui);
    }
    node.set_enabled(record.enabled.unwrap_or(true));
    node.set_locked(record.locked.unwrap_or(false));
    node.set_inherited(
        record.parent_enabled.unwrap_or(true),
        record.parent_locked.unwrap_or(false),
    );

    if record.is_compute == Some(true) {
        let name = record
            .compute_fct
            .as_deref()
            .ok_or_else(|| missing(key, "compute_fct"))?;
        node.bind_compute(name.parse::<ComputeFn>()?);
        node.set_compute(true);
        node.set_compute_params(record.compute_params.clone().unwrap_or_default());
    }

    if node.is_point() {
        if let Some(role) = &record.role {
            node.role = role.parse::<VpRole>().map_err(|()| GraphError::UnknownRole {
                node: key.to_string(),
                role: role.clone(),
            })?;
        }
        if let Some(color) = record.color {
            node.color = color;
        }
    }
    Ok(node)
}

fn vp_from_record(record: &NodeRecord) -> Result<VanishingPoint> {
    let key = record.id.as_str();
    let position = record
        .position
        .as_deref()
        .map(|values| point(key, "position", values))
        .transpose()?;
    match &record.direction {
        Some(direction) => {
            let direction = quat(key, "direction", direction)?;
            let local = match &record.direction_local {
                Some(local) => quat(key, "direction_local", local)?,
                None => direction,
            };
            let mut vp = VanishingPoint::with_local(direction, local);
            if let Some(position) = position {
                vp.position = position;
            }
            Ok(vp)
        }
        None => position
            .map(VanishingPoint::from_position)
            .ok_or_else(|| missing(key, "direction")),
    }
}

fn reference_points(record: &NodeRecord) -> Result<(DVec2, DVec2)> {
    let key = record.id.as_str();
    let left = record.left.as_deref().ok_or_else(|| missing(key, "left"))?;
    let right = record.right.as_deref().ok_or_else(|| missing(key, "right"))?;
    Ok((point(key, "left", left)?, point(key, "right", right)?))
}

fn space_from_record(record: &NodeRecord) -> Result<PerspectiveSpace> {
    let key = record.id.as_str();
    match (&record.up, &record.rotation, &record.rotation_local) {
        (Some(up), _, _) => Ok(PerspectiveSpace::from_up(quat(key, "up", up)?)),
        (None, Some(rotation), Some(local)) => Ok(PerspectiveSpace::new(
            quat(key, "rotation", rotation)?,
            quat(key, "rotation_local", local)?,
        )),
        (None, Some(_), None) => Err(missing(key, "rotation_local")),
        (None, None, _) => Err(missing(key, "rotation")),
    }
}

fn missing(node: &str, field: &'static str) -> GraphError {
    GraphError::MissingField {
        node: node.to_string(),
        field,
    }
}

fn quat(node: &str, field: &'static str, values: &[f64]) -> Result<DQuat> {
    match *values {
        [x, y, z] => Ok(vec3(x, y, z)),
        [x, y, z, w] => Ok(DQuat::from_xyzw(x, y, z, w)),
        _ => Err(GraphError::BadVector {
            node: node.to_string(),
            field,
            len: values.len(),
        }),
    }
}

fn point(node: &str, field: &'static str, values: &[f64]) -> Result<DVec2> {
    match *values {
        [x, y] => Ok(dvec2(x, y)),
        _ => Err(GraphError::BadVector {
            node: node.to_string(),
            field,
            len: values.len(),
        }),
    }
}
