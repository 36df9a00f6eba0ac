//! Group updates, point drags and the compute cascade

use std::collections::VecDeque;

use glam::DVec2;

use super::compute::{ComputeFn, ComputeInput};
use super::{NodeKind, SceneGraph};
use crate::errors::{GraphError, Result};
use crate::log::{debug, trace, warn};
use crate::projection::Project;
use crate::types::{NodeId, Relation};

/// Step counter shared by everything one cascade computes.
pub(crate) struct Cascade {
    steps: usize,
    budget: usize,
}

impl Cascade {
    pub(crate) fn new(budget: usize) -> Self {
        Self { steps: 0, budget }
    }

    fn step(&mut self) -> Result<()> {
        if self.steps >= self.budget {
            warn!(steps = self.steps, "compute cascade over budget");
            return Err(GraphError::CascadeBudgetExceeded { steps: self.steps });
        }
        self.steps += 1;
        Ok(())
    }
}

impl SceneGraph {
    pub(crate) fn cascade(&self) -> Cascade {
        Cascade::new(self.config.cascade_budget)
    }

    /// Re-seat every logical member of a view or space and return the nodes
    /// they feed, for the caller to recompute.
    ///
    /// A view positions its members directly. A space first turns its member
    /// points and nested spaces by its rotation, then positions them through
    /// its own view. Views nested in the group and compute-driven members are
    /// left alone. A handle from outside the graph updates nothing.
    pub fn update_groups(&mut self, group: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(group.0) else {
            return Vec::new();
        };
        let (view, space) = if node.is_view() {
            (Some(group), None)
        } else if node.is_space() {
            (node.view(), Some(group))
        } else {
            (node.view(), None)
        };
        if view.is_none() {
            debug!(uid = node.uid(), "group has no view, canvas positions left as is");
        }
        let projection = view.and_then(|v| self.nodes[v.0].as_projection().copied());
        let rotation = space.and_then(|s| self.nodes[s.0].as_space().copied());

        let mut compute_nodes = Vec::new();
        for child in self.get_logic_children(group) {
            compute_nodes.extend(self.nodes[child.0].compute_children());
            let member = &mut self.nodes[child.0];
            if let Some(subspace) = member.as_space_mut() {
                if let Some(parent) = &rotation {
                    parent.update_subspace(subspace);
                }
                compute_nodes.extend(self.update_groups(child));
            } else if member.is_view() || member.is_compute() {
                continue;
            } else if let Some(vp) = member.as_point_mut() {
                if let Some(parent) = &rotation {
                    parent.update_child_dir(vp);
                }
                if let Some(projection) = &projection {
                    projection.update_child(vp);
                }
            }
        }
        compute_nodes
    }

    /// Drag a vanishing point to `position`.
    ///
    /// Dragging the key point of a space turns the whole space; any other point
    /// just moves. Either way, every node fed by what moved is recomputed.
    pub fn update(&mut self, id: NodeId, position: DVec2) -> Result<()> {
        self.check(id)?;
        let node = &self.nodes[id.0];
        let uid = node.uid();
        let is_key = node.is_key();
        if !node.is_point() {
            return Err(GraphError::NotAPoint { uid });
        }
        let projection = node
            .view()
            .and_then(|view| self.nodes[view.0].as_projection().copied())
            .ok_or(GraphError::MissingView { uid })?;
        let space = self.find_parent_space(id);
        debug!(uid, x = position.x, y = position.y, "update");

        let mut queue = VecDeque::new();
        match space {
            Some(space) if is_key => {
                let direction = projection.calc_direction(position);
                let key = *self.nodes[id.0]
                    .as_point()
                    .ok_or(GraphError::NotAPoint { uid })?;
                if let Some(frame) = self.nodes[space.0].as_space_mut() {
                    frame.update_space(&key, direction);
                }
                queue.extend(self.update_groups(space));
            }
            _ => {
                let frame = space.and_then(|s| self.nodes[s.0].as_space().copied());
                let node = &mut self.nodes[id.0];
                if let Some(vp) = node.as_point_mut() {
                    projection.update_child_to(vp, position);
                    if let Some(frame) = frame {
                        frame.move_child_to_space(vp);
                    }
                }
                queue.extend(node.compute_children());
            }
        }

        let mut cascade = self.cascade();
        while let Some(next) = queue.pop_front() {
            self.compute_with(next, &mut cascade)?;
            queue.extend(self.nodes[next.0].compute_children());
        }
        Ok(())
    }

    /// Re-derive a compute node from its sources.
    pub fn compute(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        let mut cascade = self.cascade();
        self.compute_with(id, &mut cascade)
    }

    /// Compute `start`; views and spaces also recompute everything their
    /// members feed, depth first.
    pub(crate) fn compute_with(&mut self, start: NodeId, cascade: &mut Cascade) -> Result<()> {
        let mut pending = vec![start];
        while let Some(id) = pending.pop() {
            cascade.step()?;
            let dependents = self.compute_one(id)?;
            pending.extend(dependents.into_iter().rev());
        }
        Ok(())
    }

    fn compute_one(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = &self.nodes[id.0];
        let sources = node.compute_sources();
        let Some(function) = node.compute_fn() else {
            return Ok(Vec::new());
        };
        if sources.is_empty() {
            return Ok(Vec::new());
        }
        let uid = node.uid();
        trace!(uid, function = function.as_str(), "compute");

        let kinds: Vec<NodeKind> = sources.iter().map(|s| *self.nodes[s.0].kind()).collect();
        let view = node.view();
        let projection = view.and_then(|v| self.nodes[v.0].as_projection().copied());
        let input = ComputeInput {
            uid,
            sources: &kinds,
            params: node.compute_params(),
            view: projection.as_ref(),
        };
        let output = match function.evaluate(&input) {
            Ok(output) => output,
            Err(err) => {
                warn!(uid, %err, "compute rejected");
                return Err(err);
            }
        };
        output.apply(function, uid, self.nodes[id.0].kind_mut())?;

        let node = &mut self.nodes[id.0];
        if node.is_view() || node.is_space() {
            return Ok(self.update_groups(id));
        }
        if let (Some(projection), Some(vp)) = (projection, node.as_point_mut()) {
            projection.update_child(vp);
        }
        Ok(Vec::new())
    }

    /// Bind `function` to `dst`, feed it from `sources` and compute it once.
    pub fn convert_to_compute_node(
        &mut self,
        dst: NodeId,
        sources: &[NodeId],
        function: &str,
        value: f64,
    ) -> Result<()> {
        let function: ComputeFn = function.parse()?;
        self.check(dst)?;
        for &src in sources {
            self.check(src)?;
        }
        for &src in sources {
            self.link_compute(src, dst);
        }
        let node = &mut self.nodes[dst.0];
        node.set_compute(true);
        node.set_compute_params(vec![value]);
        node.bind_compute(function);
        debug!(uid = node.uid(), %function, sources = sources.len(), "compute node bound");
        self.compute(dst)
    }

    /// Replace the sources of a compute node and recompute it.
    pub fn update_compute_point_source(&mut self, id: NodeId, sources: &[NodeId]) -> Result<()> {
        self.check(id)?;
        for &src in sources {
            self.check(src)?;
        }
        for old in self.nodes[id.0].take_compute_sources() {
            self.nodes[old.0].remove_relation(id, Relation::Compute);
        }
        for &src in sources {
            self.link_compute(src, id);
        }
        self.compute(id)
    }

    fn link_compute(&mut self, src: NodeId, dst: NodeId) {
        self.nodes[src.0].add_relative(dst, Relation::Compute);
        self.nodes[dst.0].add_relative(src, Relation::ComputeSrc);
    }
}
