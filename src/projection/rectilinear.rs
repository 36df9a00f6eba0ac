//! Standard perspective projection for 1, 2 and 3 point perspective

use glam::{DQuat, DVec2, dvec2};

use super::{HorizonLine, PerspectiveLine, Project, ProjectionFrame, StraightLine};
use crate::defaults::POINT_AT_INFINITY;
use crate::geometry::{cmul, normalize, vec3};
use crate::scene::payload::VanishingPoint;

/// Pinhole projection onto a canvas one unit in front of the eye.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectilinearProjection {
    frame: ProjectionFrame,
}

impl RectilinearProjection {
    pub fn new(left: DVec2, right: DVec2) -> Self {
        Self {
            frame: ProjectionFrame::from_points(left, right),
        }
    }

    /// Canvas direction of the perspective line through `start` toward `vp`.
    pub fn direction_2d(&self, vp: &VanishingPoint, start: DVec2) -> DVec2 {
        let ProjectionFrame {
            center,
            rotation,
            size,
        } = self.frame;
        let direction = vp.direction;
        let start = start - center;
        let shifted = (start + cmul(dvec2(direction.x, direction.y), rotation))
            * (size / (size + direction.z));
        let dir = start - shifted;
        dir / dir.length()
    }
}

impl Project for RectilinearProjection {
    fn frame(&self) -> &ProjectionFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut ProjectionFrame {
        &mut self.frame
    }

    fn calc_direction(&self, position: DVec2) -> DQuat {
        let internal = self.frame.model_position_to_internal(position);
        normalize(vec3(internal.x, internal.y, 1.0))
    }

    fn calc_pos_from_dir(&self, direction: DQuat) -> DVec2 {
        if direction.z == 0.0 {
            return dvec2(POINT_AT_INFINITY, POINT_AT_INFINITY);
        }
        let scale = self.frame.size / direction.z;
        cmul(dvec2(direction.x * scale, direction.y * scale), self.frame.rotation)
            + self.frame.center
    }

    fn project_on_canvas(&self, positions: &[DQuat]) -> Vec<DVec2> {
        positions
            .iter()
            .map(|&pos| {
                let hit = self.intersect_view_ray_canvas(pos);
                self.frame.internal_position_to_model(dvec2(hit.x, hit.y))
            })
            .collect()
    }

    fn intersect_view_ray_canvas(&self, ray: DQuat) -> DQuat {
        ray * (1.0 / ray.z)
    }

    fn horizon_line(&self, up: DQuat) -> Option<HorizonLine> {
        Some(HorizonLine::new(self.frame, up))
    }

    fn line(&self, vp: &VanishingPoint, start: DVec2) -> PerspectiveLine {
        StraightLine::new(start, self.direction_2d(vp, start)).into()
    }
}
