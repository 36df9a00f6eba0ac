//! Curvilinear perspective for 4 and 5 point perspective
//!
//! The canvas disc of radius `size` shows the front hemisphere: a direction's
//! canvas position is its `(x, y)` component, scaled and placed by the frame.

use glam::{DQuat, DVec2, dvec2};

use super::{CurvedLine, HorizonLine, PerspectiveLine, Project, ProjectionFrame};
use crate::geometry::{normalize, vec3};
use crate::scene::payload::VanishingPoint;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvilinearPerspective {
    frame: ProjectionFrame,
}

impl CurvilinearPerspective {
    pub fn new(left: DVec2, right: DVec2) -> Self {
        Self {
            frame: ProjectionFrame::from_points(left, right),
        }
    }
}

impl Project for CurvilinearPerspective {
    fn frame(&self) -> &ProjectionFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut ProjectionFrame {
        &mut self.frame
    }

    /// Positions outside the disc are pulled onto its rim.
    fn calc_direction(&self, position: DVec2) -> DQuat {
        let mut internal = self.frame.model_position_to_internal(position);
        let mut r = internal.length();
        if r > 1.0 {
            internal /= r;
            r = 1.0;
        }
        let z = (1.0 - r * r).sqrt();
        vec3(internal.x, internal.y, z)
    }

    fn calc_pos_from_dir(&self, direction: DQuat) -> DVec2 {
        let dir = normalize(direction);
        self.frame.internal_position_to_model(dvec2(dir.x, dir.y))
    }

    /// Directions behind the viewer are culled.
    fn project_on_canvas(&self, positions: &[DQuat]) -> Vec<DVec2> {
        positions
            .iter()
            .filter(|pos| pos.z > 0.0)
            .map(|&pos| self.calc_pos_from_dir(pos))
            .collect()
    }

    fn intersect_view_ray_canvas(&self, ray: DQuat) -> DQuat {
        ray
    }

    fn horizon_line(&self, _up: DQuat) -> Option<HorizonLine> {
        None
    }

    fn line(&self, vp: &VanishingPoint, start: DVec2) -> PerspectiveLine {
        CurvedLine::new(*self, vp, start).into()
    }
}
