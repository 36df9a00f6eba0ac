//! Perspective lines converging on a vanishing point

use enum_dispatch::enum_dispatch;
use glam::{DQuat, DVec2};

use super::{CurvilinearPerspective, Project};
use crate::defaults::{LINE_MAX_STEPS, LINE_STEP_ANGLE};
use crate::geometry::{cross, dot, normalize, rotate, rotate_90, rotation_about_axis};
use crate::scene::payload::VanishingPoint;

#[enum_dispatch]
pub trait Line {
    /// Canvas distance between `position` and the line.
    fn distance(&self, position: DVec2) -> f64;

    /// Canvas points of the line from its start toward `position`.
    fn line_points(&self, position: DVec2) -> Vec<DVec2>;
}

#[enum_dispatch(Line)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PerspectiveLine {
    Straight(StraightLine),
    Curved(CurvedLine),
}

/// Line in a rectilinear view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StraightLine {
    start: DVec2,
    direction: DVec2,
}

impl StraightLine {
    /// `direction` is expected to be unit length.
    pub fn new(start: DVec2, direction: DVec2) -> Self {
        Self { start, direction }
    }
}

impl Line for StraightLine {
    fn distance(&self, position: DVec2) -> f64 {
        let relative = position - self.start;
        relative.dot(rotate_90(self.direction)).abs()
    }

    fn line_points(&self, position: DVec2) -> Vec<DVec2> {
        let relative = position - self.start;
        let length = relative.dot(self.direction);
        vec![self.start, self.start + self.direction * length]
    }
}

/// Great-circle arc in a curvilinear view.
///
/// The arc lies in the plane through the eye spanned by the start direction and
/// the vanishing point direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvedLine {
    projection: CurvilinearPerspective,
    start_dir: DQuat,
    plane_normal: DQuat,
}

impl CurvedLine {
    pub fn new(projection: CurvilinearPerspective, vp: &VanishingPoint, start: DVec2) -> Self {
        let start_dir = projection.calc_direction(start);
        let plane_normal = normalize(cross(start_dir, vp.direction));
        Self {
            projection,
            start_dir,
            plane_normal,
        }
    }

    fn onto_plane(&self, dir: DQuat) -> DQuat {
        dir - self.plane_normal * dot(self.plane_normal, dir)
    }
}

impl Line for CurvedLine {
    fn distance(&self, position: DVec2) -> f64 {
        let on_plane = self.onto_plane(self.projection.calc_direction(position));
        let reprojected = self.projection.calc_pos_from_dir(on_plane);
        (reprojected - position).length()
    }

    fn line_points(&self, position: DVec2) -> Vec<DVec2> {
        let end_dir = self.onto_plane(self.projection.calc_direction(position));
        let mut end_test = cross(self.plane_normal, end_dir);
        let begin_test = cross(self.plane_normal, self.start_dir);

        let mut step = rotation_about_axis(self.plane_normal, LINE_STEP_ANGLE);
        if dot(begin_test, end_dir) < 0.0 {
            step = step.conjugate();
            end_test = end_test.conjugate();
        }

        let mut samples = Vec::with_capacity(LINE_MAX_STEPS + 2);
        let mut pos = self.start_dir;
        samples.push(pos);
        for _ in 0..LINE_MAX_STEPS {
            pos = rotate(step, pos);
            if dot(end_test, pos) > 0.0 {
                break;
            }
            samples.push(pos);
        }
        samples.push(end_dir);
        self.projection.project_on_canvas(&samples)
    }
}
