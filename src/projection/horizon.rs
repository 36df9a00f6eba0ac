//! Horizon line of a rectilinear view

use glam::{DQuat, DVec2, dvec2};

use super::ProjectionFrame;
use crate::geometry::cmul;

/// Straight horizon derived from an up direction.
///
/// When `up` lies in the canvas plane or points straight at the viewer the
/// horizon is at infinity and yields no points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HorizonLine {
    frame: ProjectionFrame,
    anchor: DVec2,
    direction: DVec2,
    at_infinity: bool,
}

impl HorizonLine {
    pub fn new(frame: ProjectionFrame, up: DQuat) -> Self {
        let projected_len = up.x.hypot(up.y);
        if projected_len == 0.0 || up.z == 0.0 {
            return Self {
                frame,
                anchor: DVec2::ZERO,
                direction: DVec2::ZERO,
                at_infinity: true,
            };
        }
        let projected_up = dvec2(up.x, up.y) / projected_len;
        let horizon_distance = up.z * up.z / projected_len;
        let anchor = -projected_up * horizon_distance * (1.0 / up.z);
        let direction = dvec2(up.y, -up.x);
        Self {
            frame,
            anchor,
            direction: direction / direction.length(),
            at_infinity: false,
        }
    }

    pub fn is_at_infinity(&self) -> bool {
        self.at_infinity
    }

    /// Three collinear canvas points describing the (unbounded) line.
    ///
    /// The corners are accepted for callers that clip; the line itself is not
    /// clipped.
    pub fn for_bbox(&self, _corner_a: DVec2, _corner_b: DVec2) -> Vec<DVec2> {
        if self.at_infinity {
            return Vec::new();
        }
        let start = self.frame.internal_position_to_model(self.anchor);
        let direction = cmul(self.direction, self.frame.rotation) * self.frame.size;
        vec![start - direction, start, start + direction]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec3;

    fn frame() -> ProjectionFrame {
        ProjectionFrame::from_points(dvec2(-100.0, 0.0), dvec2(100.0, 0.0))
    }

    #[test]
    fn degenerate_up_has_no_points() {
        let corners = (dvec2(-500.0, -500.0), dvec2(500.0, 500.0));
        for up in [vec3(0.0, 0.0, 1.0), vec3(0.0, 1.0, 0.0), vec3(1.0, 1.0, 0.0)] {
            let horizon = HorizonLine::new(frame(), up);
            assert!(horizon.is_at_infinity());
            assert!(horizon.for_bbox(corners.0, corners.1).is_empty());
        }
    }

    #[test]
    fn tilted_up_gives_horizontal_line() {
        // Looking slightly down: up tilts toward the viewer.
        let horizon = HorizonLine::new(frame(), vec3(0.0, 1.0, 0.5));
        let points = horizon.for_bbox(DVec2::ZERO, DVec2::ZERO);
        assert_eq!(points.len(), 3);
        for p in &points {
            assert!((p.y - (-50.0)).abs() < 1e-9, "{p}");
        }
        assert!((points[1] - points[0]).length() > 1.0);
        let a = points[1] - points[0];
        let b = points[2] - points[1];
        assert!((a.perp_dot(b)).abs() < 1e-9);
    }
}
