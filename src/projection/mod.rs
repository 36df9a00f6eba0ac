//! Projections between canvas positions and view-space directions
//!
//! This module is organized into submodules:
//! - `rectilinear`: standard 1, 2 and 3 point perspective
//! - `curvilinear`: fisheye-style 4 and 5 point perspective
//! - `line`: perspective lines through a vanishing point
//! - `horizon`: horizon line of a rectilinear view

pub mod curvilinear;
pub mod horizon;
pub mod line;
pub mod rectilinear;

pub use curvilinear::CurvilinearPerspective;
pub use horizon::HorizonLine;
pub use line::{CurvedLine, Line, PerspectiveLine, StraightLine};
pub use rectilinear::RectilinearProjection;

use enum_dispatch::enum_dispatch;
use glam::{DQuat, DVec2, dvec2};

use crate::geometry::{cmul, conj};
use crate::scene::payload::VanishingPoint;

/// Placement of a projection on the canvas.
///
/// `size` is the canvas distance from `center` to the ±45° vanishing points and
/// `rotation` is a unit complex number turning the view in the canvas plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionFrame {
    pub center: DVec2,
    pub rotation: DVec2,
    pub size: f64,
}

impl ProjectionFrame {
    /// Frame spanned by the left and right 45° reference points.
    pub fn from_points(left: DVec2, right: DVec2) -> Self {
        let center = (left + right) / 2.0;
        let diff = right - center;
        let size = diff.length();
        Self {
            center,
            rotation: diff / size,
            size,
        }
    }

    pub fn set_all(&mut self, center: DVec2, rotation: DVec2, size: f64) {
        self.center = center;
        self.rotation = rotation;
        self.size = size;
    }

    pub fn set_center(&mut self, center: DVec2) {
        self.center = center;
    }

    pub fn set_rotation(&mut self, rotation: DVec2) {
        self.rotation = rotation;
    }

    pub fn set_size(&mut self, size: f64) {
        self.size = size;
    }

    /// Canvas (pixel) position to the centered, unit-scaled, unrotated frame.
    pub fn model_position_to_internal(&self, position: DVec2) -> DVec2 {
        cmul((position - self.center) / self.size, conj(self.rotation))
    }

    pub fn internal_position_to_model(&self, position: DVec2) -> DVec2 {
        cmul(position, self.rotation) * self.size + self.center
    }

    /// The left and right reference points the frame was built from.
    pub fn reference_points(&self) -> (DVec2, DVec2) {
        (
            self.internal_position_to_model(dvec2(-1.0, 0.0)),
            self.internal_position_to_model(dvec2(1.0, 0.0)),
        )
    }
}

/// Mapping between canvas positions and view-space directions.
#[enum_dispatch]
pub trait Project {
    fn frame(&self) -> &ProjectionFrame;

    fn frame_mut(&mut self) -> &mut ProjectionFrame;

    /// Canvas position to unit view direction.
    fn calc_direction(&self, position: DVec2) -> DQuat;

    /// View direction to canvas position.
    fn calc_pos_from_dir(&self, direction: DQuat) -> DVec2;

    /// View-space points to canvas positions; points the view cannot show are dropped.
    fn project_on_canvas(&self, positions: &[DQuat]) -> Vec<DVec2>;

    fn intersect_view_ray_canvas(&self, ray: DQuat) -> DQuat;

    fn horizon_line(&self, up: DQuat) -> Option<HorizonLine>;

    /// Perspective line starting at `start` and converging on `vp`.
    fn line(&self, vp: &VanishingPoint, start: DVec2) -> PerspectiveLine;

    /// Recompute the canvas position from the stored direction.
    fn update_child(&self, vp: &mut VanishingPoint) {
        vp.position = self.calc_pos_from_dir(vp.direction);
    }

    /// Move the point to `new_position`, re-deriving both directions from it.
    fn update_child_to(&self, vp: &mut VanishingPoint, new_position: DVec2) {
        vp.direction = self.calc_direction(new_position);
        vp.direction_local = vp.direction;
        vp.position = new_position;
    }
}

#[enum_dispatch(Project)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Rectilinear(RectilinearProjection),
    Curvilinear(CurvilinearPerspective),
}

impl Projection {
    pub fn is_rectilinear(&self) -> bool {
        matches!(self, Projection::Rectilinear(_))
    }

    pub fn is_curvilinear(&self) -> bool {
        matches!(self, Projection::Curvilinear(_))
    }

    /// Exchange type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Projection::Rectilinear(_) => "RectilinearProjection",
            Projection::Curvilinear(_) => "CurvilinearPerspective",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_from_points() {
        let frame = ProjectionFrame::from_points(dvec2(-100.0, 0.0), dvec2(100.0, 0.0));
        assert_eq!(frame.center, DVec2::ZERO);
        assert_eq!(frame.rotation, dvec2(1.0, 0.0));
        assert_eq!(frame.size, 100.0);
    }

    #[test]
    fn frame_maps_are_inverse() {
        let frame = ProjectionFrame::from_points(dvec2(10.0, 40.0), dvec2(70.0, -20.0));
        for p in [dvec2(0.0, 0.0), dvec2(123.0, -7.5), dvec2(-40.0, 300.0)] {
            let back = frame.internal_position_to_model(frame.model_position_to_internal(p));
            assert!((back - p).length() < 1e-9, "{p} -> {back}");
        }
        let (left, right) = frame.reference_points();
        assert!((left - dvec2(10.0, 40.0)).length() < 1e-9);
        assert!((right - dvec2(70.0, -20.0)).length() < 1e-9);
    }

    #[test]
    fn dispatch_reaches_variant() {
        let rect: Projection =
            RectilinearProjection::new(dvec2(-100.0, 0.0), dvec2(100.0, 0.0)).into();
        let curv: Projection =
            CurvilinearPerspective::new(dvec2(-100.0, 0.0), dvec2(100.0, 0.0)).into();
        assert!(rect.is_rectilinear() && curv.is_curvilinear());
        assert!(rect.horizon_line(crate::geometry::vec3(0.0, 1.0, 1.0)).is_some());
        assert!(curv.horizon_line(crate::geometry::vec3(0.0, 1.0, 1.0)).is_none());
        assert_eq!(rect.type_name(), "RectilinearProjection");
    }
}
