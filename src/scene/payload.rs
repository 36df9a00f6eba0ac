//! Geometric payloads carried by scene nodes

use glam::{DQuat, DVec2, dvec2};

use crate::geometry::{normalize, rotate, rotation_between_vectors, vec3};

/// Default forward direction of a freshly placed point.
pub const FORWARD: DQuat = vec3(0.0, 0.0, 1.0);
/// Default up direction of planes and spaces.
pub const UP: DQuat = vec3(0.0, 1.0, 0.0);

/// A 3D direction and its canvas position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VanishingPoint {
    /// Direction in view space.
    pub direction: DQuat,
    /// Direction relative to the enclosing space.
    pub direction_local: DQuat,
    /// Position on the canvas.
    pub position: DVec2,
    /// Canvas heading written by the `2d_direction` compute functions.
    pub heading: Option<DVec2>,
}

impl VanishingPoint {
    pub fn from_direction(direction: DQuat) -> Self {
        Self::with_local(direction, direction)
    }

    pub fn with_local(direction: DQuat, direction_local: DQuat) -> Self {
        Self {
            direction,
            direction_local,
            position: DVec2::ZERO,
            heading: None,
        }
    }

    /// Point placed on the canvas; its direction is derived once it has a view.
    pub fn from_position(position: DVec2) -> Self {
        Self {
            direction: FORWARD,
            direction_local: FORWARD,
            position,
            heading: None,
        }
    }
}

/// A local rotation frame.
///
/// `rotation` is global; `rotation_local` is relative to the enclosing space,
/// so the parent frame is always `rotation * conj(rotation_local)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveSpace {
    pub rotation: DQuat,
    pub rotation_local: DQuat,
}

impl Default for PerspectiveSpace {
    fn default() -> Self {
        Self::new(DQuat::IDENTITY, DQuat::IDENTITY)
    }
}

impl PerspectiveSpace {
    pub fn new(rotation: DQuat, rotation_local: DQuat) -> Self {
        Self {
            rotation,
            rotation_local,
        }
    }

    /// Space whose `up` vector is brought back onto the default up.
    pub fn from_up(up: DQuat) -> Self {
        let rotation = rotation_between_vectors(up, UP);
        Self::new(rotation, rotation)
    }

    fn parent_rotation(&self) -> DQuat {
        self.rotation * self.rotation_local.conjugate()
    }

    /// Global direction of a child from its local direction.
    pub fn update_child_dir(&self, vp: &mut VanishingPoint) {
        vp.direction = rotate(self.rotation, vp.direction_local);
    }

    /// Local direction of a child from its global direction.
    pub fn move_child_to_space(&self, vp: &mut VanishingPoint) {
        vp.direction_local = rotate(self.rotation.conjugate(), vp.direction);
    }

    /// Global rotation of a nested space from its local rotation.
    pub fn update_subspace(&self, subspace: &mut PerspectiveSpace) {
        subspace.rotation = self.rotation * subspace.rotation_local;
    }

    /// Local rotation of a nested space from its global rotation.
    pub fn move_subspace_to_space(&self, subspace: &mut PerspectiveSpace) {
        subspace.rotation_local = self.rotation.conjugate() * subspace.rotation;
    }

    /// Turn the space so that `key` ends up pointing along `new_direction`.
    pub fn update_space(&mut self, key: &VanishingPoint, new_direction: DQuat) {
        let delta = rotation_between_vectors(key.direction, new_direction);
        self.update_global_rotation(delta * self.rotation);
    }

    /// Replace the global rotation, keeping the parent frame fixed.
    pub fn update_global_rotation(&mut self, rotation: DQuat) {
        let parent = self.parent_rotation();
        self.rotation = rotation;
        self.rotation_local = parent.conjugate() * rotation;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: DQuat,
}

impl Default for Plane {
    fn default() -> Self {
        Self { normal: UP }
    }
}

impl Plane {
    pub fn set_normal(&mut self, normal: DQuat) {
        self.normal = normal;
    }
}

/// Organizational container without geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerspectiveGroup;

/// Canvas offset between two points, used as a displayed heading.
pub(crate) fn canvas_offset(from: &VanishingPoint, to: &VanishingPoint) -> DVec2 {
    dvec2(to.position.x - from.position.x, to.position.y - from.position.y)
}

/// Unit direction of a point, used by compute functions that read sources.
pub(crate) fn unit_direction(vp: &VanishingPoint) -> DQuat {
    normalize(vp.direction)
}
