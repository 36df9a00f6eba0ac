//! Geometry kernel: quaternions as 3D vectors and rotations, complex numbers as 2D points.
//!
//! Quaternions are `glam::DQuat` with `(x, y, z)` as the vector part and `w` as
//! the scalar. A direction is a quaternion with `w == 0`. `length`, `normalize`,
//! `dot` and `cross` treat their arguments as 3D vectors and leave `w` alone.
//!
//! Complex numbers are `glam::DVec2` (`x` real, `y` imaginary); the complex
//! product is `DVec2::rotate`.

use glam::{DQuat, DVec2, dvec2};

/// Direction quaternion `(x, y, z, 0)`.
#[inline]
pub const fn vec3(x: f64, y: f64, z: f64) -> DQuat {
    DQuat::from_xyzw(x, y, z, 0.0)
}

/// Magnitude of the vector part.
#[inline]
pub fn length(q: DQuat) -> f64 {
    (q.x * q.x + q.y * q.y + q.z * q.z).sqrt()
}

/// Divide the vector part by its magnitude.
///
/// A zero-length input yields NaN components; callers that care check the
/// length first.
#[inline]
pub fn normalize(q: DQuat) -> DQuat {
    let len = length(q);
    DQuat::from_xyzw(q.x / len, q.y / len, q.z / len, q.w)
}

#[inline]
pub fn dot(a: DQuat, b: DQuat) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[inline]
pub fn cross(a: DQuat, b: DQuat) -> DQuat {
    vec3(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Rotate `v` by `q` with the sandwich product `q * v * q⁻¹`.
#[inline]
pub fn rotate(q: DQuat, v: DQuat) -> DQuat {
    q * v * q.conjugate()
}

/// Unit quaternion rotating the direction of `a` onto the direction of `b`.
///
/// Built from the half vector between the two directions. Antiparallel input
/// has no unique answer and yields NaN.
pub fn rotation_between_vectors(a: DQuat, b: DQuat) -> DQuat {
    let a = normalize(vec3(a.x, a.y, a.z));
    let b = normalize(vec3(b.x, b.y, b.z));
    let half = normalize(a + b);
    let axis = cross(a, half);
    DQuat::from_xyzw(axis.x, axis.y, axis.z, dot(a, half))
}

/// Rotation of `angle` radians about `axis` (expected to be unit length).
pub fn rotation_about_axis(axis: DQuat, angle: f64) -> DQuat {
    let (sin, cos) = (angle / 2.0).sin_cos();
    DQuat::from_xyzw(axis.x * sin, axis.y * sin, axis.z * sin, cos)
}

/// Yaw and pitch (radians) of a direction.
pub fn vector_to_angle(v: DQuat) -> (f64, f64) {
    let n = normalize(v);
    (n.x.atan2(n.z), n.y.asin())
}

/// Point where the ray from the origin along `ray` meets the plane through
/// `point` with normal `normal`.
pub fn intersect_view_ray_and_plane(normal: DQuat, point: DQuat, ray: DQuat) -> DQuat {
    let t = dot(normal, point) / dot(normal, ray);
    vec3(ray.x * t, ray.y * t, ray.z * t)
}

/// Complex product.
#[inline]
pub fn cmul(a: DVec2, b: DVec2) -> DVec2 {
    a.rotate(b)
}

/// Complex conjugate.
#[inline]
pub fn conj(a: DVec2) -> DVec2 {
    dvec2(a.x, -a.y)
}

/// Rotate a 2D vector by +90°.
#[inline]
pub fn rotate_90(a: DVec2) -> DVec2 {
    a.perp()
}
