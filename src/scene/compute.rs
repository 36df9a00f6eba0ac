//! Named geometric derivations for compute nodes
//!
//! Each function reads its ordered sources and parameters and produces a
//! [`ComputeOutput`], which is then written into the target node's payload.

use std::fmt;
use std::str::FromStr;

use glam::{DQuat, DVec2};

use crate::defaults::MEASURE_EPSILON;
use crate::errors::{GraphError, Result};
use crate::geometry::{
    cross, dot, intersect_view_ray_and_plane, length, normalize, rotate, rotate_90,
    rotation_between_vectors, vec3,
};
use crate::projection::{Project, Projection};
use crate::scene::node::NodeKind;
use crate::scene::payload::{FORWARD, UP, VanishingPoint, canvas_offset, unit_direction};

const SIDE: DQuat = vec3(1.0, 0.0, 0.0);

/// The closed set of compute functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComputeFn {
    Plane,
    MirroredPoints,
    MeasurePoints,
    MeasurePoints2,
    CrossProduct,
    Direction2d,
    Direction2d90,
    Horizon1,
    Space2pRect,
}

impl ComputeFn {
    pub const ALL: [ComputeFn; 9] = [
        ComputeFn::Plane,
        ComputeFn::MirroredPoints,
        ComputeFn::MeasurePoints,
        ComputeFn::MeasurePoints2,
        ComputeFn::CrossProduct,
        ComputeFn::Direction2d,
        ComputeFn::Direction2d90,
        ComputeFn::Horizon1,
        ComputeFn::Space2pRect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComputeFn::Plane => "plane",
            ComputeFn::MirroredPoints => "compute_mirrored_points",
            ComputeFn::MeasurePoints => "compute_measure_points",
            ComputeFn::MeasurePoints2 => "compute_measure_points_2",
            ComputeFn::CrossProduct => "cross_product",
            ComputeFn::Direction2d => "2d_direction",
            ComputeFn::Direction2d90 => "2d_direction_90",
            ComputeFn::Horizon1 => "horizon_1",
            ComputeFn::Space2pRect => "space_2p_rect",
        }
    }

    /// Evaluate against the target's sources.
    ///
    /// `view` is the target's own projection; only `space_2p_rect` needs it.
    pub fn evaluate(self, input: &ComputeInput<'_>) -> Result<ComputeOutput> {
        let sources = input.sources;
        match self {
            ComputeFn::Plane => {
                let normal = match sources.len() {
                    1 => input.point(self, 0)?.direction,
                    2 => normalize(cross(
                        input.point(self, 0)?.direction,
                        input.point(self, 1)?.direction,
                    )),
                    _ => UP,
                };
                Ok(ComputeOutput::Normal(normal))
            }
            ComputeFn::MirroredPoints => {
                let src = unit_direction(input.point(self, 0)?);
                Ok(ComputeOutput::Direction(DQuat::from_xyzw(
                    src.x, -src.y, src.z, src.w,
                )))
            }
            ComputeFn::MeasurePoints => {
                let sign = input.param(self, 0)?;
                let src = input.point(self, 0)?.direction;
                Ok(ComputeOutput::Direction(measure_direction(
                    vec3(sign, 0.0, 0.0),
                    src,
                )))
            }
            ComputeFn::MeasurePoints2 => {
                if sources.len() < 2 {
                    return Ok(ComputeOutput::Unchanged);
                }
                let scale = input.param(self, 0)?;
                let base = input.point(self, 0)?.direction * scale;
                let src = input.point(self, 1)?.direction;
                Ok(ComputeOutput::Direction(measure_direction(base, src)))
            }
            ComputeFn::CrossProduct => {
                if sources.len() != 2 {
                    return Ok(ComputeOutput::Unchanged);
                }
                let a = input.point(self, 0)?.direction;
                let b = input.point(self, 1)?.direction;
                Ok(ComputeOutput::Direction(normalize(cross(a, b))))
            }
            ComputeFn::Direction2d | ComputeFn::Direction2d90 => {
                if sources.len() != 2 {
                    return Ok(ComputeOutput::Unchanged);
                }
                let a = input.point(self, 0)?;
                let b = input.point(self, 1)?;
                let direction = normalize(cross(a.direction, b.direction));
                let mut heading = canvas_offset(a, b);
                if self == ComputeFn::Direction2d90 {
                    heading = rotate_90(heading);
                }
                Ok(ComputeOutput::DirectionWithHeading { direction, heading })
            }
            ComputeFn::Horizon1 => {
                let elevation = input.point(self, 0)?.direction;
                Ok(ComputeOutput::Normal(normalize(cross(elevation, SIDE))))
            }
            ComputeFn::Space2pRect => {
                if sources.len() < 3 {
                    return Ok(ComputeOutput::Unchanged);
                }
                let normal = input.plane(self, 0)?;
                let base = input.point(self, 1)?.position;
                let target = input.point(self, 2)?.position;
                let view = input.view.ok_or(GraphError::MissingView { uid: input.uid })?;
                Ok(space_rotation(view, normal, base, target)
                    .map_or(ComputeOutput::Unchanged, ComputeOutput::GlobalRotation))
            }
        }
    }
}

impl FromStr for ComputeFn {
    type Err = GraphError;

    fn from_str(name: &str) -> Result<Self> {
        ComputeFn::ALL
            .into_iter()
            .find(|function| function.as_str() == name)
            .ok_or_else(|| GraphError::UnknownComputeFunction {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for ComputeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a compute function reads.
pub struct ComputeInput<'a> {
    /// Uid of the target, for error reporting.
    pub uid: u32,
    pub sources: &'a [NodeKind],
    pub params: &'a [f64],
    pub view: Option<&'a Projection>,
}

impl ComputeInput<'_> {
    fn point(&self, function: ComputeFn, index: usize) -> Result<&VanishingPoint> {
        match self.sources.get(index) {
            Some(NodeKind::VanishingPoint(vp)) => Ok(vp),
            _ => Err(GraphError::ComputeSourceKind {
                function: function.as_str(),
                uid: self.uid,
                index,
                expected: "a vanishing point",
            }),
        }
    }

    fn plane(&self, function: ComputeFn, index: usize) -> Result<DQuat> {
        match self.sources.get(index) {
            Some(NodeKind::Plane(plane)) => Ok(plane.normal),
            _ => Err(GraphError::ComputeSourceKind {
                function: function.as_str(),
                uid: self.uid,
                index,
                expected: "a plane",
            }),
        }
    }

    fn param(&self, function: ComputeFn, index: usize) -> Result<f64> {
        self.params
            .get(index)
            .copied()
            .ok_or(GraphError::MissingComputeParam {
                function: function.as_str(),
                uid: self.uid,
            })
    }
}

/// What a compute function writes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComputeOutput {
    Unchanged,
    /// New global direction of a vanishing point.
    Direction(DQuat),
    /// Direction plus the canvas heading shown for it.
    DirectionWithHeading { direction: DQuat, heading: DVec2 },
    /// New normal of a plane.
    Normal(DQuat),
    /// New global rotation of a space.
    GlobalRotation(DQuat),
}

impl ComputeOutput {
    /// Write the result into `target`, which must be of the matching kind.
    pub fn apply(self, function: ComputeFn, uid: u32, target: &mut NodeKind) -> Result<()> {
        let mismatch = |expected| GraphError::ComputeTargetKind {
            function: function.as_str(),
            uid,
            expected,
        };
        match (self, target) {
            (ComputeOutput::Unchanged, _) => {}
            (ComputeOutput::Direction(direction), NodeKind::VanishingPoint(vp)) => {
                vp.direction = direction;
            }
            (
                ComputeOutput::DirectionWithHeading { direction, heading },
                NodeKind::VanishingPoint(vp),
            ) => {
                vp.direction = direction;
                vp.heading = Some(heading);
            }
            (ComputeOutput::Direction(_), _)
            | (ComputeOutput::DirectionWithHeading { .. }, _) => {
                return Err(mismatch("a vanishing point"));
            }
            (ComputeOutput::Normal(normal), NodeKind::Plane(plane)) => plane.set_normal(normal),
            (ComputeOutput::Normal(_), _) => return Err(mismatch("a plane")),
            (ComputeOutput::GlobalRotation(rotation), NodeKind::Space(space)) => {
                space.update_global_rotation(rotation);
            }
            (ComputeOutput::GlobalRotation(_), _) => return Err(mismatch("a space")),
        }
        Ok(())
    }
}

fn measure_direction(base: DQuat, src: DQuat) -> DQuat {
    let mut direction = normalize(src) - base;
    if length(direction) < MEASURE_EPSILON {
        direction = FORWARD;
    }
    normalize(direction)
}

/// Rotation of a rectangle resting on the plane, spanned from `base` toward
/// `target` on the canvas. `None` when the two rays hit opposite sides.
fn space_rotation(view: &Projection, normal: DQuat, base: DVec2, target: DVec2) -> Option<DQuat> {
    let base_ray = view.calc_direction(base);
    let target_ray = view.calc_direction(target);
    if dot(normal, base_ray) * dot(normal, target_ray) <= 0.0 {
        return None;
    }

    let base_3d = view.intersect_view_ray_canvas(base_ray);
    let target_3d = intersect_view_ray_and_plane(normal, base_3d, target_ray);
    let offset = target_3d - base_3d;

    let plane_rotation = rotation_between_vectors(UP, normal);
    let forward = rotate(plane_rotation, FORWARD);
    let rect_rotation = rotation_between_vectors(forward, offset);
    Some(rect_rotation * plane_rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::RectilinearProjection;
    use crate::scene::payload::{Plane, PerspectiveSpace};
    use glam::dvec2;

    fn vp(x: f64, y: f64, z: f64) -> NodeKind {
        VanishingPoint::from_direction(vec3(x, y, z)).into()
    }

    fn eval(function: ComputeFn, sources: &[NodeKind], params: &[f64]) -> Result<ComputeOutput> {
        function.evaluate(&ComputeInput {
            uid: 7,
            sources,
            params,
            view: None,
        })
    }

    fn direction(output: ComputeOutput) -> DQuat {
        match output {
            ComputeOutput::Direction(d) => d,
            ComputeOutput::DirectionWithHeading { direction, .. } => direction,
            other => panic!("not a direction: {other:?}"),
        }
    }

    fn close(a: DQuat, b: DQuat) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9 && (a.z - b.z).abs() < 1e-9
    }

    #[test]
    fn names_roundtrip() {
        for function in ComputeFn::ALL {
            assert_eq!(function.as_str().parse::<ComputeFn>(), Ok(function));
        }
        assert_eq!(
            "compute_nothing".parse::<ComputeFn>(),
            Err(GraphError::UnknownComputeFunction {
                name: "compute_nothing".into()
            })
        );
    }

    #[test]
    fn plane_normal_by_source_count() {
        let one = eval(ComputeFn::Plane, &[vp(0.0, 0.0, 2.0)], &[]).unwrap();
        assert_eq!(one, ComputeOutput::Normal(vec3(0.0, 0.0, 2.0)));

        let two = eval(ComputeFn::Plane, &[vp(2.0, 0.0, 0.0), vp(0.0, 0.0, 3.0)], &[]).unwrap();
        let ComputeOutput::Normal(normal) = two else {
            panic!("{two:?}")
        };
        assert!(close(normal, vec3(0.0, -1.0, 0.0)));

        let three = eval(ComputeFn::Plane, &[vp(1.0, 0.0, 0.0); 3], &[]).unwrap();
        assert_eq!(three, ComputeOutput::Normal(UP));
    }

    #[test]
    fn mirrored_flips_y() {
        let out = eval(ComputeFn::MirroredPoints, &[vp(0.0, 3.0, 4.0)], &[]).unwrap();
        assert!(close(direction(out), vec3(0.0, -0.6, 0.8)));
    }

    #[test]
    fn measure_points() {
        let out = eval(ComputeFn::MeasurePoints, &[vp(0.0, 0.0, 1.0)], &[1.0]).unwrap();
        let expected = normalize(vec3(-1.0, 0.0, 1.0));
        assert!(close(direction(out), expected));

        // Source equal to the base collapses; fall back to forward.
        let out = eval(ComputeFn::MeasurePoints, &[vp(1.0, 0.0, 0.0)], &[1.0]).unwrap();
        assert!(close(direction(out), FORWARD));

        assert!(matches!(
            eval(ComputeFn::MeasurePoints, &[vp(1.0, 0.0, 0.0)], &[]),
            Err(GraphError::MissingComputeParam { uid: 7, .. })
        ));
    }

    #[test]
    fn measure_points_from_two() {
        let sources = [vp(1.0, 0.0, 0.0), vp(0.0, 0.0, 1.0)];
        let out = eval(ComputeFn::MeasurePoints2, &sources, &[-1.0]).unwrap();
        assert!(close(direction(out), normalize(vec3(1.0, 0.0, 1.0))));
        assert_eq!(
            eval(ComputeFn::MeasurePoints2, &sources[..1], &[1.0]).unwrap(),
            ComputeOutput::Unchanged
        );
    }

    #[test]
    fn cross_product_needs_two() {
        let out = eval(
            ComputeFn::CrossProduct,
            &[vp(1.0, 0.0, 0.0), vp(0.0, 1.0, 0.0)],
            &[],
        )
        .unwrap();
        assert!(close(direction(out), vec3(0.0, 0.0, 1.0)));
        assert_eq!(
            eval(ComputeFn::CrossProduct, &[vp(1.0, 0.0, 0.0)], &[]).unwrap(),
            ComputeOutput::Unchanged
        );
    }

    #[test]
    fn direction_2d_sets_heading() {
        let mut a = VanishingPoint::from_direction(vec3(1.0, 0.0, 0.0));
        a.position = dvec2(10.0, 10.0);
        let mut b = VanishingPoint::from_direction(vec3(0.0, 1.0, 0.0));
        b.position = dvec2(13.0, 14.0);
        let sources = [a.into(), b.into()];

        let out = eval(ComputeFn::Direction2d, &sources, &[]).unwrap();
        assert_eq!(
            out,
            ComputeOutput::DirectionWithHeading {
                direction: vec3(0.0, 0.0, 1.0),
                heading: dvec2(3.0, 4.0),
            }
        );

        let out = eval(ComputeFn::Direction2d90, &sources, &[]).unwrap();
        let ComputeOutput::DirectionWithHeading { heading, .. } = out else {
            panic!("{out:?}")
        };
        assert_eq!(heading, dvec2(-4.0, 3.0));
    }

    #[test]
    fn horizon_from_elevation() {
        let out = eval(ComputeFn::Horizon1, &[vp(0.0, 0.0, 1.0)], &[]).unwrap();
        assert_eq!(out, ComputeOutput::Normal(vec3(0.0, 1.0, 0.0)));
    }

    #[test]
    fn source_kind_is_checked() {
        let err = eval(ComputeFn::Horizon1, &[Plane::default().into()], &[]).unwrap_err();
        assert_eq!(
            err,
            GraphError::ComputeSourceKind {
                function: "horizon_1",
                uid: 7,
                index: 0,
                expected: "a vanishing point",
            }
        );
    }

    #[test]
    fn target_kind_is_checked() {
        let mut plane: NodeKind = Plane::default().into();
        let err = ComputeOutput::Direction(FORWARD)
            .apply(ComputeFn::CrossProduct, 3, &mut plane)
            .unwrap_err();
        assert!(matches!(err, GraphError::ComputeTargetKind { uid: 3, .. }));
        ComputeOutput::Unchanged
            .apply(ComputeFn::CrossProduct, 3, &mut plane)
            .unwrap();
    }

    fn rect_input<'a>(sources: &'a [NodeKind], view: Option<&'a Projection>) -> ComputeInput<'a> {
        ComputeInput {
            uid: 9,
            sources,
            params: &[],
            view,
        }
    }

    #[test]
    fn space_2p_rect_aligns_with_ground() {
        let view: Projection =
            RectilinearProjection::new(dvec2(-100.0, 0.0), dvec2(100.0, 0.0)).into();
        let ground: NodeKind = Plane::default().into();
        let base = VanishingPoint::from_position(dvec2(0.0, -50.0));
        let ahead = VanishingPoint::from_position(dvec2(30.0, -20.0));
        let sources = [ground, base.into(), ahead.into()];

        let out = ComputeFn::Space2pRect
            .evaluate(&rect_input(&sources, Some(&view)))
            .unwrap();
        let ComputeOutput::GlobalRotation(rotation) = out else {
            panic!("{out:?}")
        };
        // The rotated up stays on the plane normal.
        assert!(close(rotate(rotation, UP), UP));

        let mut space: NodeKind = PerspectiveSpace::default().into();
        out.apply(ComputeFn::Space2pRect, 9, &mut space).unwrap();
        assert!(matches!(space, NodeKind::Space(s) if s.rotation == rotation));
    }

    #[test]
    fn space_2p_rect_rejects_opposite_sides() {
        let view: Projection =
            RectilinearProjection::new(dvec2(-100.0, 0.0), dvec2(100.0, 0.0)).into();
        let ground: NodeKind = Plane::default().into();
        let below = VanishingPoint::from_position(dvec2(0.0, -50.0));
        let above = VanishingPoint::from_position(dvec2(0.0, 50.0));
        let sources = [ground, below.into(), above.into()];
        let out = ComputeFn::Space2pRect
            .evaluate(&rect_input(&sources, Some(&view)))
            .unwrap();
        assert_eq!(out, ComputeOutput::Unchanged);

        assert_eq!(
            ComputeFn::Space2pRect.evaluate(&rect_input(&sources, None)),
            Err(GraphError::MissingView { uid: 9 })
        );
    }
}
