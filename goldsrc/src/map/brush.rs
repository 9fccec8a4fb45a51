use glam::{DVec2, DVec3};

use crate::error::{GeometryWarning, Warnings};

use super::{
    face::{FaceRecord, Plane},
    uv::face_basis,
};

/// Triples of planes closer to parallel than this have no single intersection.
pub const PARALLEL_EPSILON: f64 = 1e-6;
/// How far outside a half-space a corner may lie and still belong to the solid.
pub const INSIDE_EPSILON: f64 = 1e-4;
/// Squared distance under which two corners are the same corner.
pub const WELD_EPSILON: f64 = 1e-6;
/// Distance under which a corner lies on a face.
pub const ON_PLANE_EPSILON: f64 = 1e-3;

/// Minimum number of half-spaces that can bound a solid.
pub const MIN_FACES: usize = 4;

/// The point shared by three planes, if they meet in exactly one.
pub fn intersect(p0: &Plane, p1: &Plane, p2: &Plane) -> Option<DVec3> {
    let (n0, n1, n2) = (p0.normal, p1.normal, p2.normal);

    let denominator = n0.dot(n1.cross(n2));
    if denominator.abs() < PARALLEL_EPSILON {
        return None;
    }

    let numerator = n1.cross(n2) * -p0.constant
        + n2.cross(n0) * -p1.constant
        + n0.cross(n1) * -p2.constant;
    Some(numerator / denominator)
}

pub fn is_inside(point: DVec3, planes: &[Plane]) -> bool {
    planes
        .iter()
        .all(|plane| plane.distance_to_point(point) < INSIDE_EPSILON)
}

/// Corners of the convex solid bounded by `planes`, in discovery order.
pub fn vertices(planes: &[Plane]) -> Vec<DVec3> {
    let mut verts: Vec<DVec3> = Vec::new();
    let len = planes.len();

    for i0 in 0..len {
        for i1 in i0 + 1..len {
            for i2 in i1 + 1..len {
                let Some(point) = intersect(&planes[i0], &planes[i1], &planes[i2]) else {
                    continue;
                };
                if !is_inside(point, planes) {
                    continue;
                }
                if verts
                    .iter()
                    .any(|v| v.distance_squared(point) < WELD_EPSILON)
                {
                    continue;
                }
                verts.push(point);
            }
        }
    }

    verts
}

/// The corners lying on `plane`, sorted by angle around their centroid.
///
/// `None` when fewer than three corners touch the plane.
pub fn face_polygon(plane: &Plane, verts: &[DVec3]) -> Option<Vec<DVec3>> {
    let mut on_face: Vec<DVec3> = verts
        .iter()
        .copied()
        .filter(|v| plane.distance_to_point(*v).abs() < ON_PLANE_EPSILON)
        .collect();
    if on_face.len() < 3 {
        return None;
    }

    let (u, v) = face_basis(plane.normal);
    let flat = |p: DVec3| DVec2::new(p.dot(u), p.dot(v));

    let center = on_face.iter().map(|p| flat(*p)).sum::<DVec2>() / on_face.len() as f64;
    let angle = |p: &DVec3| {
        let d = flat(*p) - center;
        d.y.atan2(d.x)
    };
    on_face.sort_by(|a, b| angle(a).total_cmp(&angle(b)));

    Some(on_face)
}

/// One face's outline, in winding order.
#[derive(Debug, Clone, PartialEq)]
pub struct FacePolygon {
    /// Index into the brush's faces.
    pub face: usize,
    pub vertices: Vec<DVec3>,
}

/// The reconstructed surface of one brush.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub vertices: Vec<DVec3>,
    pub polygons: Vec<FacePolygon>,
}

/// A convex solid as written in the map: one record per bounding plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Position among the document's brushes, used when reporting problems.
    pub index: usize,
    pub faces: Vec<FaceRecord>,
}

impl Brush {
    pub fn new(index: usize, faces: Vec<FaceRecord>) -> Self {
        Self { index, faces }
    }

    pub fn planes(&self) -> Vec<Plane> {
        self.faces.iter().map(|f| f.plane).collect()
    }

    pub fn vertices(&self) -> Vec<DVec3> {
        vertices(&self.planes())
    }

    /// Rebuild corners and face outlines.
    ///
    /// Brushes with too few faces, or whose planes enclose nothing, give `None` and a
    /// warning. Faces that touch fewer than three corners are dropped with a warning.
    pub fn reconstruct(&self, warnings: &mut Warnings) -> Option<Solid> {
        if self.faces.len() < MIN_FACES {
            warnings.push(GeometryWarning::TooFewFaces {
                brush: self.index,
                faces: self.faces.len(),
            });
            return None;
        }

        let vertices = self.vertices();
        if vertices.is_empty() {
            warnings.push(GeometryWarning::NoVertices { brush: self.index });
            return None;
        }

        let mut polygons = Vec::with_capacity(self.faces.len());
        for (face, record) in self.faces.iter().enumerate() {
            match face_polygon(&record.plane, &vertices) {
                Some(outline) => polygons.push(FacePolygon {
                    face,
                    vertices: outline,
                }),
                None => warnings.push(GeometryWarning::DegeneratePolygon {
                    brush: self.index,
                    face,
                    vertices: vertices
                        .iter()
                        .filter(|v| record.plane.distance_to_point(**v).abs() < ON_PLANE_EPSILON)
                        .count(),
                }),
            }
        }

        Some(Solid { vertices, polygons })
    }
}

#[cfg(test)]
mod brush_tests {
    use super::*;
    use crate::map::{parse, MapDocument};

    const CUBE: &str = "
{
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) rock 0 0 0 1 1
( -64 -64 -16 ) ( -64 -64 -15 ) ( -63 -64 -16 ) rock 0 0 0 1 1
( -64 -64 -16 ) ( -63 -64 -16 ) ( -64 -63 -16 ) rock 0 0 0 1 1
( 64 64 16 ) ( 64 65 16 ) ( 65 64 16 ) rock 0 0 0 1 1
( 64 64 16 ) ( 65 64 16 ) ( 64 64 17 ) rock 0 0 0 1 1
( 64 64 16 ) ( 64 64 17 ) ( 64 65 16 ) rock 0 0 0 1 1
}
";

    fn document(text: &str) -> MapDocument {
        let mut warnings = Warnings::default();
        let doc = parse(text, &mut warnings);
        assert!(warnings.is_empty());
        doc
    }

    fn plane(normal: DVec3, distance: f64) -> Plane {
        Plane {
            normal,
            constant: -distance,
        }
    }

    #[test]
    fn box_has_eight_corners_and_six_quads() {
        let doc = document(CUBE);
        let brush = &doc.brushes[0];
        let mut warnings = Warnings::default();

        let solid = brush.reconstruct(&mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(solid.vertices.len(), 8);
        for corner in &solid.vertices {
            assert_eq!(corner.x.abs(), 64.0);
            assert_eq!(corner.y.abs(), 64.0);
            assert_eq!(corner.z.abs(), 16.0);
        }

        assert_eq!(solid.polygons.len(), 6);
        assert!(solid.polygons.iter().all(|p| p.vertices.len() == 4));
    }

    #[test]
    fn polygon_winds_around_the_face() {
        let doc = document(CUBE);
        let solid = doc.brushes[0]
            .reconstruct(&mut Warnings::default())
            .unwrap();

        for polygon in &solid.polygons {
            let v = &polygon.vertices;
            // consecutive corners of a sorted quad share an edge, so differ in one axis
            for i in 0..4 {
                let d = v[(i + 1) % 4] - v[i];
                let changed = [d.x, d.y, d.z].iter().filter(|c| c.abs() > 1e-9).count();
                assert_eq!(changed, 1, "{:?}", v);
            }
        }
    }

    #[test]
    fn three_faces_are_too_few() {
        let text = CUBE.lines().take(5).collect::<Vec<_>>().join("\n");
        let doc = document(&text);
        let mut warnings = Warnings::default();

        assert!(doc.brushes[0].reconstruct(&mut warnings).is_none());
        assert_eq!(
            warnings.as_slice(),
            &[GeometryWarning::TooFewFaces { brush: 0, faces: 3 }]
        );
    }

    #[test]
    fn contradicting_planes_enclose_nothing() {
        // x <= -1 and x >= 1 can never both hold
        let planes = [
            plane(DVec3::X, -1.0),
            plane(DVec3::NEG_X, -1.0),
            plane(DVec3::Y, 1.0),
            plane(DVec3::NEG_Y, 1.0),
            plane(DVec3::Z, 1.0),
            plane(DVec3::NEG_Z, 1.0),
        ];
        assert!(vertices(&planes).is_empty());
    }

    #[test]
    fn brush_facing_away_from_itself_has_no_corners() {
        // both x faces turned inside out: x <= -64 and x >= 64
        let text = CUBE
            .replace(
                "( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 )",
                "( -64 -64 -16 ) ( -64 -64 -15 ) ( -64 -63 -16 )",
            )
            .replace(
                "( 64 64 16 ) ( 64 64 17 ) ( 64 65 16 )",
                "( 64 64 16 ) ( 64 65 16 ) ( 64 64 17 )",
            );
        let doc = document(&text);
        let mut warnings = Warnings::default();

        assert!(doc.brushes[0].reconstruct(&mut warnings).is_none());
        assert_eq!(
            warnings.as_slice(),
            &[GeometryWarning::NoVertices { brush: 0 }]
        );
    }

    #[test]
    fn face_resting_on_an_edge_is_dropped() {
        // x + y <= 128 only touches the box along its x = y = 64 edge
        let text = CUBE.replace(
            "}",
            "( 64 64 16 ) ( 65 63 16 ) ( 64 64 17 ) rock 0 0 0 1 1\n}",
        );
        let doc = document(&text);
        assert_eq!(doc.brushes[0].faces.len(), 7);
        let mut warnings = Warnings::default();

        let solid = doc.brushes[0].reconstruct(&mut warnings).unwrap();
        assert_eq!(solid.vertices.len(), 8);
        assert_eq!(solid.polygons.len(), 6);
        assert!(solid.polygons.iter().all(|p| p.face != 6));
        assert_eq!(
            warnings.as_slice(),
            &[GeometryWarning::DegeneratePolygon {
                brush: 0,
                face: 6,
                vertices: 2,
            }]
        );
    }

    #[test]
    fn parallel_triples_are_skipped() {
        let a = plane(DVec3::X, 1.0);
        let b = plane(DVec3::NEG_X, 1.0);
        let c = plane(DVec3::Y, 1.0);
        assert!(intersect(&a, &b, &c).is_none());

        let d = plane(DVec3::Z, 2.0);
        assert_eq!(intersect(&a, &c, &d), Some(DVec3::new(1.0, 1.0, 2.0)));
    }

    #[test]
    fn tetrahedron_has_triangular_faces() {
        let planes = [
            plane(DVec3::NEG_X, 0.0),
            plane(DVec3::NEG_Y, 0.0),
            plane(DVec3::NEG_Z, 0.0),
            plane(DVec3::ONE.normalize(), 10.0 / 3f64.sqrt()),
        ];
        let verts = vertices(&planes);
        assert_eq!(verts.len(), 4);

        for plane in &planes {
            assert_eq!(face_polygon(plane, &verts).unwrap().len(), 3);
        }
    }

    #[test]
    fn face_touching_an_edge_has_no_polygon() {
        let verts = [DVec3::ZERO, DVec3::X, DVec3::new(5.0, 5.0, 5.0)];
        assert!(face_polygon(&plane(DVec3::Z, 0.0), &verts).is_none());
    }
}
