use glam::{DVec2, DVec3, DVec4};
use regex::Captures;

use super::MapFormat;

/// Normals shorter than this before normalising mean the three points were collinear.
const MIN_NORMAL_LENGTH: f64 = 1e-9;

/// A half-space boundary. Points with a non-positive distance are inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub constant: f64,
}

impl Plane {
    /// Plane through `a`, `b` and `c`, with normal `(c - b) x (a - b)`.
    ///
    /// Swapping any two points flips the normal. Returns `None` for collinear points.
    pub fn from_coplanar_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let normal = (c - b).cross(a - b);
        if normal.length() < MIN_NORMAL_LENGTH {
            return None;
        }
        let normal = normal.normalize();
        Some(Self {
            normal,
            constant: -a.dot(normal),
        })
    }

    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.constant
    }
}

/// Texture placement parameters, one variant per map dialect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TexProjection {
    /// Explicit axes; `w` of each axis is its texel offset.
    Valve { u_axis: DVec4, v_axis: DVec4 },
    /// Axes derived from the face normal, then rotated.
    Quake { offset: DVec2 },
}

/// One plane line of a brush block.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRecord {
    pub points: [DVec3; 3],
    pub plane: Plane,
    pub texture: String,
    pub projection: TexProjection,
    /// Degrees.
    pub rotation: f64,
    pub scale: DVec2,
}

impl FaceRecord {
    pub fn format(&self) -> MapFormat {
        match self.projection {
            TexProjection::Valve { .. } => MapFormat::Valve,
            TexProjection::Quake { .. } => MapFormat::Quake,
        }
    }

    /// Build from a matched plane line. `None` when the defining points are collinear.
    pub(super) fn from_captures(caps: &Captures, format: MapFormat) -> Option<Self> {
        let num = |i: usize| -> f64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0)
        };
        let point = |first: usize| DVec3::new(num(first), num(first + 1), num(first + 2));

        let points = [point(1), point(4), point(7)];
        let texture = caps.get(10).map(|m| m.as_str()).unwrap_or_default().to_owned();

        // Points are listed clockwise seen from outside; reorder so the normal faces out.
        let plane = Plane::from_coplanar_points(points[0], points[2], points[1])?;

        let (projection, rotation, scale) = match format {
            MapFormat::Valve => (
                TexProjection::Valve {
                    u_axis: DVec4::new(num(11), num(12), num(13), num(14)),
                    v_axis: DVec4::new(num(15), num(16), num(17), num(18)),
                },
                num(19),
                DVec2::new(num(20), num(21)),
            ),
            MapFormat::Quake => (
                TexProjection::Quake {
                    offset: DVec2::new(num(11), num(12)),
                },
                num(13),
                DVec2::new(num(14), num(15)),
            ),
        };

        Some(Self {
            points,
            plane,
            texture,
            projection,
            rotation,
            scale,
        })
    }
}
