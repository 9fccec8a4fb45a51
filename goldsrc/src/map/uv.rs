use glam::{DVec2, DVec3};

use super::face::{FaceRecord, TexProjection};

/// Orthonormal in-plane pair used to order face vertices.
pub fn face_basis(normal: DVec3) -> (DVec3, DVec3) {
    let tangent = if normal.dot(DVec3::Z).abs() > 0.99 {
        DVec3::Y
    } else {
        DVec3::Z
    };
    let u = normal.cross(tangent).normalize();
    let v = normal.cross(u).normalize();
    (u, v)
}

/// Unrotated texture axes of the rotation-based dialect, picked by the dominant normal
/// component. Ties favour Z, then X.
pub fn quake_axes(normal: DVec3) -> (DVec3, DVec3) {
    let abs = normal.abs();
    if abs.z >= abs.x && abs.z >= abs.y {
        (DVec3::X, DVec3::NEG_Y)
    } else if abs.x >= abs.y {
        (DVec3::Y, DVec3::NEG_Z)
    } else {
        (DVec3::X, DVec3::NEG_Z)
    }
}

pub fn rotate_axes(u: DVec3, v: DVec3, degrees: f64) -> (DVec3, DVec3) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (u * cos - v * sin, u * sin + v * cos)
}

fn nonzero(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

/// Texture axes of one face resolved against one texture size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexMapping {
    pub u_axis: DVec3,
    pub v_axis: DVec3,
    pub offset: DVec2,
    pub scale: DVec2,
    pub size: DVec2,
}

impl TexMapping {
    pub fn new(face: &FaceRecord, width: u32, height: u32) -> Self {
        let (u_axis, v_axis, offset) = match face.projection {
            TexProjection::Valve { u_axis, v_axis } => (
                u_axis.truncate(),
                v_axis.truncate(),
                DVec2::new(u_axis.w, v_axis.w),
            ),
            TexProjection::Quake { offset } => {
                let (u, v) = quake_axes(face.plane.normal);
                let (u, v) = rotate_axes(u, v, face.rotation);
                (u, v, offset)
            }
        };

        Self {
            u_axis,
            v_axis,
            offset,
            scale: DVec2::new(nonzero(face.scale.x), nonzero(face.scale.y)),
            size: DVec2::new(width.max(1) as f64, height.max(1) as f64),
        }
    }

    /// Texture coordinate in texture widths; values outside `0..1` tile.
    pub fn project(&self, vertex: DVec3) -> DVec2 {
        let texel = DVec2::new(
            vertex.dot(self.u_axis) / self.scale.x,
            vertex.dot(self.v_axis) / self.scale.y,
        ) + self.offset;
        texel / self.size
    }
}

pub fn project(vertex: DVec3, face: &FaceRecord, width: u32, height: u32) -> DVec2 {
    TexMapping::new(face, width, height).project(vertex)
}
