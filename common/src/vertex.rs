use glam::{Vec2, Vec3};

pub trait Vertex: bytemuck::Pod {
    fn position(&self) -> Vec3;
}

/// Position plus normalised texture coordinate, ready to hand to a renderer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UVVertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl UVVertex {
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self { position, uv }
    }
}

impl Vertex for UVVertex {
    fn position(&self) -> Vec3 {
        self.position
    }
}
