use crate::vertex::Vertex;

/// Indexed triangle list, grown one convex polygon at a time.
#[derive(Debug, Clone)]
pub struct MeshBuilder<V: Vertex> {
    tris: Vec<u32>,
    verts: Vec<V>,
}

impl<V: Vertex> Default for MeshBuilder<V> {
    fn default() -> Self {
        Self {
            tris: Vec::new(),
            verts: Vec::new(),
        }
    }
}

impl<V: Vertex> MeshBuilder<V> {
    pub fn add_tri(&mut self, tri: [u32; 3]) {
        self.tris.extend_from_slice(&tri);
    }

    /// Append a convex polygon as a triangle fan rooted at its first vertex.
    /// Polygons with fewer than three vertices are ignored.
    pub fn add_polygon(&mut self, polygon: &[V]) {
        if polygon.len() < 3 {
            return;
        }
        let base = self.verts.len() as u32;
        self.verts.extend_from_slice(polygon);

        for i in 1..(polygon.len() as u32 - 1) {
            self.add_tri([base, base + i, base + i + 1]);
        }
    }

    /// Index pairs for drawing every triangle edge as a line.
    pub fn tris_to_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = Vec::with_capacity(self.tris.len() * 2);

        for tri in self.tris.chunks_exact(3) {
            lines.push(tri[0]);
            lines.push(tri[1]);

            lines.push(tri[1]);
            lines.push(tri[2]);

            lines.push(tri[2]);
            lines.push(tri[0]);
        }

        lines
    }

    pub fn tris(&self) -> &[u32] {
        &self.tris
    }

    pub fn verts(&self) -> &[V] {
        &self.verts
    }

    pub fn triangle_count(&self) -> usize {
        self.tris.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }
}
