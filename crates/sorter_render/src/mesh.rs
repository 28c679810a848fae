use glam::Vec2;

use crate::vertex::QuadVertex;

/// CPU-side quad list, rebuilt every frame and streamed into GPU buffers.
#[derive(Debug, Default)]
pub struct QuadMesh {
    pub vertices: Vec<QuadVertex>,
    pub indices: Vec<u32>,
}

impl QuadMesh {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn push_rect(&mut self, center: Vec2, size: Vec2, color: [f32; 4]) {
        let half = size * 0.5;
        let base_index = self.vertices.len() as u32;
        let corners = [
            [center.x - half.x, center.y - half.y],
            [center.x + half.x, center.y - half.y],
            [center.x + half.x, center.y + half.y],
            [center.x - half.x, center.y + half.y],
        ];
        for position in corners {
            self.vertices.push(QuadVertex { position, color });
        }
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
    }

    /// Hollow rectangle made of four edge quads.
    pub fn push_frame(&mut self, center: Vec2, size: Vec2, thickness: f32, color: [f32; 4]) {
        let half = size * 0.5;
        let t = thickness.min(half.x).min(half.y);
        self.push_rect(
            Vec2::new(center.x, center.y + half.y - t * 0.5),
            Vec2::new(size.x, t),
            color,
        );
        self.push_rect(
            Vec2::new(center.x, center.y - half.y + t * 0.5),
            Vec2::new(size.x, t),
            color,
        );
        self.push_rect(
            Vec2::new(center.x - half.x + t * 0.5, center.y),
            Vec2::new(t, size.y - 2.0 * t),
            color,
        );
        self.push_rect(
            Vec2::new(center.x + half.x - t * 0.5, center.y),
            Vec2::new(t, size.y - 2.0 * t),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rect_emits_two_triangles() {
        let mut mesh = QuadMesh::default();
        mesh.push_rect(Vec2::new(1.0, 1.0), Vec2::new(2.0, 4.0), [1.0; 4]);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices[0].position, [0.0, -1.0]);
        assert_eq!(mesh.vertices[2].position, [2.0, 3.0]);
    }

    #[test]
    fn indices_offset_by_previous_quads() {
        let mut mesh = QuadMesh::default();
        mesh.push_rect(Vec2::ZERO, Vec2::ONE, [1.0; 4]);
        mesh.push_rect(Vec2::ZERO, Vec2::ONE, [1.0; 4]);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.quad_count(), 2);
    }

    #[test]
    fn frame_is_four_quads_and_clear_resets() {
        let mut mesh = QuadMesh::with_capacity(4);
        mesh.push_frame(Vec2::ZERO, Vec2::splat(2.0), 0.1, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.quad_count(), 4);
        mesh.clear();
        assert_eq!(mesh.quad_count(), 0);
        assert!(mesh.indices.is_empty());
    }
}
