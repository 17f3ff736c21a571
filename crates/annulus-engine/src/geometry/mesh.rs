use crate::error::{EngineError, EngineResult};

/// One generated vertex.
///
/// Colors stay in `[0, 1]` floats here; byte conversion happens when the mesh
/// is packed into a GPU buffer.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct VertexRecord {
    /// Position. Only the first `MeshData::position_components` entries are meaningful.
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub color: Option<[f32; 4]>,
}

impl VertexRecord {
    #[inline]
    pub const fn new(position: [f32; 3]) -> Self {
        Self { position, normal: None, color: None }
    }

    #[inline]
    pub const fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }

    #[inline]
    pub const fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = Some(normal);
        self
    }
}

/// Vertex list plus optional triangle-list indices.
///
/// Invariant (checked by [`MeshData::validate`]): every index is below the
/// vertex count and the index count is a multiple of 3.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<VertexRecord>,
    pub indices: Option<Vec<u32>>,
    /// 2 for planar meshes, 3 for spatial ones.
    pub position_components: u8,
}

impl MeshData {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of elements a draw call consumes: indices when present, vertices otherwise.
    #[inline]
    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertices.len() as u32,
        }
    }

    /// Triangle count of the triangle list.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.draw_count() as usize / 3
    }

    /// Index data as little-endian `u32` bytes (empty for non-indexed meshes).
    pub fn index_bytes(&self) -> &[u8] {
        match &self.indices {
            Some(indices) => bytemuck::cast_slice(indices),
            None => &[],
        }
    }

    /// Checks the triangle-list invariant.
    pub fn validate(&self) -> EngineResult<()> {
        if !matches!(self.position_components, 2 | 3) {
            return Err(EngineError::InvalidGeometryParameters(format!(
                "position_components must be 2 or 3, got {}",
                self.position_components
            )));
        }

        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(EngineError::InvalidGeometryParameters(format!(
                        "index count {} is not a multiple of 3",
                        indices.len()
                    )));
                }
                let count = self.vertices.len() as u32;
                if let Some(bad) = indices.iter().copied().find(|&i| i >= count) {
                    return Err(EngineError::InvalidGeometryParameters(format!(
                        "index {bad} out of range for {count} vertices"
                    )));
                }
            }
            None => {
                if self.vertices.len() % 3 != 0 {
                    return Err(EngineError::InvalidGeometryParameters(format!(
                        "vertex count {} is not a multiple of 3",
                        self.vertices.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Iterates triangles as vertex triples in draw order.
    pub fn triangles(&self) -> impl Iterator<Item = [&VertexRecord; 3]> + '_ {
        let n = self.triangle_count();
        (0..n).map(move |t| {
            let at = |k: usize| -> &VertexRecord {
                match &self.indices {
                    Some(indices) => &self.vertices[indices[3 * t + k] as usize],
                    None => &self.vertices[3 * t + k],
                }
            };
            [at(0), at(1), at(2)]
        })
    }

    /// 2D positions in draw order, flattened as `x, y` pairs.
    ///
    /// Indexed meshes are expanded. Used when a shader reads vertices out of a
    /// storage array instead of a vertex buffer.
    pub fn expanded_positions_2d(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.draw_count() as usize * 2);
        for tri in self.triangles() {
            for v in tri {
                out.push(v.position[0]);
                out.push(v.position[1]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> MeshData {
        MeshData {
            vertices: vec![
                VertexRecord::new([0.0, 0.0, 0.0]),
                VertexRecord::new([1.0, 0.0, 0.0]),
                VertexRecord::new([0.0, 1.0, 0.0]),
            ],
            indices: None,
            position_components: 2,
        }
    }

    #[test]
    fn validate_accepts_plain_triangle() {
        assert!(tri().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut m = tri();
        m.indices = Some(vec![0, 1, 3]);
        assert!(matches!(m.validate(), Err(EngineError::InvalidGeometryParameters(_))));
    }

    #[test]
    fn validate_rejects_partial_triangle() {
        let mut m = tri();
        m.indices = Some(vec![0, 1]);
        assert!(m.validate().is_err());
    }

    #[test]
    fn index_bytes_are_little_endian() {
        let mut m = tri();
        m.indices = Some(vec![0, 1, 258]);
        let bytes = m.index_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[8..12], &258u32.to_le_bytes());
    }

    #[test]
    fn expanded_positions_follow_indices() {
        let mut m = tri();
        m.indices = Some(vec![2, 1, 0]);
        assert_eq!(m.expanded_positions_2d(), vec![0.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    }
}
