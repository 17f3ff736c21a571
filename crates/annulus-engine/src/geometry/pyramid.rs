use crate::error::{EngineError, EngineResult};

use super::{MeshData, VertexRecord};

/// Square-based pyramid standing on the z axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PyramidParams {
    /// Half the side length of the square base.
    pub half_extent: f32,
    pub base_z: f32,
    pub apex_z: f32,
    pub base_color: [f32; 4],
    pub apex_color: [f32; 4],
}

impl Default for PyramidParams {
    fn default() -> Self {
        Self {
            half_extent: 0.53,
            base_z: -0.3,
            apex_z: 0.53,
            base_color: [0.0, 0.0, 80.0 / 255.0, 1.0],
            apex_color: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

// Base corners 0..4 counter-clockwise seen from +z, apex 4.
// Every face winds counter-clockwise seen from outside.
const FACES: [u32; 18] = [
    0, 2, 1, 0, 3, 2, // base, seen from below
    0, 1, 4, //
    1, 2, 4, //
    2, 3, 4, //
    3, 0, 4, //
];

/// Generates a pyramid.
///
/// Indexed: 5 shared vertices (base color on the base, apex color on the tip).
/// Non-indexed: 18 vertices carrying the outward normal of their face, all in
/// the base color, for flat shading.
pub fn generate_pyramid(params: PyramidParams, indexed: bool) -> EngineResult<MeshData> {
    let PyramidParams { half_extent: h, base_z, apex_z, base_color, apex_color } = params;

    if !(h.is_finite() && h > 0.0) {
        return Err(EngineError::InvalidGeometryParameters(format!(
            "pyramid half extent must be positive, got {h}"
        )));
    }
    if !base_z.is_finite() || !apex_z.is_finite() || base_z == apex_z {
        return Err(EngineError::InvalidGeometryParameters(
            "pyramid needs distinct finite base and apex heights".to_string(),
        ));
    }

    let corners = [
        [-h, -h, base_z],
        [h, -h, base_z],
        [h, h, base_z],
        [-h, h, base_z],
        [0.0, 0.0, apex_z],
    ];

    if indexed {
        let vertices = corners
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let color = if i == 4 { apex_color } else { base_color };
                VertexRecord::new(p).with_color(color)
            })
            .collect();
        return Ok(MeshData { vertices, indices: Some(FACES.to_vec()), position_components: 3 });
    }

    let mut vertices = Vec::with_capacity(FACES.len());
    for tri in FACES.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| corners[i as usize]);
        let normal = face_normal(a, b, c);
        for p in [a, b, c] {
            vertices.push(VertexRecord::new(p).with_normal(normal).with_color(base_color));
        }
    }

    Ok(MeshData { vertices, indices: None, position_components: 3 })
}

fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len == 0.0 {
        return [0.0, 0.0, 0.0];
    }
    [n[0] / len, n[1] / len, n[2] / len]
}
