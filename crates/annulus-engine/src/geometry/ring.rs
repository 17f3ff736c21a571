use std::f32::consts::TAU;

use crate::error::{EngineError, EngineResult};

use super::{MeshData, VertexRecord};

/// Parameters for an annulus (or a disc when `radius_inner == 0`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RingParams {
    pub radius_outer: f32,
    pub radius_inner: f32,
    /// Angular steps around the full turn. Must be at least 3.
    pub subdivisions: u32,
    /// Straight RGBA in `[0, 1]`.
    pub color_outer: [f32; 4],
    pub color_inner: [f32; 4],
}

impl Default for RingParams {
    fn default() -> Self {
        Self {
            radius_outer: 0.5,
            radius_inner: 0.25,
            subdivisions: 24,
            color_outer: [0.1, 0.1, 0.1, 1.0],
            color_inner: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl RingParams {
    /// Filled disc of the given radius.
    pub fn disc(radius: f32, subdivisions: u32, color: [f32; 4]) -> Self {
        Self {
            radius_outer: radius,
            radius_inner: 0.0,
            subdivisions,
            color_outer: color,
            color_inner: color,
        }
    }

    fn validate(&self) -> EngineResult<()> {
        if self.subdivisions < 3 {
            return Err(EngineError::InvalidGeometryParameters(format!(
                "ring needs at least 3 subdivisions, got {}",
                self.subdivisions
            )));
        }
        if !self.radius_outer.is_finite() || !self.radius_inner.is_finite() {
            return Err(EngineError::InvalidGeometryParameters(
                "ring radii must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generates a ring as a triangle list.
///
/// Indexed output holds one outer/inner pair per step for steps `0..=subdivisions`
/// (the last pair sits at a full turn and closes the ring). Vertex `2i` is
/// outer, `2i + 1` is inner.
///
/// ```text
///  outer(i) ── outer(i+1)
///     │      ╱     │
///     │    ╱       │
///  inner(i) ── inner(i+1)
/// ```
///
/// Both forms wind counter-clockwise while `radius_outer > radius_inner`.
/// A larger inner radius is accepted and yields an inverted ring.
pub fn generate_ring(params: RingParams, indexed: bool) -> EngineResult<MeshData> {
    params.validate()?;

    let RingParams {
        radius_outer,
        radius_inner,
        subdivisions,
        color_outer,
        color_inner,
    } = params;

    let step = TAU / subdivisions as f32;
    let outer = |i: u32| {
        let (s, c) = (i as f32 * step).sin_cos();
        VertexRecord::new([c * radius_outer, s * radius_outer, 0.0]).with_color(color_outer)
    };
    let inner = |i: u32| {
        let (s, c) = (i as f32 * step).sin_cos();
        VertexRecord::new([c * radius_inner, s * radius_inner, 0.0]).with_color(color_inner)
    };

    let mesh = if indexed {
        let mut vertices = Vec::with_capacity(2 * (subdivisions as usize + 1));
        for i in 0..=subdivisions {
            vertices.push(outer(i));
            vertices.push(inner(i));
        }

        let mut indices = Vec::with_capacity(6 * subdivisions as usize);
        for i in 0..subdivisions {
            let o0 = 2 * i;
            let i0 = o0 + 1;
            let o1 = o0 + 2;
            let i1 = o0 + 3;
            indices.extend_from_slice(&[o0, o1, i0, i0, o1, i1]);
        }

        MeshData { vertices, indices: Some(indices), position_components: 2 }
    } else {
        let mut vertices = Vec::with_capacity(6 * subdivisions as usize);
        for i in 0..subdivisions {
            vertices.extend_from_slice(&[outer(i), outer(i + 1), inner(i)]);
            vertices.extend_from_slice(&[inner(i), outer(i + 1), inner(i + 1)]);
        }

        MeshData { vertices, indices: None, position_components: 2 }
    };

    log::trace!(
        "generated ring: {} vertices, {} indices",
        mesh.vertex_count(),
        mesh.index_count()
    );

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_area(tri: [&VertexRecord; 3]) -> f32 {
        let [a, b, c] = tri.map(|v| v.position);
        (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
    }

    // ── counts ────────────────────────────────────────────────────────────

    #[test]
    fn vertex_counts_match_both_forms() {
        for n in [3u32, 4, 24, 100] {
            let p = RingParams { subdivisions: n, ..RingParams::default() };
            let indexed = generate_ring(p, true).unwrap();
            let flat = generate_ring(p, false).unwrap();
            assert_eq!(indexed.vertex_count(), 2 * (n as usize + 1));
            assert_eq!(indexed.index_count(), 6 * n as usize);
            assert_eq!(flat.vertex_count(), 6 * n as usize);
            assert!(flat.indices.is_none());
        }
    }

    #[test]
    fn indices_stay_in_range() {
        let mesh = generate_ring(RingParams::default(), true).unwrap();
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.as_ref().unwrap().iter().all(|&i| i < count));
        assert!(mesh.validate().is_ok());
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn too_few_subdivisions_rejected() {
        let p = RingParams { subdivisions: 2, ..RingParams::default() };
        assert!(matches!(
            generate_ring(p, true),
            Err(EngineError::InvalidGeometryParameters(_))
        ));
    }

    #[test]
    fn inverted_radii_accepted() {
        let p = RingParams { radius_outer: 0.2, radius_inner: 0.6, ..RingParams::default() };
        assert!(generate_ring(p, false).is_ok());
    }

    // ── winding / colors / determinism ────────────────────────────────────

    #[test]
    fn triangles_wind_counter_clockwise() {
        for indexed in [true, false] {
            let mesh = generate_ring(RingParams::default(), indexed).unwrap();
            assert!(mesh.triangles().all(|t| signed_area(t) > 0.0));
        }
    }

    #[test]
    fn outer_and_inner_colors_assigned() {
        let p = RingParams::default();
        let mesh = generate_ring(p, true).unwrap();
        assert_eq!(mesh.vertices[0].color, Some(p.color_outer));
        assert_eq!(mesh.vertices[1].color, Some(p.color_inner));
        let r = mesh.vertices[0].position;
        assert!((r[0] - p.radius_outer).abs() < 1e-6);
        assert_eq!(r[1], 0.0);
    }

    #[test]
    fn indexed_ring_closes_at_full_turn() {
        let mesh = generate_ring(RingParams::default(), true).unwrap();
        let first = mesh.vertices[0].position;
        let last = mesh.vertices[mesh.vertex_count() - 2].position;
        assert!((first[0] - last[0]).abs() < 1e-5);
        assert!((first[1] - last[1]).abs() < 1e-5);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_ring(RingParams::default(), false).unwrap();
        let b = generate_ring(RingParams::default(), false).unwrap();
        assert_eq!(a, b);
    }
}
