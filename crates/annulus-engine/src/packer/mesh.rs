use crate::error::EngineResult;
use crate::geometry::MeshData;
use crate::layout::BufferLayout;

use super::PackedBuffer;

/// Packs a mesh into a vertex buffer laid out by `layout`.
///
/// Fields are matched by name: `position`, `normal` and `color`. Missing
/// fields are skipped, as are vertices without a normal or color. A 4-wide
/// position gets `w = 1`.
pub fn pack_mesh(mesh: &MeshData, layout: &BufferLayout) -> EngineResult<PackedBuffer> {
    mesh.validate()?;

    let mut buffer = PackedBuffer::new(layout.clone(), mesh.vertex_count());
    let position = layout.field("position").cloned();
    let normal = layout.field("normal").cloned();
    let color = layout.field("color").cloned();

    for (i, v) in mesh.vertices.iter().enumerate() {
        if let Some(field) = &position {
            let full = [v.position[0], v.position[1], v.position[2], 1.0];
            let n = (field.components as usize).min(4);
            buffer.write_f32(i, field.offset, &full[..n])?;
        }

        if let (Some(field), Some(n)) = (&normal, v.normal) {
            let k = (field.components as usize).min(3);
            buffer.write_f32(i, field.offset, &n[..k])?;
        }

        if let (Some(field), Some(c)) = (&color, v.color) {
            if field.is_byte_packed() {
                buffer.write_unorm8x4(i, field.offset, c)?;
            } else {
                let k = (field.components as usize).min(4);
                buffer.write_f32(i, field.offset, &c[..k])?;
            }
        }
    }

    Ok(buffer)
}
