use std::ops::Range;

use crate::error::{EngineError, EngineResult};
use crate::layout::{AttributeField, BufferLayout, BufferLayoutPlan};

/// Byte image of one planned buffer.
///
/// Holds `count × stride` bytes, zero-initialized. Every accessor is bounded
/// by a single element: a write that would spill past its element's stride is
/// rejected before any byte changes. The size is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBuffer {
    layout: BufferLayout,
    count: usize,
    bytes: Vec<u8>,
}

impl PackedBuffer {
    pub fn new(layout: BufferLayout, count: usize) -> Self {
        let bytes = vec![0u8; layout.size_for(count)];
        Self { layout, count, bytes }
    }

    #[inline]
    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.layout.stride as usize
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The exact bytes to upload.
    #[inline]
    pub fn materialize(&self) -> &[u8] {
        &self.bytes
    }

    fn span(&self, element: usize, field_offset: u32, len: usize) -> EngineResult<Range<usize>> {
        let stride = self.stride();
        // Saturating: the range only reports a rejected write.
        let start = element.saturating_mul(stride).saturating_add(field_offset as usize);
        let end = start.saturating_add(len);
        let fits = (field_offset as usize)
            .checked_add(len)
            .is_some_and(|field_end| field_end <= stride);
        if element >= self.count || !fits {
            return Err(EngineError::WriteOutOfBounds {
                buffer: self.layout.index,
                start,
                end,
                len: self.bytes.len(),
            });
        }
        Ok(start..end)
    }

    fn field(&self, name: &str) -> EngineResult<&AttributeField> {
        self.layout.field(name).ok_or_else(|| EngineError::LayoutConflict {
            buffer: self.layout.index,
            field: name.to_string(),
            reason: "no such field".to_string(),
        })
    }

    pub fn write_f32(&mut self, element: usize, field_offset: u32, values: &[f32]) -> EngineResult<()> {
        let span = self.span(element, field_offset, values.len() * 4)?;
        for (chunk, v) in self.bytes[span].chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    pub fn write_u32(&mut self, element: usize, field_offset: u32, values: &[u32]) -> EngineResult<()> {
        let span = self.span(element, field_offset, values.len() * 4)?;
        for (chunk, v) in self.bytes[span].chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Writes a color as four normalized bytes.
    ///
    /// Channels are clamped to `[0, 1]`, scaled by 255 and rounded to nearest.
    pub fn write_unorm8x4(&mut self, element: usize, field_offset: u32, rgba: [f32; 4]) -> EngineResult<()> {
        let span = self.span(element, field_offset, 4)?;
        self.bytes[span].copy_from_slice(&rgba.map(unorm8));
        Ok(())
    }

    /// Writes floats into a named field, refusing more values than the field holds.
    pub fn write_field_f32(&mut self, element: usize, name: &str, values: &[f32]) -> EngineResult<()> {
        let field = self.field(name)?;
        let (offset, size) = (field.offset, field.size() as usize);
        if values.len() * 4 > size {
            let start = element.saturating_mul(self.stride()).saturating_add(offset as usize);
            return Err(EngineError::WriteOutOfBounds {
                buffer: self.layout.index,
                start,
                end: start.saturating_add(values.len() * 4),
                len: self.bytes.len(),
            });
        }
        self.write_f32(element, offset, values)
    }

    pub fn write_field_unorm8x4(&mut self, element: usize, name: &str, rgba: [f32; 4]) -> EngineResult<()> {
        let offset = self.field(name)?.offset;
        self.write_unorm8x4(element, offset, rgba)
    }

    pub fn read_f32(&self, element: usize, field_offset: u32, count: usize) -> EngineResult<Vec<f32>> {
        let span = self.span(element, field_offset, count * 4)?;
        Ok(self.bytes[span]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    pub fn read_bytes(&self, element: usize, field_offset: u32, len: usize) -> EngineResult<&[u8]> {
        let span = self.span(element, field_offset, len)?;
        Ok(&self.bytes[span])
    }
}

#[inline]
fn unorm8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Structure-of-arrays image of several buffers laid end to end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SoaBytes {
    pub bytes: Vec<u8>,
    /// Byte offset of each section, in buffer order.
    pub offsets: Vec<usize>,
}

/// One [`PackedBuffer`] per buffer of a plan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedBuffers {
    buffers: Vec<PackedBuffer>,
}

impl PackedBuffers {
    /// Allocates every buffer of `plan`, `counts[i]` elements for buffer `i`.
    pub fn allocate(plan: &BufferLayoutPlan, counts: &[usize]) -> EngineResult<Self> {
        if counts.len() != plan.len() {
            return Err(EngineError::LayoutConflict {
                buffer: counts.len().min(plan.len()),
                field: String::new(),
                reason: format!("{} element counts for {} buffers", counts.len(), plan.len()),
            });
        }

        let buffers = plan
            .buffers
            .iter()
            .zip(counts)
            .map(|(layout, &count)| PackedBuffer::new(layout.clone(), count))
            .collect();
        Ok(Self { buffers })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    #[inline]
    pub fn get(&self, buffer: usize) -> Option<&PackedBuffer> {
        self.buffers.get(buffer)
    }

    pub fn get_mut(&mut self, buffer: usize) -> EngineResult<&mut PackedBuffer> {
        let len = self.buffers.len();
        self.buffers.get_mut(buffer).ok_or(EngineError::WriteOutOfBounds {
            buffer,
            start: 0,
            end: 0,
            len,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackedBuffer> {
        self.buffers.iter()
    }

    pub fn write_f32(&mut self, buffer: usize, element: usize, field_offset: u32, values: &[f32]) -> EngineResult<()> {
        self.get_mut(buffer)?.write_f32(element, field_offset, values)
    }

    pub fn write_u32(&mut self, buffer: usize, element: usize, field_offset: u32, values: &[u32]) -> EngineResult<()> {
        self.get_mut(buffer)?.write_u32(element, field_offset, values)
    }

    pub fn write_unorm8x4(&mut self, buffer: usize, element: usize, field_offset: u32, rgba: [f32; 4]) -> EngineResult<()> {
        self.get_mut(buffer)?.write_unorm8x4(element, field_offset, rgba)
    }

    /// Exact upload bytes of one buffer.
    pub fn materialize(&self, buffer: usize) -> Option<&[u8]> {
        self.buffers.get(buffer).map(PackedBuffer::materialize)
    }

    /// Concatenates all buffers as consecutive arrays of one storage struct.
    ///
    /// Each section starts at a multiple of its layout's alignment, which is
    /// where WGSL places `array<T, N>` members. The total is padded to 16.
    pub fn materialize_soa(&self) -> SoaBytes {
        let mut bytes = Vec::new();
        let mut offsets = Vec::with_capacity(self.buffers.len());
        for buffer in &self.buffers {
            let align = buffer.layout().alignment();
            bytes.resize(bytes.len().next_multiple_of(align), 0);
            offsets.push(bytes.len());
            bytes.extend_from_slice(buffer.materialize());
        }
        bytes.resize(bytes.len().next_multiple_of(16), 0);
        SoaBytes { bytes, offsets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan, BufferSpec, FieldSpec, StepRate};

    fn ring_layout() -> BufferLayout {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 2), FieldSpec::unorm8x4("color", 4)],
        );
        plan(&[spec]).unwrap().buffers.remove(0)
    }

    // ── writes ────────────────────────────────────────────────────────────

    #[test]
    fn floats_are_little_endian_at_stride() {
        let mut buf = PackedBuffer::new(ring_layout(), 2);
        buf.write_f32(1, 0, &[1.0, -2.5]).unwrap();
        let bytes = buf.materialize();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[12..16], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &(-2.5f32).to_le_bytes());
        assert!(bytes[..12].iter().all(|&b| b == 0));
    }

    #[test]
    fn unorm_rounds_and_clamps() {
        let mut buf = PackedBuffer::new(ring_layout(), 1);
        buf.write_unorm8x4(0, 8, [0.5, 1.5, -1.0, 1.0]).unwrap();
        assert_eq!(buf.read_bytes(0, 8, 4).unwrap(), &[128, 255, 0, 255]);
    }

    #[test]
    fn color_does_not_shear_position() {
        let mut buf = PackedBuffer::new(ring_layout(), 1);
        buf.write_f32(0, 0, &[0.25, 0.75]).unwrap();
        buf.write_unorm8x4(0, 8, [1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(buf.read_f32(0, 0, 2).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn position_does_not_shear_color() {
        let mut buf = PackedBuffer::new(ring_layout(), 1);
        buf.write_field_unorm8x4(0, "color", [0.0, 0.5, 1.0, 1.0]).unwrap();
        assert_eq!(buf.read_bytes(0, 8, 4).unwrap(), &[0, 128, 255, 255]);

        buf.write_field_f32(0, "position", &[-1.0, f32::MAX]).unwrap();
        assert_eq!(buf.read_bytes(0, 8, 4).unwrap(), &[0, 128, 255, 255]);
        assert_eq!(buf.read_f32(0, 0, 2).unwrap(), vec![-1.0, f32::MAX]);
    }

    #[test]
    fn named_writes_use_field_offsets() {
        let mut buf = PackedBuffer::new(ring_layout(), 1);
        buf.write_field_unorm8x4(0, "color", [0.0, 0.0, 1.0, 1.0]).unwrap();
        assert_eq!(buf.read_bytes(0, 8, 4).unwrap(), &[0, 0, 255, 255]);
        assert!(buf.write_field_f32(0, "position", &[1.0, 2.0, 3.0]).is_err());
        assert!(matches!(
            buf.write_field_f32(0, "normal", &[1.0]),
            Err(EngineError::LayoutConflict { .. })
        ));
    }

    #[test]
    fn u32_values_round_trip_as_bytes() {
        let mut buf = PackedBuffer::new(ring_layout(), 1);
        buf.write_u32(0, 4, &[0x0102_0304]).unwrap();
        assert_eq!(buf.read_bytes(0, 4, 4).unwrap(), &[4, 3, 2, 1]);
    }

    // ── bounds ────────────────────────────────────────────────────────────

    #[test]
    fn out_of_bounds_write_touches_nothing() {
        let mut buf = PackedBuffer::new(ring_layout(), 2);
        let before = buf.clone();
        assert!(matches!(
            buf.write_f32(2, 0, &[1.0]),
            Err(EngineError::WriteOutOfBounds { .. })
        ));
        // Spilling into the next element is rejected too.
        assert!(buf.write_f32(0, 8, &[1.0, 2.0]).is_err());
        assert!(buf.write_unorm8x4(0, 10, [1.0; 4]).is_err());
        assert_eq!(buf, before);
    }

    #[test]
    fn huge_element_index_is_rejected_not_overflowed() {
        let mut buf = PackedBuffer::new(ring_layout(), 2);
        let before = buf.clone();
        assert!(matches!(
            buf.write_f32(usize::MAX / 2, 0, &[1.0]),
            Err(EngineError::WriteOutOfBounds { .. })
        ));
        assert!(buf.write_unorm8x4(usize::MAX, u32::MAX, [1.0; 4]).is_err());
        assert!(buf.write_field_f32(usize::MAX, "position", &[1.0; 3]).is_err());
        assert!(buf.read_bytes(usize::MAX, 0, usize::MAX).is_err());
        assert_eq!(buf, before);
    }

    #[test]
    fn reads_are_bounded() {
        let buf = PackedBuffer::new(ring_layout(), 1);
        assert!(buf.read_f32(0, 4, 3).is_err());
        assert!(buf.read_bytes(1, 0, 1).is_err());
    }

    // ── plans / SoA ───────────────────────────────────────────────────────

    fn storage_plan() -> BufferLayoutPlan {
        plan(&[
            BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("scale", 0, 2)]),
            BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("offset", 0, 2)]),
            BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("color", 0, 4)]),
        ])
        .unwrap()
    }

    #[test]
    fn allocate_checks_count_arity() {
        assert!(PackedBuffers::allocate(&storage_plan(), &[1, 2]).is_err());
        let bufs = PackedBuffers::allocate(&storage_plan(), &[3, 3, 3]).unwrap();
        assert_eq!(bufs.len(), 3);
        assert_eq!(bufs.materialize(2).unwrap().len(), 48);
    }

    #[test]
    fn soa_sections_follow_wgsl_alignment() {
        let mut bufs = PackedBuffers::allocate(&storage_plan(), &[3, 3, 3]).unwrap();
        bufs.write_f32(2, 0, 0, &[0.1, 0.2, 0.3, 1.0]).unwrap();
        let soa = bufs.materialize_soa();
        // 3 × vec2 = 24, 3 × vec2 = 24 → 48, already 16-aligned.
        assert_eq!(soa.offsets, vec![0, 24, 48]);
        assert_eq!(soa.bytes.len(), 96);
        assert_eq!(&soa.bytes[48..52], &0.1f32.to_le_bytes());
    }

    #[test]
    fn soa_pads_vec4_section_to_16() {
        let bufs = PackedBuffers::allocate(&storage_plan(), &[1, 1, 1]).unwrap();
        let soa = bufs.materialize_soa();
        assert_eq!(soa.offsets, vec![0, 8, 16]);
        assert_eq!(soa.bytes.len(), 32);

        let odd = plan(&[
            BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("scale", 0, 2)]),
            BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("color", 0, 4)]),
        ])
        .unwrap();
        let soa = PackedBuffers::allocate(&odd, &[3, 3]).unwrap().materialize_soa();
        assert_eq!(soa.offsets, vec![0, 32]);
        assert_eq!(soa.bytes.len(), 80);
    }

    #[test]
    fn zero_count_buffers_are_empty() {
        let bufs = PackedBuffers::allocate(&storage_plan(), &[0, 0, 0]).unwrap();
        assert!(bufs.iter().all(PackedBuffer::is_empty));
        assert!(bufs.materialize_soa().bytes.is_empty());
    }
}
