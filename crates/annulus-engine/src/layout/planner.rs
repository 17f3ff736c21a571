use crate::error::{EngineError, EngineResult};

/// Scalar type of one attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ComponentType {
    Float32,
    Uint32,
    Sint32,
    /// 8-bit unsigned normalized; always packed four to a word.
    Unorm8,
}

impl ComponentType {
    #[inline]
    pub const fn byte_width(self) -> u32 {
        match self {
            ComponentType::Float32 | ComponentType::Uint32 | ComponentType::Sint32 => 4,
            ComponentType::Unorm8 => 1,
        }
    }
}

/// How a buffer advances between shader invocations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StepRate {
    Vertex,
    Instance,
    /// Uniform/storage data read through a bind group; never stepped.
    Resource,
}

impl StepRate {
    #[inline]
    pub const fn is_stepped(self) -> bool {
        !matches!(self, StepRate::Resource)
    }
}

/// Caller-side description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub location: u32,
    pub ty: ComponentType,
    pub components: u32,
    /// Explicit byte offset; `None` places the field at the running cursor.
    pub offset: Option<u32>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, location: u32, ty: ComponentType, components: u32) -> Self {
        Self { name: name.into(), location, ty, components, offset: None }
    }

    pub fn float32(name: impl Into<String>, location: u32, components: u32) -> Self {
        Self::new(name, location, ComponentType::Float32, components)
    }

    pub fn unorm8x4(name: impl Into<String>, location: u32) -> Self {
        Self::new(name, location, ComponentType::Unorm8, 4)
    }

    #[inline]
    pub fn at(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.components * self.ty.byte_width()
    }
}

/// Caller-side description of one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferSpec {
    pub step: StepRate,
    pub fields: Vec<FieldSpec>,
    pub min_stride: Option<u32>,
}

impl BufferSpec {
    pub fn new(step: StepRate, fields: Vec<FieldSpec>) -> Self {
        Self { step, fields, min_stride: None }
    }

    #[inline]
    pub fn with_min_stride(mut self, stride: u32) -> Self {
        self.min_stride = Some(stride);
        self
    }
}

/// A placed field.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeField {
    pub name: String,
    pub location: u32,
    pub ty: ComponentType,
    pub components: u32,
    pub offset: u32,
}

impl AttributeField {
    #[inline]
    pub fn size(&self) -> u32 {
        self.components * self.ty.byte_width()
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.size()
    }

    #[inline]
    pub fn is_byte_packed(&self) -> bool {
        self.ty == ComponentType::Unorm8
    }
}

/// Planned layout of one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferLayout {
    pub index: usize,
    pub step: StepRate,
    pub stride: u32,
    pub fields: Vec<AttributeField>,
}

impl BufferLayout {
    pub fn field(&self, name: &str) -> Option<&AttributeField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_at(&self, location: u32) -> Option<&AttributeField> {
        self.fields.iter().find(|f| f.location == location)
    }

    /// Bytes needed for `count` elements.
    #[inline]
    pub fn size_for(&self, count: usize) -> usize {
        self.stride as usize * count
    }

    /// Base alignment this buffer needs when embedded in a WGSL uniform or
    /// storage struct as `array<T>`: 4 for scalars, 8 for 2-vectors, 16 otherwise.
    pub fn alignment(&self) -> usize {
        self.fields
            .iter()
            .map(|f| match f.size() {
                0..=4 => 4,
                5..=8 => 8,
                _ => 16,
            })
            .max()
            .unwrap_or(4)
    }
}

/// Output of [`plan`]: one layout per input buffer, same order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BufferLayoutPlan {
    pub buffers: Vec<BufferLayout>,
}

impl BufferLayoutPlan {
    #[inline]
    pub fn buffer(&self, index: usize) -> Option<&BufferLayout> {
        self.buffers.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Buffers fed through vertex slots, in slot order.
    pub fn vertex_buffers(&self) -> impl Iterator<Item = &BufferLayout> {
        self.buffers.iter().filter(|b| b.step.is_stepped())
    }
}

#[inline]
/// `None` when the rounded value does not fit a `u32`.
fn round_up(value: u32, align: u32) -> Option<u32> {
    value.checked_next_multiple_of(align)
}

/// Lays out every buffer.
///
/// Fields keep their given order. A field without an explicit offset sits at
/// the end of the previous field. All offsets must be 4-byte aligned and no
/// two fields may share a byte, so a packed `unorm8x4` never shears a float.
/// Stride is the furthest field end (or `min_stride` if larger), rounded up to 4.
pub fn plan(buffers: &[BufferSpec]) -> EngineResult<BufferLayoutPlan> {
    let mut out = Vec::with_capacity(buffers.len());
    let mut used_locations: Vec<(u32, usize)> = Vec::new();

    for (index, spec) in buffers.iter().enumerate() {
        let conflict = |field: &FieldSpec, reason: String| EngineError::LayoutConflict {
            buffer: index,
            field: field.name.clone(),
            reason,
        };

        let max_components = if spec.step.is_stepped() { 4 } else { 16 };
        let mut placed: Vec<AttributeField> = Vec::with_capacity(spec.fields.len());
        let mut cursor = 0u32;

        for field in &spec.fields {
            if field.components == 0 || field.components > max_components {
                return Err(conflict(
                    field,
                    format!("{} components (allowed 1..={max_components})", field.components),
                ));
            }
            if field.ty == ComponentType::Unorm8 && field.components != 4 {
                return Err(conflict(field, "byte-packed fields must have 4 components".into()));
            }

            let offset = field.offset.unwrap_or(cursor);
            if offset % 4 != 0 {
                return Err(conflict(field, format!("offset {offset} is not 4-byte aligned")));
            }

            let Some(end) = offset.checked_add(field.size()) else {
                return Err(conflict(field, format!("offset {offset} overflows the byte range")));
            };
            if let Some(other) = placed.iter().find(|p| offset < p.end() && p.offset < end) {
                return Err(conflict(
                    field,
                    format!(
                        "bytes {offset}..{end} overlap `{}` at {}..{}",
                        other.name,
                        other.offset,
                        other.end()
                    ),
                ));
            }

            if spec.step.is_stepped() {
                if let Some(&(_, owner)) =
                    used_locations.iter().find(|(loc, _)| *loc == field.location)
                {
                    return Err(conflict(
                        field,
                        format!("shader location {} already used by buffer {owner}", field.location),
                    ));
                }
                used_locations.push((field.location, index));
            }

            placed.push(AttributeField {
                name: field.name.clone(),
                location: field.location,
                ty: field.ty,
                components: field.components,
                offset,
            });
            cursor = end;
        }

        let furthest = placed.iter().map(AttributeField::end).max().unwrap_or(0);
        let wanted = furthest.max(spec.min_stride.unwrap_or(0));
        let stride = round_up(wanted, 4).ok_or_else(|| EngineError::LayoutConflict {
            buffer: index,
            field: "stride".into(),
            reason: format!("stride {wanted} cannot be rounded to 4 bytes"),
        })?;

        log::trace!("planned buffer {index}: {:?} stride {stride}", spec.step);

        out.push(BufferLayout { index, step: spec.step, stride, fields: placed });
    }

    Ok(BufferLayoutPlan { buffers: out })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_vertex_spec() -> BufferSpec {
        BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 2), FieldSpec::unorm8x4("color", 4)],
        )
    }

    // ── cursor placement ──────────────────────────────────────────────────

    #[test]
    fn float_then_packed_color_stride_12() {
        let p = plan(&[ring_vertex_spec()]).unwrap();
        let b = &p.buffers[0];
        assert_eq!(b.stride, 12);
        assert_eq!(b.field("position").unwrap().offset, 0);
        assert_eq!(b.field("color").unwrap().offset, 8);
    }

    #[test]
    fn position_normal_color_stride_28() {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![
                FieldSpec::float32("position", 0, 3),
                FieldSpec::float32("normal", 2, 3),
                FieldSpec::unorm8x4("color", 1),
            ],
        );
        let b = &plan(&[spec]).unwrap().buffers[0];
        assert_eq!(b.field_at(1).unwrap().offset, 24);
        assert_eq!(b.stride, 28);
    }

    #[test]
    fn min_stride_wins_and_rounds_up() {
        let spec = ring_vertex_spec().with_min_stride(14);
        assert_eq!(plan(&[spec]).unwrap().buffers[0].stride, 16);
    }

    #[test]
    fn multiple_buffers_keep_order_and_step() {
        let instance = BufferSpec::new(
            StepRate::Instance,
            vec![FieldSpec::unorm8x4("color", 1), FieldSpec::float32("offset", 2, 2)],
        );
        let scale = BufferSpec::new(StepRate::Instance, vec![FieldSpec::float32("scale", 3, 2)]);
        let p = plan(&[ring_vertex_spec(), instance, scale]).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.buffers[1].stride, 12);
        assert_eq!(p.buffers[1].field("offset").unwrap().offset, 4);
        assert_eq!(p.buffers[2].stride, 8);
        assert_eq!(p.buffers[2].step, StepRate::Instance);
        assert_eq!(p.buffers[2].index, 2);
    }

    #[test]
    fn explicit_offsets_leave_gaps() {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 3), FieldSpec::unorm8x4("color", 1).at(16)],
        );
        let b = &plan(&[spec]).unwrap().buffers[0];
        assert_eq!(b.field("color").unwrap().offset, 16);
        assert_eq!(b.stride, 20);
    }

    // ── conflicts ─────────────────────────────────────────────────────────

    #[test]
    fn misaligned_packed_field_rejected() {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 2), FieldSpec::unorm8x4("color", 1).at(10)],
        );
        assert!(matches!(plan(&[spec]), Err(EngineError::LayoutConflict { .. })));
    }

    #[test]
    fn packed_field_over_float_rejected() {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 2), FieldSpec::unorm8x4("color", 1).at(4)],
        );
        let err = plan(&[spec]).unwrap_err();
        match err {
            EngineError::LayoutConflict { buffer, field, .. } => {
                assert_eq!(buffer, 0);
                assert_eq!(field, "color");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn offsets_near_the_byte_limit_rejected() {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 2).at(u32::MAX - 3)],
        );
        assert!(matches!(plan(&[spec]), Err(EngineError::LayoutConflict { .. })));

        let stride = ring_vertex_spec().with_min_stride(u32::MAX - 1);
        match plan(&[stride]).unwrap_err() {
            EngineError::LayoutConflict { field, .. } => assert_eq!(field, "stride"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unorm8_needs_four_components() {
        let spec = BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::new("color", 0, ComponentType::Unorm8, 3)],
        );
        assert!(plan(&[spec]).is_err());
    }

    #[test]
    fn duplicate_locations_across_buffers_rejected() {
        let a = BufferSpec::new(StepRate::Vertex, vec![FieldSpec::float32("position", 0, 2)]);
        let b = BufferSpec::new(StepRate::Instance, vec![FieldSpec::float32("offset", 0, 2)]);
        assert!(plan(&[a, b]).is_err());
    }

    #[test]
    fn resource_buffers_allow_matrices() {
        let spec = BufferSpec::new(
            StepRate::Resource,
            vec![FieldSpec::float32("model", 0, 16), FieldSpec::float32("view", 0, 16)],
        );
        let b = &plan(&[spec]).unwrap().buffers[0];
        assert_eq!(b.stride, 128);
        assert_eq!(b.alignment(), 16);
    }

    #[test]
    fn stepped_buffers_reject_matrices() {
        let spec = BufferSpec::new(StepRate::Vertex, vec![FieldSpec::float32("model", 0, 16)]);
        assert!(plan(&[spec]).is_err());
    }

    // ── misc ──────────────────────────────────────────────────────────────

    #[test]
    fn alignment_follows_widest_field() {
        let vec2 = BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("scale", 0, 2)]);
        let vec4 = BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("color", 0, 4)]);
        let p = plan(&[vec2, vec4]).unwrap();
        assert_eq!(p.buffers[0].alignment(), 8);
        assert_eq!(p.buffers[1].alignment(), 16);
    }

    #[test]
    fn planning_is_deterministic() {
        let specs = [ring_vertex_spec()];
        assert_eq!(plan(&specs).unwrap(), plan(&specs).unwrap());
    }
}
