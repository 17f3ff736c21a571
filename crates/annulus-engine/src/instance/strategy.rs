use crate::layout::{BufferSpec, FieldSpec, StepRate};

/// How per-instance data reaches the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InstanceStrategy {
    /// One 32-byte uniform buffer and one bind group per instance.
    ///
    /// ```wgsl
    /// struct Instance { scale: vec2f, offset: vec2f, color: vec4f }
    /// ```
    PerObjectUniform,

    /// One storage buffer holding every instance as structure-of-arrays,
    /// indexed by `vertex_index / vertices_per_instance`.
    ///
    /// ```wgsl
    /// struct Instances {
    ///     scale: array<vec2f, N>,
    ///     offset: array<vec2f, N>,
    ///     color: array<vec4f, N>,
    ///     vertices: array<vec2f, V>, // only with attached vertices
    /// }
    /// ```
    SharedStorage,

    /// Two instance-stepped vertex buffers: color (`unorm8x4`, location 1)
    /// and offset (`float32x2`, location 2) in one, scale (`float32x2`,
    /// location 3) in the other.
    VertexAttributes,
}

impl InstanceStrategy {
    pub const ALL: [InstanceStrategy; 3] = [
        InstanceStrategy::PerObjectUniform,
        InstanceStrategy::SharedStorage,
        InstanceStrategy::VertexAttributes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InstanceStrategy::PerObjectUniform => "per-object uniform",
            InstanceStrategy::SharedStorage => "shared storage",
            InstanceStrategy::VertexAttributes => "vertex attribute",
        }
    }

    /// Buffer specs for the instance data alone.
    ///
    /// For [`InstanceStrategy::VertexAttributes`] these are meant to follow the
    /// mesh's own vertex buffer, which keeps shader location 0.
    pub fn buffer_specs(self) -> Vec<BufferSpec> {
        match self {
            InstanceStrategy::PerObjectUniform => vec![BufferSpec::new(
                StepRate::Resource,
                vec![
                    FieldSpec::float32("scale", 0, 2),
                    FieldSpec::float32("offset", 1, 2),
                    FieldSpec::float32("color", 2, 4),
                ],
            )],
            InstanceStrategy::SharedStorage => vec![
                BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("scale", 0, 2)]),
                BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("offset", 0, 2)]),
                BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("color", 0, 4)]),
            ],
            InstanceStrategy::VertexAttributes => vec![
                BufferSpec::new(
                    StepRate::Instance,
                    vec![FieldSpec::unorm8x4("color", 1), FieldSpec::float32("offset", 2, 2)],
                ),
                BufferSpec::new(StepRate::Instance, vec![FieldSpec::float32("scale", 3, 2)]),
            ],
        }
    }

    /// Spec of the optional vertex section of the shared storage buffer.
    pub(crate) fn storage_vertex_spec() -> BufferSpec {
        BufferSpec::new(StepRate::Resource, vec![FieldSpec::float32("position", 0, 2)])
    }
}

impl std::fmt::Display for InstanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
