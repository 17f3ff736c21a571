use std::f32::consts::PI;

use crate::error::EngineResult;
use crate::layout::{plan, BufferLayout, BufferSpec, FieldSpec, StepRate};
use crate::packer::PackedBuffer;

use super::Mat4;

/// Inputs for the model/view/projection chain.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformParams {
    /// Uniform model scale.
    pub scale: f32,
    pub translate: [f32; 3],
    /// Camera tilt about the x axis, radians.
    pub view_tilt: f32,
    /// Push along +z applied after the tilt.
    pub view_distance: f32,
    pub focal_length: f32,
    pub aspect_factor: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            scale: 0.3,
            translate: [0.4, 0.0, 0.0],
            view_tilt: -3.0 * PI / 4.0,
            view_distance: 5.0,
            focal_length: 2.0,
            aspect_factor: 2.0,
            near: 0.1,
            far: 10.0,
        }
    }
}

impl TransformParams {
    /// `Translate(0, 0, distance) × RotateX(tilt)`: tilt the scene in place,
    /// then push it in front of the camera.
    pub fn view(&self) -> Mat4 {
        Mat4::translate(0.0, 0.0, self.view_distance) * Mat4::rotate_x(self.view_tilt)
    }
}

/// Model, view and projection for one scene.
///
/// View and projection are fixed at construction; the model follows the
/// rotation angle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformSet {
    params: TransformParams,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl TransformSet {
    /// Uniform bytes: three `mat4x4f`.
    pub const UNIFORM_SIZE: usize = 3 * 64;

    pub fn new(params: TransformParams) -> EngineResult<Self> {
        let projection =
            Mat4::perspective(params.focal_length, params.aspect_factor, params.near, params.far)?;
        let mut set = Self { params, model: Mat4::IDENTITY, view: params.view(), projection };
        set.set_angle(0.0);
        Ok(set)
    }

    #[inline]
    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    /// `Scale × Translate × RotateZ(angle)`: spin first, then offset, then shrink.
    pub fn model_at(&self, angle: f32) -> Mat4 {
        let p = &self.params;
        Mat4::scale(p.scale, p.scale, p.scale)
            * Mat4::translate(p.translate[0], p.translate[1], p.translate[2])
            * Mat4::rotate_z(angle)
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.model = self.model_at(angle);
    }

    /// `Projection × View × Model`.
    pub fn mvp(&self) -> Mat4 {
        self.projection * (self.view * self.model)
    }

    /// Single-element resource layout: `model`, `view`, `projection`.
    pub fn uniform_layout() -> EngineResult<BufferLayout> {
        let spec = BufferSpec::new(
            StepRate::Resource,
            vec![
                FieldSpec::float32("model", 0, 16),
                FieldSpec::float32("view", 1, 16),
                FieldSpec::float32("projection", 2, 16),
            ],
        );
        let mut plan = plan(&[spec])?;
        Ok(plan.buffers.remove(0))
    }

    /// Writes the three matrices column-major into element 0 of `buffer`.
    pub fn write_uniform(&self, buffer: &mut PackedBuffer) -> EngineResult<()> {
        buffer.write_field_f32(0, "model", &self.model.to_column_major())?;
        buffer.write_field_f32(0, "view", &self.view.to_column_major())?;
        buffer.write_field_f32(0, "projection", &self.projection.to_column_major())
    }
}
