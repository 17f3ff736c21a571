use core::ops::Mul;

use crate::error::{EngineError, EngineResult};

/// 4x4 matrix authored row-major: `self.0[row][col]`.
///
/// Vectors are columns (`M × v`). WGSL reads `mat4x4f` column by column, so
/// matrices go through [`Mat4::to_column_major`] (a transpose) before upload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    #[inline]
    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self(rows)
    }

    #[inline]
    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.0
    }

    /// `self × rhs`.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.0;
        let b = &rhs.0;
        let mut m = [[0.0f32; 4]; 4];
        for (r, row) in m.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|i| a[r][i] * b[i][c]).sum();
            }
        }
        Mat4(m)
    }

    pub fn transpose(&self) -> Mat4 {
        let mut m = [[0.0f32; 4]; 4];
        for (r, row) in self.0.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                m[c][r] = v;
            }
        }
        Mat4(m)
    }

    /// `self × v` for a homogeneous column vector.
    pub fn transform(&self, v: [f32; 4]) -> [f32; 4] {
        std::array::from_fn(|r| (0..4).map(|i| self.0[r][i] * v[i]).sum())
    }

    /// 16 floats in the order a column-major consumer expects.
    ///
    /// Equivalent to flattening `self.transpose()` row by row.
    pub fn to_column_major(&self) -> [f32; 16] {
        let t = self.transpose();
        let mut out = [0.0f32; 16];
        for (r, row) in t.0.iter().enumerate() {
            out[4 * r..4 * r + 4].copy_from_slice(row);
        }
        out
    }

    /// Largest absolute element difference; handy for tolerance checks.
    pub fn max_abs_diff(&self, other: &Mat4) -> f32 {
        self.0
            .iter()
            .flatten()
            .zip(other.0.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
        Mat4([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translate(tx: f32, ty: f32, tz: f32) -> Mat4 {
        Mat4([
            [1.0, 0.0, 0.0, tx],
            [0.0, 1.0, 0.0, ty],
            [0.0, 0.0, 1.0, tz],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_x(theta: f32) -> Mat4 {
        let (s, c) = theta.sin_cos();
        Mat4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_y(theta: f32) -> Mat4 {
        let (s, c) = theta.sin_cos();
        Mat4([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_z(theta: f32) -> Mat4 {
        let (s, c) = theta.sin_cos();
        Mat4([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Focal-length projection used by the demos.
    ///
    /// Not the OpenGL/Vulkan canonical form: depth maps through
    /// `far/(far-near)` and `-far·near/(far-near)` and `w` takes `+z`, with no
    /// NDC flip. After the divide, `z = near` lands on 0 and `z = far` on 1.
    /// `aspect_factor` multiplies the focal length on the y axis.
    pub fn perspective(
        focal_length: f32,
        aspect_factor: f32,
        near: f32,
        far: f32,
    ) -> EngineResult<Mat4> {
        if !(near > 0.0 && near < far && far.is_finite()) {
            return Err(EngineError::InvalidProjectionRange { near, far });
        }

        let depth = far - near;
        Ok(Mat4([
            [focal_length, 0.0, 0.0, 0.0],
            [0.0, focal_length * aspect_factor, 0.0, 0.0],
            [0.0, 0.0, far / depth, -(far * near) / depth],
            [0.0, 0.0, 1.0, 0.0],
        ]))
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    #[inline]
    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

/// `a × b`.
#[inline]
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    a.multiply(b)
}

#[inline]
pub fn transpose(a: &Mat4) -> Mat4 {
    a.transpose()
}
