//! Row-major 4x4 matrices and the model/view/projection chain.

mod mat4;
mod transform;

pub use mat4::{multiply, transpose, Mat4};
pub use transform::{TransformParams, TransformSet};
