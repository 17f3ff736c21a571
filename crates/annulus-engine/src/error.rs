use thiserror::Error;

use crate::device::DeviceError;

/// Errors raised by the geometry, layout and frame-driving core.
///
/// Every variant is produced synchronously by the call that caused it.
/// Nothing in the core retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Mesh generator input rejected before any vertex was produced.
    #[error("invalid geometry parameters: {0}")]
    InvalidGeometryParameters(String),

    /// Attribute layout with overlapping, misaligned or unsupported fields.
    #[error("layout conflict in buffer {buffer}, field `{field}`: {reason}")]
    LayoutConflict {
        buffer: usize,
        field: String,
        reason: String,
    },

    /// Projection requested with `near`/`far` outside `0 < near < far`.
    #[error("invalid projection range: near = {near}, far = {far}")]
    InvalidProjectionRange { near: f32, far: f32 },

    /// The graphics device is missing or lost; frame advancement halted.
    #[error("graphics device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A packed-buffer write or read that would leave its element.
    #[error("access out of bounds in buffer {buffer}: bytes {start}..{end} of {len}")]
    WriteOutOfBounds {
        buffer: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Operation not supported by the instance set's allocation strategy, or
    /// handed GPU resources created by a different set.
    #[error("operation `{operation}` does not match this {strategy} instance set")]
    StrategyMismatch {
        operation: &'static str,
        strategy: &'static str,
    },

    /// Any other device-side failure.
    #[error(transparent)]
    Device(DeviceError),
}

impl From<DeviceError> for EngineError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Unavailable(reason) => EngineError::DeviceUnavailable(reason),
            other => EngineError::Device(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
