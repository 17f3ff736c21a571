use thiserror::Error;

/// Failures reported by a [`GraphicsDevice`](super::GraphicsDevice).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// No usable device, or the device was lost.
    #[error("device unavailable: {0}")]
    Unavailable(String),

    #[error("invalid {kind} handle {index}")]
    InvalidHandle { kind: &'static str, index: u32 },

    #[error("write of {len} bytes at offset {offset} exceeds buffer size {size}")]
    OutOfRange { offset: u64, len: u64, size: u64 },

    /// The surface could not hand out a frame this time; try again next frame.
    #[error("frame skipped: {0}")]
    FrameSkipped(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}
