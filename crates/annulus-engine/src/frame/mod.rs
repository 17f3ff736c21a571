//! Per-frame animation and submission.

mod driver;
mod scene;

pub use driver::{DriverState, FrameDriver, FrameDriverConfig, FrameOutcome, FrameState};
pub use scene::{Scene, SceneResources};
