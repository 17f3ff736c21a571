//! Per-instance data: random records and the three ways of feeding them to a shader.

mod record;
mod set;
mod strategy;

pub use record::InstanceRecord;
pub use set::{allocate, InstanceGpu, InstanceSet, MeshDraw};
pub use strategy::InstanceStrategy;
