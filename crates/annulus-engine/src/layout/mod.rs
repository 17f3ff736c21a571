mod planner;

pub use planner::{
    plan, AttributeField, BufferLayout, BufferLayoutPlan, BufferSpec, ComponentType, FieldSpec,
    StepRate,
};
