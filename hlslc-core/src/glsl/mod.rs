//! GLSL code generation.

pub mod emitter;
pub mod writer;

pub use emitter::{emit, Emitter};
