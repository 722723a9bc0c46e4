//! Per-thread rendering state and the span renderers that write pixels.

pub(crate) mod context;
pub(crate) mod renderer;
