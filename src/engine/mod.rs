//! Paint engine front end and its multithreaded back end.
//!
//! [`painter::PaintEngine`] turns draw calls into immediate renders or queued
//! commands. The rest of this module runs those commands on worker threads.

pub(crate) mod action;
pub(crate) mod opts;
pub(crate) mod painter;
pub(crate) mod queue;
pub(crate) mod stats;
pub(crate) mod thread_pool;
pub(crate) mod worker;
