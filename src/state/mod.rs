//! Copy-on-write drawing state.
//!
//! The engine keeps its current clip and caps behind `Arc`s. Mutators detach
//! with [`Arc::make_mut`], so snapshots held by saved states or in-flight
//! commands never observe later changes.

pub(crate) mod caps;
pub(crate) mod clip;
pub(crate) mod stored;
