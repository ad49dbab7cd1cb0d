//! Front subsystem stages. Each module is one stage of the turn pipeline
//! plus its query surface; `crate::step` sequences them.

pub mod aor;
pub mod contiguity;
pub mod equipment;
pub mod front;
pub mod pressure;
pub mod reshape;
pub mod segments;
