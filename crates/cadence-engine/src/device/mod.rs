//! GPU device glue.
//!
//! This module is responsible for:
//! - one-time acquisition of the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface bound to the window
//! - implementing the [`crate::frame::GpuDevice`] collaborator on top of a
//!   real surface, including the fence completion read-back

mod gpu;
mod surface;

pub use gpu::{Gpu, GpuInit};
pub use surface::{SlotBuffer, SurfaceDevice};
