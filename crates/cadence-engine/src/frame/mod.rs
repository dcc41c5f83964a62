//! Frame lifecycle and synchronization core.
//!
//! This module owns the parts of the host with real invariants:
//! - [`PresentationRing`]: N presentable buffers plus the surface-reported
//!   index of the buffer the CPU may currently write.
//! - [`CommandRecorder`]: a reusable allocator + command list recording one
//!   frame's GPU work.
//! - [`FrameFence`]: a monotonically increasing counter with a GPU-side
//!   completion read-back.
//! - [`FrameContext`]: the per-tick orchestration binding the three together.
//!
//! Everything here is generic over [`GpuDevice`], the device-collaborator
//! seam, so the invariants are unit-tested against a mock GPU. The wgpu
//! implementation lives in [`crate::device`].
//!
//! Central correctness property: a presentation buffer is exclusively
//! GPU-owned between submission and the point its fence value is reached,
//! and CPU-writable only outside that window.

mod context;
mod device;
mod fence;
mod recorder;
mod ring;

#[cfg(test)]
pub(crate) mod mock;

pub use context::{FrameContext, FrameError, FrameOutcome, FrameState};
pub use device::{DeviceError, FrameCommand, GpuDevice, ResourceState};
pub use fence::FrameFence;
pub use recorder::{CommandRecorder, RecordError, SubmitError};
pub use ring::PresentationRing;
