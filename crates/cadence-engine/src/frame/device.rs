use std::fmt;

use thiserror::Error;

use crate::paint::Color;

/// Declared usage of a presentation buffer.
///
/// The display subsystem requires buffers in [`Present`](Self::Present) state
/// when submitted for presentation; GPU writes require
/// [`RenderTarget`](Self::RenderTarget).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Present,
    RenderTarget,
}

/// One recorded GPU instruction.
///
/// The clear is the placeholder workload; arbitrary per-frame work slots in
/// as further variants without touching the synchronization protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameCommand<B> {
    /// Resource-state transition barrier.
    Transition {
        buffer: B,
        from: ResourceState,
        to: ResourceState,
    },
    /// Clear the buffer to a solid color.
    Clear { buffer: B, color: Color },
}

/// Device-level failure.
///
/// Per-frame device failures are unrecoverable for the process: a rejected
/// submission or present leaves device state undefined, so there is no
/// frame-level retry anywhere in the core.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to acquire presentation buffers: {0}")]
    BufferAcquisition(String),

    #[error("surface reported buffer index {index} outside ring of {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("command submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("presentation rejected: {0}")]
    PresentRejected(String),

    #[error("device lost: {0}")]
    DeviceLost(String),
}

/// Device collaborator the frame core is generic over.
///
/// Covers the queue, the presentation surface, and the fence primitive as
/// opaque calls whose only contract is success/failure. The GPU executes
/// submitted work asynchronously and strictly in submission order; the core
/// relies on that FIFO guarantee rather than re-implementing it.
pub trait GpuDevice {
    /// Opaque presentation buffer handle.
    type Buffer: Clone + PartialEq + fmt::Debug;

    /// (Re)creates `count` presentation buffers bound to the surface at the
    /// given size. Any previously created buffers are released.
    fn create_buffers(
        &mut self,
        count: usize,
        width: u32,
        height: u32,
    ) -> Result<Vec<Self::Buffer>, DeviceError>;

    /// Index of the buffer the surface reports as next-writable.
    ///
    /// The index sequence is surface-defined; flip-model surfaces may skip
    /// or repeat indices under load. Callers must never compute it.
    fn current_buffer_index(&mut self) -> Result<usize, DeviceError>;

    /// Hands a closed command batch to the queue for asynchronous execution.
    /// Does not block.
    fn submit(&mut self, commands: &[FrameCommand<Self::Buffer>]) -> Result<(), DeviceError>;

    /// Requests presentation of the given buffer.
    fn present(&mut self, buffer: &Self::Buffer) -> Result<(), DeviceError>;

    /// Enqueues a signal that sets the fence to `value` once all previously
    /// enqueued work on the queue completes.
    fn signal(&mut self, value: u64) -> Result<(), DeviceError>;

    /// Last fence value the GPU reports finished, or `None` if no signal has
    /// completed yet. Cheap to poll.
    fn completed_value(&self) -> Option<u64>;

    /// Blocks the calling thread until `completed_value() >= value`.
    ///
    /// No timeout: GPU completion is assumed to always eventually occur
    /// (device removal is out of scope).
    fn wait_for_value(&mut self, value: u64) -> Result<(), DeviceError>;
}
