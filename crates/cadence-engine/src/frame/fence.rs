use super::device::{DeviceError, GpuDevice};

/// CPU side of the fence protocol: a monotonically increasing 64-bit counter
/// whose values are enqueued as GPU signals and later read back as complete.
///
/// Values strictly increase by 1 per frame and are never reused. A single
/// counter (rather than per-buffer fences) is sufficient because the queue
/// executes submissions in FIFO order: waiting for the value assigned N
/// frames ago is equivalent to waiting for the buffer about to be reused.
#[derive(Debug)]
pub struct FrameFence {
    next_value: u64,
}

impl FrameFence {
    pub fn new() -> Self {
        Self { next_value: 0 }
    }

    /// Enqueues a signal on the queue that fires once all previously enqueued
    /// GPU work completes, then increments the counter. Returns the value to
    /// wait on.
    pub fn signal_after<D: GpuDevice>(&mut self, device: &mut D) -> Result<u64, DeviceError> {
        let value = self.next_value;
        device.signal(value)?;
        self.next_value += 1;
        Ok(value)
    }

    /// Cheap poll of the GPU-visible completion value.
    pub fn is_reached<D: GpuDevice>(&self, device: &D, value: u64) -> bool {
        device.completed_value().is_some_and(|completed| completed >= value)
    }

    /// Blocks the calling thread until `value` is reached; no-op if it
    /// already is.
    pub fn wait_until_reached<D: GpuDevice>(
        &self,
        device: &mut D,
        value: u64,
    ) -> Result<(), DeviceError> {
        if self.is_reached(device, value) {
            return Ok(());
        }
        device.wait_for_value(value)
    }

    /// Most recently issued value, if any frame has been signaled yet.
    pub fn last_issued(&self) -> Option<u64> {
        self.next_value.checked_sub(1)
    }

    pub fn next_value(&self) -> u64 {
        self.next_value
    }
}

impl Default for FrameFence {
    fn default() -> Self {
        Self::new()
    }
}
