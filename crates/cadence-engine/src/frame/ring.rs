use std::fmt;

use super::device::{DeviceError, GpuDevice};

/// Fixed-size set of presentable buffers plus the index of the buffer the
/// CPU may currently record into.
///
/// Invariant: `current` always mirrors what the surface reports as
/// next-writable. It is re-queried from the device immediately after a
/// present, never computed here — the index sequence is surface-defined.
#[derive(Debug)]
pub struct PresentationRing<B> {
    buffers: Vec<B>,
    current: usize,
}

impl<B: Clone + PartialEq + fmt::Debug> PresentationRing<B> {
    /// Creates `capacity` buffers at the given size and syncs the initial
    /// index from the surface.
    pub fn new<D>(
        device: &mut D,
        capacity: usize,
        width: u32,
        height: u32,
    ) -> Result<Self, DeviceError>
    where
        D: GpuDevice<Buffer = B>,
    {
        let buffers = device.create_buffers(capacity, width, height)?;
        let mut ring = Self {
            buffers,
            current: 0,
        };
        ring.sync_index(device)?;
        Ok(ring)
    }

    pub fn capacity(&self) -> usize {
        self.buffers.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The buffer the CPU may currently record into.
    pub fn current_buffer(&self) -> &B {
        &self.buffers[self.current]
    }

    /// Re-syncs the current index after a present.
    ///
    /// The move to the next buffer was requested by the present call; this
    /// only re-reads where the surface landed. Returns the new index.
    pub fn advance<D>(&mut self, device: &mut D) -> Result<usize, DeviceError>
    where
        D: GpuDevice<Buffer = B>,
    {
        self.sync_index(device)
    }

    /// Tears down and recreates all buffers for a new drawable size.
    ///
    /// Must not be called while any buffer has outstanding GPU work; the
    /// caller drains in-flight frames first. A zero size in either dimension
    /// is a degenerate no-op and returns `false`.
    pub fn rebuild<D>(&mut self, device: &mut D, width: u32, height: u32) -> Result<bool, DeviceError>
    where
        D: GpuDevice<Buffer = B>,
    {
        if width == 0 || height == 0 {
            log::debug!("skipping ring rebuild for zero size {width}x{height}");
            return Ok(false);
        }

        let capacity = self.buffers.len();
        self.buffers = device.create_buffers(capacity, width, height)?;
        self.sync_index(device)?;
        log::debug!("rebuilt {capacity} presentation buffers at {width}x{height}");
        Ok(true)
    }

    fn sync_index<D>(&mut self, device: &mut D) -> Result<usize, DeviceError>
    where
        D: GpuDevice<Buffer = B>,
    {
        let index = device.current_buffer_index()?;
        if index >= self.buffers.len() {
            return Err(DeviceError::IndexOutOfRange {
                index,
                capacity: self.buffers.len(),
            });
        }
        self.current = index;
        Ok(index)
    }
}
