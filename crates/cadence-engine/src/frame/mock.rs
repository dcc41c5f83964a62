//! Test double for the device collaborator.
//!
//! Records every call in an event log so tests can assert ordering (e.g.
//! waits before rebuilds), scripts the surface-defined index sequence, and
//! models GPU completion timing.

use std::collections::VecDeque;

use super::device::{DeviceError, FrameCommand, GpuDevice};

#[derive(Debug, Clone, PartialEq)]
pub struct MockBuffer {
    pub slot: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    CreateBuffers { count: usize, width: u32, height: u32 },
    QueryIndex { reported: usize },
    Submit { first_slot: Option<usize> },
    Present { slot: usize },
    Signal { value: u64 },
    Wait { value: u64 },
}

/// When a signaled fence value becomes visible as complete.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The signal lands as soon as it is enqueued (GPU outrunning the CPU).
    Immediate,
    /// Values complete only when the CPU blocks on them: strict FIFO timing
    /// where submission i finishes only once its wait is acknowledged.
    OnWait,
}

#[derive(Debug)]
pub struct MockDevice {
    events: Vec<MockEvent>,
    submissions: Vec<Vec<FrameCommand<MockBuffer>>>,
    completion: Completion,
    completed: Option<u64>,
    signals_issued: u64,
    max_in_flight: u64,
    buffer_count: usize,
    current: usize,
    index_script: VecDeque<usize>,
    create_calls: usize,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            submissions: Vec::new(),
            completion: Completion::OnWait,
            completed: None,
            signals_issued: 0,
            max_in_flight: 0,
            buffer_count: 0,
            current: 0,
            index_script: VecDeque::new(),
            create_calls: 0,
        }
    }

    pub fn set_completion(&mut self, completion: Completion) {
        self.completion = completion;
    }

    /// Overrides the index sequence reported by `current_buffer_index`; each
    /// query consumes one entry, falling back to round-robin when exhausted.
    pub fn script_indices(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.index_script.extend(indices);
    }

    /// Marks every value up to and including `value` as GPU-complete.
    pub fn complete_up_to(&mut self, value: u64) {
        self.completed = Some(self.completed.map_or(value, |c| c.max(value)));
    }

    pub fn events(&self) -> &[MockEvent] {
        &self.events
    }

    pub fn submissions(&self) -> &[Vec<FrameCommand<MockBuffer>>] {
        &self.submissions
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls
    }

    /// Highest number of submissions simultaneously in flight (signaled but
    /// not complete) observed so far.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight
    }

    pub fn wait_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, MockEvent::Wait { .. }))
            .count()
    }

    /// Ring setup shorthand for tests that exercise the recorder directly.
    pub fn create_buffers_for_test(&mut self, count: usize, width: u32, height: u32) {
        let _ = self.create_buffers(count, width, height);
    }

    fn in_flight(&self) -> u64 {
        self.signals_issued - self.completed.map_or(0, |c| c + 1)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for MockDevice {
    type Buffer = MockBuffer;

    fn create_buffers(
        &mut self,
        count: usize,
        width: u32,
        height: u32,
    ) -> Result<Vec<MockBuffer>, DeviceError> {
        self.events.push(MockEvent::CreateBuffers { count, width, height });
        self.create_calls += 1;
        self.buffer_count = count;
        self.current = 0;
        Ok((0..count)
            .map(|slot| MockBuffer { slot, width, height })
            .collect())
    }

    fn current_buffer_index(&mut self) -> Result<usize, DeviceError> {
        if let Some(index) = self.index_script.pop_front() {
            self.current = index;
        }
        self.events.push(MockEvent::QueryIndex { reported: self.current });
        Ok(self.current)
    }

    fn submit(&mut self, commands: &[FrameCommand<MockBuffer>]) -> Result<(), DeviceError> {
        let first_slot = commands.first().map(|c| match c {
            FrameCommand::Transition { buffer, .. } => buffer.slot,
            FrameCommand::Clear { buffer, .. } => buffer.slot,
        });
        self.events.push(MockEvent::Submit { first_slot });
        self.submissions.push(commands.to_vec());
        // In-flight is sampled here, at the point the CPU hands over work
        // referencing a buffer, which is where the N-1 bound must hold.
        self.max_in_flight = self.max_in_flight.max(self.in_flight());
        Ok(())
    }

    fn present(&mut self, buffer: &MockBuffer) -> Result<(), DeviceError> {
        self.events.push(MockEvent::Present { slot: buffer.slot });
        // The present moves the surface along; scripted sequences override
        // this on the next index query.
        if self.index_script.is_empty() && self.buffer_count > 0 {
            self.current = (self.current + 1) % self.buffer_count;
        }
        Ok(())
    }

    fn signal(&mut self, value: u64) -> Result<(), DeviceError> {
        self.events.push(MockEvent::Signal { value });
        self.signals_issued = self.signals_issued.max(value + 1);
        if self.completion == Completion::Immediate {
            self.complete_up_to(value);
        }
        Ok(())
    }

    fn completed_value(&self) -> Option<u64> {
        self.completed
    }

    fn wait_for_value(&mut self, value: u64) -> Result<(), DeviceError> {
        self.events.push(MockEvent::Wait { value });
        // The mock GPU always eventually finishes; a blocking wait observes
        // exactly the awaited value as complete.
        self.complete_up_to(value);
        Ok(())
    }
}
