use std::fmt;

use thiserror::Error;

use super::device::{DeviceError, FrameCommand, GpuDevice, ResourceState};
use crate::paint::Color;

/// Command recorder misuse. These are caller bugs, surfaced as typed errors
/// rather than panics so the runtime can report them before terminating.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("recording into a closed command list")]
    Closed,

    #[error("command list closed twice")]
    AlreadyClosed,

    #[error("submitting an open command list; call end_frame first")]
    NotClosed,

    #[error("begin_frame while the previous recording is still open")]
    StillRecording,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Recording,
    Closed,
}

/// Reusable (allocator, command list) pair recording one frame's GPU work.
///
/// The command vector is the allocator: `begin_frame` reclaims it without
/// releasing its capacity, so steady-state frames allocate nothing.
///
/// Reset precondition: no GPU work previously recorded through this recorder
/// may still be executing when `begin_frame` runs. That is enforced by the
/// frame loop via the fence, not here.
#[derive(Debug)]
pub struct CommandRecorder<B> {
    commands: Vec<FrameCommand<B>>,
    state: State,
}

impl<B: Clone + PartialEq + fmt::Debug> CommandRecorder<B> {
    /// Creates the recorder in the closed state, mirroring a command list
    /// that is created and immediately closed before first use.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            state: State::Closed,
        }
    }

    /// Reclaims the allocator and reopens the list for recording.
    pub fn begin_frame(&mut self) -> Result<(), RecordError> {
        if self.state == State::Recording {
            return Err(RecordError::StillRecording);
        }
        self.commands.clear();
        self.state = State::Recording;
        Ok(())
    }

    /// Appends a resource-state transition barrier.
    pub fn record_transition(
        &mut self,
        buffer: B,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<(), RecordError> {
        self.append(FrameCommand::Transition { buffer, from, to })
    }

    /// Appends the frame's clear workload.
    pub fn record_clear(&mut self, buffer: B, color: Color) -> Result<(), RecordError> {
        self.append(FrameCommand::Clear { buffer, color })
    }

    /// Closes the list, making it ready for submission.
    pub fn end_frame(&mut self) -> Result<(), RecordError> {
        if self.state == State::Closed {
            return Err(RecordError::AlreadyClosed);
        }
        self.state = State::Closed;
        Ok(())
    }

    /// Hands the closed list to the device queue for asynchronous execution.
    /// Does not block.
    pub fn submit<D>(&mut self, device: &mut D) -> Result<(), SubmitError>
    where
        D: GpuDevice<Buffer = B>,
    {
        if self.state != State::Closed {
            return Err(SubmitError::Record(RecordError::NotClosed));
        }
        device.submit(&self.commands)?;
        Ok(())
    }

    /// Commands recorded into the current list, in order.
    pub fn commands(&self) -> &[FrameCommand<B>] {
        &self.commands
    }

    fn append(&mut self, command: FrameCommand<B>) -> Result<(), RecordError> {
        if self.state != State::Recording {
            return Err(RecordError::Closed);
        }
        self.commands.push(command);
        Ok(())
    }
}

impl<B: Clone + PartialEq + fmt::Debug> Default for CommandRecorder<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Submission failure: either recorder misuse or a device-level rejection.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
