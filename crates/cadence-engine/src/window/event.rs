use std::collections::VecDeque;

/// Typed host event delivered by the window collaborator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Run one frame-loop tick.
    Redraw,
    /// The drawable area changed.
    Resized { width: u32, height: u32 },
    /// Orderly shutdown was requested.
    CloseRequested,
}

/// Bounded FIFO of host events.
///
/// Redraws carry no payload, so consecutive ones coalesce; on overflow a
/// queued redraw is sacrificed first, then the oldest resize. A close
/// request is never dropped.
#[derive(Debug)]
pub(crate) struct EventQueue {
    events: VecDeque<HostEvent>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: HostEvent) {
        if event == HostEvent::Redraw && self.events.back() == Some(&HostEvent::Redraw) {
            return;
        }

        if self.events.len() == self.capacity {
            if let Some(pos) = self.events.iter().position(|e| *e == HostEvent::Redraw) {
                let _ = self.events.remove(pos);
            } else if event == HostEvent::Redraw {
                return;
            } else if let Some(pos) = self
                .events
                .iter()
                .position(|e| *e != HostEvent::CloseRequested)
            {
                let _ = self.events.remove(pos);
            } else {
                return;
            }
        }

        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<HostEvent> {
        self.events.pop_front()
    }
}
