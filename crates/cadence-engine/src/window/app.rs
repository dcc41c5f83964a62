use super::event::HostEvent;
use crate::paint::Color;
use crate::time::FrameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the host binary.
///
/// The clear color is this design's placeholder workload; an application
/// with real per-frame GPU work would grow this seam, not the frame loop.
pub trait App {
    /// Called once per frame-loop tick to produce the frame's clear color.
    fn clear_color(&mut self, time: FrameTime) -> Color;

    /// Called for each host event before the runtime acts on it.
    fn on_event(&mut self, event: &HostEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }
}
