//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame
//! to obtain a `FrameTime` snapshot. Kept independent of the runtime so it is
//! directly testable.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
