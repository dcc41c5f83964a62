//! Window + runtime loop.
//!
//! Owns the winit EventLoop and Window. Platform callbacks are translated
//! into a bounded queue of typed [`HostEvent`]s, drained synchronously on
//! the dispatch thread and fed to the frame loop — one rendering surface,
//! one logical timeline.

mod app;
mod event;
mod runtime;

pub use app::{App, AppControl};
pub use event::HostEvent;
pub use runtime::{HostConfig, Runtime};
pub use winit::dpi::LogicalSize;
