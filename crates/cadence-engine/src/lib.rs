//! Cadence engine crate.
//!
//! A minimal real-time rendering host: a native window, a GPU submission
//! queue, a small ring of presentation buffers, and a fence-based CPU/GPU
//! handshake driving a per-frame clear workload.
//!
//! The `frame` module is the core — it is generic over a device collaborator
//! so every synchronization invariant is testable without a GPU. `device` and
//! `window` are the wgpu/winit glue around it.

pub mod frame;
pub mod device;
pub mod window;
pub mod time;
pub mod paint;

pub mod logging;
