//! Color values for the clear workload.

mod color;

pub use color::Color;
