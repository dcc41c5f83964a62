use anyhow::Result;

use cadence_engine::device::GpuInit;
use cadence_engine::logging::{LoggingConfig, init_logging};
use cadence_engine::paint::Color;
use cadence_engine::time::FrameTime;
use cadence_engine::window::{App, HostConfig, Runtime};

/// Clear-color sample: pulses between red and a dark tone.
#[derive(Default)]
struct ClearApp {
    elapsed: f32,
}

impl App for ClearApp {
    fn clear_color(&mut self, time: FrameTime) -> Color {
        self.elapsed += time.dt;
        let pulse = 0.5 + 0.5 * (self.elapsed * 1.5).sin();
        Color::rgb(0.25 + 0.75 * pulse, 0.05, 0.08)
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    log::info!("cadence host starting");

    Runtime::run(
        HostConfig {
            title: "cadence".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        ClearApp::default(),
    )
}
