use std::sync::{Arc, Mutex};

use log::trace;

use super::gpu::Gpu;
use crate::frame::{DeviceError, FrameCommand, GpuDevice};

/// Presentation buffer handle for the real surface.
///
/// wgpu owns the swapchain images internally and only ever exposes the
/// current one, so the handle identifies a ring slot rather than a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotBuffer {
    pub slot: usize,
    pub width: u32,
    pub height: u32,
}

/// Fence completion state shared with the queue's work-done callbacks.
#[derive(Debug, Default)]
struct FenceState {
    completed: Mutex<Option<u64>>,
}

impl FenceState {
    fn complete_up_to(&self, value: u64) {
        let mut completed = self.completed.lock().unwrap_or_else(|e| e.into_inner());
        *completed = Some(completed.map_or(value, |c| c.max(value)));
    }

    fn value(&self) -> Option<u64> {
        *self.completed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// [`GpuDevice`] implementation over a real window surface.
///
/// Submission acquires the current swapchain texture and encodes the command
/// batch; the explicit state transitions are no-ops because wgpu tracks
/// resource states internally. The fence is realized with
/// `Queue::on_submitted_work_done` advancing [`FenceState`], pumped by
/// `Device::poll` during blocking waits.
pub struct SurfaceDevice {
    gpu: Gpu,
    fence: Arc<FenceState>,
    slot_count: usize,
    current_slot: usize,
    /// Texture acquired by the last submission, awaiting its present call.
    pending_present: Option<wgpu::SurfaceTexture>,
}

impl SurfaceDevice {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            fence: Arc::new(FenceState::default()),
            slot_count: 0,
            current_slot: 0,
            pending_present: None,
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, DeviceError> {
        match self.gpu.surface().get_current_texture() {
            Ok(texture) => Ok(texture),
            // A lost or outdated surface gets one reconfigure before the
            // failure becomes fatal for the frame.
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                self.gpu
                    .surface()
                    .get_current_texture()
                    .map_err(|e| DeviceError::BufferAcquisition(e.to_string()))
            }
            Err(e) => Err(DeviceError::BufferAcquisition(e.to_string())),
        }
    }
}

impl GpuDevice for SurfaceDevice {
    type Buffer = SlotBuffer;

    fn create_buffers(
        &mut self,
        count: usize,
        width: u32,
        height: u32,
    ) -> Result<Vec<SlotBuffer>, DeviceError> {
        // Reconfiguring the surface releases the previous swapchain images.
        self.pending_present = None;
        self.gpu.configure(width, height);
        self.slot_count = count;
        self.current_slot = 0;
        Ok((0..count)
            .map(|slot| SlotBuffer { slot, width, height })
            .collect())
    }

    fn current_buffer_index(&mut self) -> Result<usize, DeviceError> {
        Ok(self.current_slot)
    }

    fn submit(&mut self, commands: &[FrameCommand<SlotBuffer>]) -> Result<(), DeviceError> {
        let texture = self.acquire()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cadence frame encoder"),
            });

        for command in commands {
            match command {
                FrameCommand::Transition { from, to, .. } => {
                    // wgpu inserts barriers from its own usage tracking.
                    trace!("transition {from:?} -> {to:?} (implicit under wgpu)");
                }
                FrameCommand::Clear { color, .. } => {
                    // Clear pass — dropped before the encoder is finished.
                    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("cadence clear"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: color.r as f64,
                                    g: color.g as f64,
                                    b: color.b as f64,
                                    a: color.a as f64,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                }
            }
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));
        self.pending_present = Some(texture);
        Ok(())
    }

    fn present(&mut self, _buffer: &SlotBuffer) -> Result<(), DeviceError> {
        let texture = self.pending_present.take().ok_or_else(|| {
            DeviceError::PresentRejected("no surface texture acquired this frame".to_string())
        })?;
        texture.present();
        if self.slot_count > 0 {
            self.current_slot = (self.current_slot + 1) % self.slot_count;
        }
        Ok(())
    }

    fn signal(&mut self, value: u64) -> Result<(), DeviceError> {
        let fence = Arc::clone(&self.fence);
        self.gpu.queue().on_submitted_work_done(move || {
            fence.complete_up_to(value);
        });
        Ok(())
    }

    fn completed_value(&self) -> Option<u64> {
        self.fence.value()
    }

    fn wait_for_value(&mut self, value: u64) -> Result<(), DeviceError> {
        while !self.completed_value().is_some_and(|c| c >= value) {
            self.gpu
                .device()
                .poll(wgpu::PollType::wait_indefinitely())
                .map_err(|e| DeviceError::DeviceLost(e.to_string()))?;
        }
        Ok(())
    }
}
