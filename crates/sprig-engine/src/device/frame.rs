/// A swapchain image acquired for one frame, plus the encoder recording into it.
///
/// Short-lived: holding the surface texture blocks acquisition of the next one.
/// Hand it back to [`Gpu::submit`](super::Gpu::submit) to present, or drop it
/// to discard the frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
