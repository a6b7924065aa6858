//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering

mod frame;
mod gpu;
mod init;

pub use frame::GpuFrame;
pub use gpu::{Gpu, SurfaceErrorAction};
pub use init::GpuInit;
