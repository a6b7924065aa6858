//! Sprig engine crate.
//!
//! A minimal 2D sprite renderer on wgpu: the platform + GPU runtime, a camera,
//! and a per-frame sprite draw protocol.

pub mod device;
pub mod window;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
