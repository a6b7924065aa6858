//! GPU buffer construction from CPU-side arrays.
//!
//! Vertex and index buffers are filled at creation. Uniform buffers are only
//! sized from their data; the caller writes them (every frame, in practice).
//! Every buffer is also `COPY_SRC` so its contents can be copied back out.

use anyhow::{ensure, Result};
use wgpu::util::DeviceExt;

/// Creates a vertex buffer holding `data`.
pub fn create_vertex_buffer(
    device: &wgpu::Device,
    data: &[f32],
    label: &str,
) -> Result<wgpu::Buffer> {
    create_init(
        device,
        bytemuck::cast_slice(data),
        wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        label,
    )
}

/// Creates an index buffer holding `data`.
pub fn create_index_buffer(
    device: &wgpu::Device,
    data: &[u16],
    label: &str,
) -> Result<wgpu::Buffer> {
    create_init(
        device,
        bytemuck::cast_slice(data),
        wgpu::BufferUsages::INDEX
            | wgpu::BufferUsages::VERTEX
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        label,
    )
}

/// Creates an uninitialized uniform buffer sized to hold `data`.
pub fn create_uniform_buffer(
    device: &wgpu::Device,
    data: &[f32],
    label: &str,
) -> Result<wgpu::Buffer> {
    let size = std::mem::size_of_val(data) as u64;
    check_size(device, size, label)?;

    Ok(device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    }))
}

/// Creates a short-lived copy source holding `contents`, for uploads that are
/// recorded into an encoder instead of queued.
pub fn create_staging_buffer(
    device: &wgpu::Device,
    contents: &[u8],
    label: &str,
) -> Result<wgpu::Buffer> {
    create_init(device, contents, wgpu::BufferUsages::COPY_SRC, label)
}

fn create_init(
    device: &wgpu::Device,
    contents: &[u8],
    usage: wgpu::BufferUsages,
    label: &str,
) -> Result<wgpu::Buffer> {
    check_size(device, contents.len() as u64, label)?;

    Ok(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage,
    }))
}

/// Rejects sizes the device would refuse, before asking it.
fn check_size(device: &wgpu::Device, size: u64, label: &str) -> Result<()> {
    let max = device.limits().max_buffer_size;
    ensure!(
        size <= max,
        "buffer '{label}' needs {size} bytes, device max_buffer_size is {max}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::geometry::QUAD_INDICES;
    use crate::render::test_support::{headless_device, read_buffer};

    #[test]
    fn vertex_buffer_holds_data_on_creation() {
        let Some((device, queue)) = headless_device() else { return };

        let data: Vec<f32> = (0..28).map(|i| i as f32 * 0.5).collect();
        let buf = create_vertex_buffer(&device, &data, "test vbo").unwrap();
        assert_eq!(buf.size(), 28 * 4);
        assert!(buf.usage().contains(wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST));
        assert!(!buf.usage().contains(wgpu::BufferUsages::INDEX));

        assert_eq!(read_buffer(&device, &queue, &buf), bytemuck::cast_slice::<f32, u8>(&data));
    }

    #[test]
    fn index_buffer_holds_data_on_creation() {
        let Some((device, queue)) = headless_device() else { return };

        let buf = create_index_buffer(&device, &QUAD_INDICES, "test ibo").unwrap();
        assert_eq!(buf.size(), 6 * 2);
        assert!(buf.usage().contains(wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST));

        assert_eq!(
            read_buffer(&device, &queue, &buf),
            bytemuck::cast_slice::<u16, u8>(&QUAD_INDICES)
        );
    }

    #[test]
    fn uniform_buffer_is_empty_until_written() {
        let Some((device, queue)) = headless_device() else { return };

        let data: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let buf = create_uniform_buffer(&device, &data, "test ubo").unwrap();
        assert_eq!(buf.size(), 64);
        assert!(buf.usage().contains(wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST));
        assert_eq!(read_buffer(&device, &queue, &buf), vec![0u8; 64]);

        queue.write_buffer(&buf, 0, bytemuck::cast_slice(&data));
        assert_eq!(read_buffer(&device, &queue, &buf), bytemuck::cast_slice::<f32, u8>(&data));
    }

    #[test]
    fn staging_buffer_is_copy_source_only() {
        let Some((device, queue)) = headless_device() else { return };

        let buf = create_staging_buffer(&device, &[1, 2, 3, 4], "test staging").unwrap();
        assert_eq!(buf.usage(), wgpu::BufferUsages::COPY_SRC);
        assert_eq!(read_buffer(&device, &queue, &buf), vec![1, 2, 3, 4]);
    }

    #[test]
    fn oversized_request_is_rejected() {
        let Some((device, _queue)) = headless_device() else { return };

        let too_big = device.limits().max_buffer_size + 1;
        let err = check_size(&device, too_big, "huge").unwrap_err();
        assert!(err.to_string().contains("huge"));
    }
}
