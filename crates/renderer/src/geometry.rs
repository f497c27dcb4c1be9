use crate::device::GraphicsDevice;
use crate::error::RendererError;

/// Two triangles covering clip space `[-1, 1]²`.
pub const FULLSCREEN_QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Immutable vertex buffer holding [`FULLSCREEN_QUAD`].
pub struct GeometryHandle<B> {
    buffer: B,
    vertex_count: u32,
}

impl<B> GeometryHandle<B> {
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn bind<D: GraphicsDevice<Buffer = B>>(&self, device: &mut D) {
        device.bind_vertex_buffer(&self.buffer);
    }

    pub fn release<D: GraphicsDevice<Buffer = B>>(self, device: &mut D) {
        device.release_buffer(self.buffer);
    }
}

pub fn create_fullscreen_quad<D: GraphicsDevice>(
    device: &mut D,
) -> Result<GeometryHandle<D::Buffer>, RendererError> {
    let buffer = device.create_vertex_buffer("fullscreen quad", &FULLSCREEN_QUAD)?;
    Ok(GeometryHandle {
        buffer,
        vertex_count: FULLSCREEN_QUAD.len() as u32,
    })
}
