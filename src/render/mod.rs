use glam::{Vec3, Vec4};

/// Partial sub-image upload into one layer of the clipmap's layered GPU
/// texture.
///
/// The clipmap core has no compile-time dependency on a concrete graphics
/// API; the application implements this trait over whatever it renders with.
pub trait Renderer {
    /// Uploads a `width` x `height` sub-rectangle into `layer` at
    /// `(dst_x, dst_y)`.
    ///
    /// `data` is always a full level slice with `row_length` pixels per row;
    /// `(src_x, src_y)` select where the sub-rectangle starts inside it. The
    /// pixel format (RGB or RGBA) matches the clipmap configuration.
    #[allow(clippy::too_many_arguments)]
    fn update_texture_sub_image(
        &mut self,
        dst_x: u32,
        dst_y: u32,
        layer: u32,
        width: u32,
        height: u32,
        data: &[u8],
        src_x: u32,
        src_y: u32,
        row_length: u32,
    );
}

/// Named uniform sink for the clipmap shader.
///
/// The engine tolerates not having one bound; uniform publishing is simply
/// deferred until the application provides an implementation.
pub trait ShaderUniforms {
    fn set_i32(&mut self, name: &str, value: i32);
    fn set_f32(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_vec4(&mut self, name: &str, value: Vec4);
    fn set_f32_array(&mut self, name: &str, values: &[f32]);
}

/// Renderer that discards every upload. Used for headless runs, where the
/// caches and level buffers still stream but nothing reaches a GPU.
#[derive(Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn update_texture_sub_image(
        &mut self,
        _dst_x: u32,
        _dst_y: u32,
        _layer: u32,
        _width: u32,
        _height: u32,
        _data: &[u8],
        _src_x: u32,
        _src_y: u32,
        _row_length: u32,
    ) {
    }
}
