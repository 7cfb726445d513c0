//! The rendering seam between the scene host and the capture pipeline.

use glam::Vec4;

use crate::camera::Camera;
use crate::scene::SceneGraph;

/// Memory order of rows returned by [`Renderer::read_pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// First row in memory is the top scan-line.
    #[default]
    TopDown,
    /// First row in memory is the bottom scan-line (GL convention).
    BottomUp,
}

/// A rectangular pixel region, origin at the first row in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// The whole of a `width` x `height` target.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Byte length of an RGBA8 readback of this region.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Returns true if the region lies within a `width` x `height` target.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Renders a scene graph through a camera into a display or offscreen target.
///
/// Targets are RGBA8. Rendering and readback block the caller until the
/// device has finished.
pub trait Renderer {
    /// Handle to an offscreen render target.
    type Target;
    /// Backend error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates an offscreen RGBA8 target.
    fn create_target(&mut self, width: u32, height: u32) -> Result<Self::Target, Self::Error>;

    /// Releases an offscreen target.
    fn destroy_target(&mut self, target: Self::Target);

    /// Binds an offscreen target, or the display destination for `None`.
    fn set_render_target(&mut self, target: Option<&Self::Target>);

    /// The color the bound destination is cleared to before drawing.
    fn clear_color(&self) -> Vec4;

    /// Sets the clear color.
    fn set_clear_color(&mut self, color: Vec4);

    /// Clears the bound destination and draws every mesh of `scene`.
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), Self::Error>;

    /// Reads RGBA8 pixels of `region` back from `target`.
    fn read_pixels(
        &mut self,
        target: &Self::Target,
        region: PixelRegion,
    ) -> Result<Vec<u8>, Self::Error>;

    /// Row order of buffers returned by [`Self::read_pixels`].
    fn row_order(&self) -> RowOrder;

    /// Resizes the display destination. Offscreen targets are unaffected.
    fn resize_display(&mut self, _width: u32, _height: u32) {}
}
