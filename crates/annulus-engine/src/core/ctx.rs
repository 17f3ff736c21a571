use winit::window::Window;

use crate::device::Gpu;
use crate::window::RuntimeCtx;

/// Read-only view of the window being drawn.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Physical size as `(width, height)`.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Width over height; 1 for a minimized window.
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.physical_size();
        if w == 0 || h == 0 { 1.0 } else { w as f32 / h as f32 }
    }
}

/// Everything `App::on_frame` may touch during one redraw.
///
/// `'a` bounds the callback; `'w` is the window borrow held by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    /// Redraws handled so far, this one included.
    pub redraw_index: u64,
    pub runtime: &'a mut RuntimeCtx,
}
