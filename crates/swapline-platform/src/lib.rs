// SPDX-License-Identifier: CEPL-1.0
pub use winit;

use swapline_surface::{DrawableSize, PresentTarget};
use winit::raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use winit::window::Window;

/// A winit window acting as the presentation target.
pub struct AppWindow {
    window: Window,
}

impl AppWindow {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl HasWindowHandle for AppWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for AppWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl PresentTarget for AppWindow {
    fn drawable_size(&self) -> DrawableSize {
        let size = self.window.inner_size();
        DrawableSize::new(size.width, size.height)
    }
}
