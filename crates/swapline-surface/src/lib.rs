// SPDX-License-Identifier: CEPL-1.0
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Drawable area of a window, in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawableSize {
    pub width: u32,
    pub height: u32,
}

impl DrawableSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Owner of the window a presentation surface is created for.
///
/// The handles feed surface creation; `drawable_size` is only consulted when
/// the surface leaves the image extent up to the application.
pub trait PresentTarget: HasWindowHandle + HasDisplayHandle {
    fn drawable_size(&self) -> DrawableSize;
}
