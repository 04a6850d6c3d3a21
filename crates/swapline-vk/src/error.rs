// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;

use ash::vk;
use thiserror::Error;

use crate::pipeline::Stage;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Every failure is fatal to the pipeline; nothing here is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no adapter satisfies the device requirements")]
    NoSuitableAdapter,

    #[error("no queue family supports both graphics and presentation to the surface")]
    NoSuitableQueueFamily,

    #[error("presentation chain creation failed: {0}")]
    PresentationChainCreationFailed(vk::Result),

    #[error("image view creation failed for swapchain image {index}: {result}")]
    ViewCreationFailed { index: usize, result: vk::Result },

    #[error("surface reports no formats")]
    NoSurfaceFormats,

    #[error("failed to load the Vulkan library: {0}")]
    Loader(#[from] ash::LoadingError),

    #[error("window handle unavailable: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),

    #[error("required instance extension not supported: {0:?}")]
    MissingInstanceExtension(CString),

    #[error("required layer not supported: {0:?}")]
    MissingLayer(CString),

    #[error("pipeline stage out of order: expected {expected:?}, found {found:?}")]
    OutOfOrder { expected: Stage, found: Stage },

    #[error("{call} failed: {result}")]
    Driver {
        call: &'static str,
        result: vk::Result,
    },
}

impl PipelineError {
    pub(crate) fn driver(call: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| PipelineError::Driver { call, result }
    }
}
