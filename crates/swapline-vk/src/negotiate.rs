// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use swapline_surface::DrawableSize;
use tracing::info;

use crate::catalog::AdapterDescriptor;
use crate::driver::Driver;
use crate::error::{PipelineError, PipelineResult};

pub const PREFERRED_IMAGE_COUNT: u32 = 3;

/// `current_extent.width` value meaning "the application picks the size".
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

/// MAILBOX when offered, otherwise FIFO, which every surface supports.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// `drawable` is only called when the surface leaves the extent undefined.
pub fn choose_extent<F>(caps: &vk::SurfaceCapabilitiesKHR, drawable: F) -> vk::Extent2D
where
    F: FnOnce() -> DrawableSize,
{
    if caps.current_extent.width != UNDEFINED_EXTENT {
        return caps.current_extent;
    }
    let want = drawable();
    vk::Extent2D {
        width: want
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: want
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// Triple buffering, raised to the surface minimum and capped by its
/// maximum (0 = no maximum).
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = PREFERRED_IMAGE_COUNT.max(caps.min_image_count);
    if caps.max_image_count > 0 && count > caps.max_image_count {
        caps.max_image_count
    } else {
        count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainPlan {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainPlan {
    pub fn negotiate<F>(
        caps: &vk::SurfaceCapabilitiesKHR,
        formats: &[vk::SurfaceFormatKHR],
        modes: &[vk::PresentModeKHR],
        drawable: F,
    ) -> PipelineResult<Self>
    where
        F: FnOnce() -> DrawableSize,
    {
        let surface_format = choose_surface_format(formats).ok_or(PipelineError::NoSurfaceFormats)?;
        Ok(Self {
            surface_format,
            present_mode: choose_present_mode(modes),
            extent: choose_extent(caps, drawable),
            image_count: choose_image_count(caps),
            pre_transform: caps.current_transform,
        })
    }

    pub fn create_info(&self, surface: vk::SurfaceKHR) -> vk::SwapchainCreateInfoKHR<'static> {
        vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface,
            min_image_count: self.image_count,
            image_format: self.surface_format.format,
            image_color_space: self.surface_format.color_space,
            image_extent: self.extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            pre_transform: self.pre_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: self.present_mode,
            clipped: vk::TRUE,
            old_swapchain: vk::SwapchainKHR::null(),
            ..Default::default()
        }
    }
}

/// A created swapchain with its images in driver order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentationChain {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub plan: SwapchainPlan,
}

impl PresentationChain {
    pub fn format(&self) -> vk::Format {
        self.plan.surface_format.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.plan.extent
    }
}

/// A lost surface means no chain can be built on it; anything else is a
/// plain driver failure.
fn surface_query(call: &'static str) -> impl FnOnce(vk::Result) -> PipelineError {
    move |result| match result {
        vk::Result::ERROR_SURFACE_LOST_KHR => PipelineError::PresentationChainCreationFailed(result),
        other => PipelineError::Driver { call, result: other },
    }
}

/// Queries the (adapter, surface) pair, negotiates, and creates the chain.
///
/// `on_created` receives the swapchain before its images are fetched so the
/// caller owns it even if that fetch fails.
pub fn create_chain<D, F>(
    driver: &mut D,
    adapter: &AdapterDescriptor,
    surface: vk::SurfaceKHR,
    drawable: F,
    on_created: impl FnOnce(vk::SwapchainKHR),
) -> PipelineResult<PresentationChain>
where
    D: Driver + ?Sized,
    F: FnOnce() -> DrawableSize,
{
    let caps = driver
        .surface_capabilities(adapter.handle, surface)
        .map_err(surface_query("vkGetPhysicalDeviceSurfaceCapabilitiesKHR"))?;
    let formats = driver
        .surface_formats(adapter.handle, surface)
        .map_err(surface_query("vkGetPhysicalDeviceSurfaceFormatsKHR"))?;
    let modes = driver
        .present_modes(adapter.handle, surface)
        .map_err(surface_query("vkGetPhysicalDeviceSurfacePresentModesKHR"))?;

    let plan = SwapchainPlan::negotiate(&caps, &formats, &modes, drawable)?;
    info!(
        "swapchain plan: format {:?} / {:?}, present {:?}, extent {}x{}, images {} (min={} max={})",
        plan.surface_format.format,
        plan.surface_format.color_space,
        plan.present_mode,
        plan.extent.width,
        plan.extent.height,
        plan.image_count,
        caps.min_image_count,
        caps.max_image_count
    );

    let swapchain = driver
        .create_swapchain(&plan.create_info(surface))
        .map_err(PipelineError::PresentationChainCreationFailed)?;
    on_created(swapchain);

    let images = driver
        .swapchain_images(swapchain)
        .map_err(PipelineError::PresentationChainCreationFailed)?;

    Ok(PresentationChain {
        swapchain,
        images,
        plan,
    })
}
