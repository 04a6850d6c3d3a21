// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::prelude::VkResult;
use ash::vk;
use swapline_surface::PresentTarget;

use crate::catalog::AdapterDescriptor;
use crate::error::PipelineResult;
use crate::ledger::Resource;
use crate::requirements::DeviceFeatures;

/// Everything the device needs at creation: one queue, explicit opt-ins.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceRequest<'a> {
    pub family: u32,
    pub priority: f32,
    pub extensions: &'a [&'static CStr],
    pub features: DeviceFeatures,
}

/// The calls the negotiation pipeline makes into the graphics driver.
///
/// Implementations own the instance-level objects (loader, instance,
/// debug messenger) and release those themselves when dropped. Objects
/// created through this trait are released via [`Driver::destroy`], in the
/// order the pipeline decides.
pub trait Driver {
    fn create_surface(&mut self, target: &dyn PresentTarget) -> PipelineResult<vk::SurfaceKHR>;

    fn enumerate_adapters(&self) -> VkResult<Vec<AdapterDescriptor>>;

    fn surface_support(
        &self,
        adapter: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn create_device(
        &mut self,
        adapter: vk::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<vk::Device>;

    fn device_queue(&self, family: u32, index: u32) -> vk::Queue;

    fn surface_capabilities(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    fn surface_formats(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    fn present_modes(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    fn create_swapchain(
        &mut self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR>;

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;

    fn create_image_view(&mut self, info: &vk::ImageViewCreateInfo<'_>) -> VkResult<vk::ImageView>;

    /// Block until the device has no pending work. No-op without a device.
    fn wait_idle(&self);

    fn destroy(&mut self, resource: Resource);
}
