// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_void, CStr, CString};

use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::prelude::VkResult;
use ash::{vk, Entry, Instance};
use swapline_surface::PresentTarget;
use tracing::{debug, info};

use crate::catalog::{AdapterDescriptor, QueueFamilyDescriptor};
use crate::diagnostics;
use crate::driver::{DeviceRequest, Driver};
use crate::error::{PipelineError, PipelineResult};
use crate::instance::{first_missing, InstanceSettings, VALIDATION_LAYER};
use crate::ledger::Resource;
use crate::requirements::DeviceFeatures;

struct DeviceState {
    device: ash::Device,
    swapchain_loader: swapchain::Device,
}

/// [`Driver`] over the system Vulkan loader.
///
/// Owns the instance and the optional debug messenger; both are released on
/// drop, after everything the pipeline created through it.
pub struct AshDriver {
    entry: Entry,
    instance: Instance,
    surface_loader: surface::Instance,
    debug: Option<(debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    device: Option<DeviceState>,
}

impl AshDriver {
    pub fn new(target: &dyn PresentTarget, settings: &InstanceSettings) -> PipelineResult<Self> {
        let entry = unsafe { Entry::load()? };
        let display = target.display_handle()?.as_raw();

        let window_system: Vec<&CStr> = ash_window::enumerate_required_extensions(display)
            .map_err(PipelineError::driver("ash_window::enumerate_required_extensions"))?
            .iter()
            .map(|&p| unsafe { CStr::from_ptr(p) })
            .collect();
        let extensions = settings.instance_extensions(&window_system);
        let available = unsafe { entry.enumerate_instance_extension_properties(None) }
            .map_err(PipelineError::driver("vkEnumerateInstanceExtensionProperties"))?
            .iter()
            .filter_map(|e| e.extension_name_as_c_str().ok().map(CStr::to_owned))
            .collect::<Vec<CString>>();
        if let Some(missing) = first_missing(&extensions, &available) {
            return Err(PipelineError::MissingInstanceExtension(missing));
        }

        let layers = settings.layers();
        if !layers.is_empty() {
            let available = unsafe { entry.enumerate_instance_layer_properties() }
                .map_err(PipelineError::driver("vkEnumerateInstanceLayerProperties"))?
                .iter()
                .filter_map(|l| l.layer_name_as_c_str().ok().map(CStr::to_owned))
                .collect::<Vec<CString>>();
            if let Some(missing) = first_missing(&layers, &available) {
                return Err(PipelineError::MissingLayer(missing));
            }
        }

        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_application_name: settings.app_name.as_ptr(),
            application_version: vk::make_api_version(0, 1, 0, 0),
            p_engine_name: settings.app_name.as_ptr(),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: settings.api_version,
            ..Default::default()
        };
        let ext_ptrs: Vec<_> = extensions.iter().map(|e| e.as_ptr()).collect();
        let layer_ptrs: Vec<_> = layers.iter().map(|l| l.as_ptr()).collect();
        let create_info = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            p_application_info: &app_info,
            enabled_extension_count: ext_ptrs.len() as u32,
            pp_enabled_extension_names: ext_ptrs.as_ptr(),
            enabled_layer_count: layer_ptrs.len() as u32,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            ..Default::default()
        };
        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(PipelineError::driver("vkCreateInstance"))?;
        let surface_loader = surface::Instance::new(&entry, &instance);

        let mut driver = AshDriver {
            entry,
            instance,
            surface_loader,
            debug: None,
            device: None,
        };

        // dropping `driver` on error releases the instance
        if settings.validation {
            let loader = debug_utils::Instance::new(&driver.entry, &driver.instance);
            let messenger = unsafe {
                loader.create_debug_utils_messenger(&diagnostics::messenger_create_info(), None)
            }
            .map_err(PipelineError::driver("vkCreateDebugUtilsMessengerEXT"))?;
            driver.debug = Some((loader, messenger));
            debug!("validation enabled ({VALIDATION_LAYER:?})");
        }

        info!(
            "instance ready (api {}.{}, {} extensions)",
            vk::api_version_major(settings.api_version),
            vk::api_version_minor(settings.api_version),
            extensions.len()
        );
        Ok(driver)
    }

    fn device_state(&self) -> VkResult<&DeviceState> {
        self.device
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn describe(&self, phys: vk::PhysicalDevice) -> VkResult<AdapterDescriptor> {
        let props = unsafe { self.instance.get_physical_device_properties(phys) };
        let name = props
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("<unnamed>"));

        let queue_families = unsafe { self.instance.get_physical_device_queue_family_properties(phys) }
            .iter()
            .enumerate()
            .map(|(i, q)| QueueFamilyDescriptor {
                index: i as u32,
                flags: q.queue_flags,
                queue_count: q.queue_count,
            })
            .collect();

        let extensions = unsafe { self.instance.enumerate_device_extension_properties(phys)? }
            .iter()
            .filter_map(|e| e.extension_name_as_c_str().ok().map(CStr::to_owned))
            .collect();

        // the 1.3 feature struct is only valid to chain on 1.3 devices
        let features = if props.api_version >= vk::API_VERSION_1_3 {
            self.query_features(phys)
        } else {
            DeviceFeatures::empty()
        };

        Ok(AdapterDescriptor {
            handle: phys,
            name,
            device_type: props.device_type,
            api_version: props.api_version,
            queue_families,
            extensions,
            features,
        })
    }

    fn query_features(&self, phys: vk::PhysicalDevice) -> DeviceFeatures {
        // chain: Features2 -> Vulkan13Features -> ExtendedDynamicStateFeaturesEXT
        let mut eds = vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT {
            s_type: vk::StructureType::PHYSICAL_DEVICE_EXTENDED_DYNAMIC_STATE_FEATURES_EXT,
            ..Default::default()
        };
        let mut feats13 = vk::PhysicalDeviceVulkan13Features {
            s_type: vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES,
            p_next: (&mut eds) as *mut _ as *mut c_void,
            ..Default::default()
        };
        let mut feats2 = vk::PhysicalDeviceFeatures2 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
            p_next: (&mut feats13) as *mut _ as *mut c_void,
            ..Default::default()
        };
        unsafe {
            self.instance
                .get_physical_device_features2(phys, &mut feats2)
        };
        features_from(&feats13, &eds)
    }
}

fn features_from(
    feats13: &vk::PhysicalDeviceVulkan13Features<'_>,
    eds: &vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT<'_>,
) -> DeviceFeatures {
    let mut out = DeviceFeatures::empty();
    out.set(DeviceFeatures::DYNAMIC_RENDERING, feats13.dynamic_rendering == vk::TRUE);
    out.set(DeviceFeatures::SYNCHRONIZATION_2, feats13.synchronization2 == vk::TRUE);
    out.set(
        DeviceFeatures::EXTENDED_DYNAMIC_STATE,
        eds.extended_dynamic_state == vk::TRUE,
    );
    out
}

/// Feature structs a device create chain carries after `PhysicalDeviceFeatures2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChainLinks {
    vulkan13: bool,
    extended_dynamic_state: bool,
}

impl ChainLinks {
    fn for_features(features: DeviceFeatures) -> Self {
        Self {
            vulkan13: features
                .intersects(DeviceFeatures::DYNAMIC_RENDERING | DeviceFeatures::SYNCHRONIZATION_2),
            extended_dynamic_state: features.contains(DeviceFeatures::EXTENDED_DYNAMIC_STATE),
        }
    }
}

fn bool32(on: bool) -> vk::Bool32 {
    if on {
        vk::TRUE
    } else {
        vk::FALSE
    }
}

impl Driver for AshDriver {
    fn create_surface(&mut self, target: &dyn PresentTarget) -> PipelineResult<vk::SurfaceKHR> {
        let display = target.display_handle()?.as_raw();
        let window = target.window_handle()?.as_raw();
        unsafe { ash_window::create_surface(&self.entry, &self.instance, display, window, None) }
            .map_err(PipelineError::driver("ash_window::create_surface"))
    }

    fn enumerate_adapters(&self) -> VkResult<Vec<AdapterDescriptor>> {
        unsafe { self.instance.enumerate_physical_devices()? }
            .into_iter()
            .map(|phys| self.describe(phys))
            .collect()
    }

    fn surface_support(
        &self,
        adapter: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_support(adapter, family, surface)
        }
    }

    fn create_device(
        &mut self,
        adapter: vk::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<vk::Device> {
        // structs must outlive create_device; each is only linked when one of its bits is asked for
        let mut eds = vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT {
            s_type: vk::StructureType::PHYSICAL_DEVICE_EXTENDED_DYNAMIC_STATE_FEATURES_EXT,
            extended_dynamic_state: vk::TRUE,
            ..Default::default()
        };
        let mut feats13 = vk::PhysicalDeviceVulkan13Features {
            s_type: vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES,
            dynamic_rendering: bool32(request.features.contains(DeviceFeatures::DYNAMIC_RENDERING)),
            synchronization2: bool32(request.features.contains(DeviceFeatures::SYNCHRONIZATION_2)),
            ..Default::default()
        };
        let links = ChainLinks::for_features(request.features);
        let mut head: *mut c_void = std::ptr::null_mut();
        if links.extended_dynamic_state {
            head = (&mut eds) as *mut _ as *mut c_void;
        }
        if links.vulkan13 {
            feats13.p_next = head;
            head = (&mut feats13) as *mut _ as *mut c_void;
        }
        let feats2 = vk::PhysicalDeviceFeatures2 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
            p_next: head,
            ..Default::default()
        };

        let priorities = [request.priority];
        let qinfo = vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: request.family,
            queue_count: 1,
            p_queue_priorities: priorities.as_ptr(),
            ..Default::default()
        };

        let ext_ptrs: Vec<_> = request.extensions.iter().map(|e| e.as_ptr()).collect();
        let dinfo = vk::DeviceCreateInfo {
            s_type: vk::StructureType::DEVICE_CREATE_INFO,
            p_next: (&feats2) as *const _ as *const c_void,
            queue_create_info_count: 1,
            p_queue_create_infos: &qinfo,
            enabled_extension_count: ext_ptrs.len() as u32,
            pp_enabled_extension_names: ext_ptrs.as_ptr(),
            ..Default::default()
        };

        let device = unsafe { self.instance.create_device(adapter, &dinfo, None)? };
        let swapchain_loader = swapchain::Device::new(&self.instance, &device);
        let handle = device.handle();
        self.device = Some(DeviceState {
            device,
            swapchain_loader,
        });
        Ok(handle)
    }

    fn device_queue(&self, family: u32, index: u32) -> vk::Queue {
        match &self.device {
            Some(state) => unsafe { state.device.get_device_queue(family, index) },
            None => vk::Queue::null(),
        }
    }

    fn surface_capabilities(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(adapter, surface)
        }
    }

    fn surface_formats(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(adapter, surface)
        }
    }

    fn present_modes(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(adapter, surface)
        }
    }

    fn create_swapchain(
        &mut self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        let state = self.device_state()?;
        unsafe { state.swapchain_loader.create_swapchain(info, None) }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let state = self.device_state()?;
        unsafe { state.swapchain_loader.get_swapchain_images(swapchain) }
    }

    fn create_image_view(&mut self, info: &vk::ImageViewCreateInfo<'_>) -> VkResult<vk::ImageView> {
        let state = self.device_state()?;
        unsafe { state.device.create_image_view(info, None) }
    }

    fn wait_idle(&self) {
        if let Some(state) = &self.device {
            unsafe { state.device.device_wait_idle() }.ok();
        }
    }

    fn destroy(&mut self, resource: Resource) {
        debug!("destroy {resource:?}");
        unsafe {
            match resource {
                Resource::ImageView(view) => {
                    if let Some(state) = &self.device {
                        state.device.destroy_image_view(view, None);
                    }
                }
                Resource::Swapchain(sc) => {
                    if let Some(state) = &self.device {
                        state.swapchain_loader.destroy_swapchain(sc, None);
                    }
                }
                Resource::Device(_) => {
                    if let Some(state) = self.device.take() {
                        state.device.destroy_device(None);
                    }
                }
                Resource::Surface(s) => self.surface_loader.destroy_surface(s, None),
            }
        }
    }
}

// Instance-level objects go last: the pipeline has already unwound
// views, swapchain, device and surface by the time this runs.
impl Drop for AshDriver {
    fn drop(&mut self) {
        unsafe {
            if let Some(state) = self.device.take() {
                state.device.device_wait_idle().ok();
                state.device.destroy_device(None);
            }
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        debug!("instance released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::DeviceRequirements;

    #[test]
    fn feature_bits_follow_the_chain() {
        let feats13 = vk::PhysicalDeviceVulkan13Features {
            dynamic_rendering: vk::TRUE,
            synchronization2: vk::FALSE,
            ..Default::default()
        };
        let eds = vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT {
            extended_dynamic_state: vk::TRUE,
            ..Default::default()
        };
        assert_eq!(
            features_from(&feats13, &eds),
            DeviceFeatures::DYNAMIC_RENDERING | DeviceFeatures::EXTENDED_DYNAMIC_STATE
        );

        let none = features_from(&Default::default(), &Default::default());
        assert!(none.is_empty());
    }

    #[test]
    fn chain_links_only_what_is_requested() {
        assert_eq!(
            ChainLinks::for_features(DeviceFeatures::EXTENDED_DYNAMIC_STATE),
            ChainLinks {
                vulkan13: false,
                extended_dynamic_state: true,
            }
        );
        assert_eq!(
            ChainLinks::for_features(DeviceFeatures::SYNCHRONIZATION_2),
            ChainLinks {
                vulkan13: true,
                extended_dynamic_state: false,
            }
        );
        assert_eq!(
            ChainLinks::for_features(DeviceFeatures::empty()),
            ChainLinks {
                vulkan13: false,
                extended_dynamic_state: false,
            }
        );
        assert_eq!(
            ChainLinks::for_features(DeviceRequirements::standard().features),
            ChainLinks {
                vulkan13: true,
                extended_dynamic_state: true,
            }
        );
    }
}
