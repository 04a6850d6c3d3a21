// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;
use std::ffi::{CStr, CString};

use ash::vk;

use crate::requirements::DeviceFeatures;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilyDescriptor {
    pub index: u32,
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
}

impl QueueFamilyDescriptor {
    pub fn supports_graphics(&self) -> bool {
        self.flags.contains(vk::QueueFlags::GRAPHICS)
    }
}

/// Snapshot of one physical device as enumerated by the driver.
///
/// Presentation support is deliberately absent: it depends on the surface
/// and is queried separately per queue family.
#[derive(Clone, Debug)]
pub struct AdapterDescriptor {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,
    pub queue_families: Vec<QueueFamilyDescriptor>,
    pub extensions: BTreeSet<CString>,
    pub features: DeviceFeatures,
}

impl AdapterDescriptor {
    pub fn supports_extension(&self, name: &CStr) -> bool {
        self.extensions.contains(name)
    }

    pub fn has_graphics_queue(&self) -> bool {
        self.queue_families.iter().any(|q| q.supports_graphics())
    }

    pub fn api_version_string(&self) -> String {
        format!(
            "{}.{}.{}",
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version)
        )
    }
}
