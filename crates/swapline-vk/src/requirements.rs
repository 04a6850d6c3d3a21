// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::vk;
use bitflags::bitflags;

use crate::catalog::AdapterDescriptor;

bitflags! {
    /// Optional device features the pipeline can require and opt into.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DeviceFeatures: u32 {
        const DYNAMIC_RENDERING = 1 << 0;
        const SYNCHRONIZATION_2 = 1 << 1;
        const EXTENDED_DYNAMIC_STATE = 1 << 2;
    }
}

/// First clause of [`DeviceRequirements`] an adapter fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unmet {
    ApiVersion { required: u32, found: u32 },
    GraphicsQueue,
    Extension(&'static CStr),
    Features(DeviceFeatures),
}

impl std::fmt::Display for Unmet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unmet::ApiVersion { required, found } => write!(
                f,
                "api {}.{} < {}.{}",
                vk::api_version_major(*found),
                vk::api_version_minor(*found),
                vk::api_version_major(*required),
                vk::api_version_minor(*required)
            ),
            Unmet::GraphicsQueue => write!(f, "no graphics queue family"),
            Unmet::Extension(name) => write!(f, "missing extension {name:?}"),
            Unmet::Features(missing) => write!(f, "missing features {missing:?}"),
        }
    }
}

/// The requirement set checked at selection and enabled at device creation.
///
/// One value is handed to both stages so the checked set and the enabled
/// set cannot drift apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRequirements {
    pub min_api_version: u32,
    pub graphics_queue: bool,
    pub extensions: Vec<&'static CStr>,
    pub features: DeviceFeatures,
}

impl DeviceRequirements {
    pub fn standard() -> Self {
        Self {
            min_api_version: vk::API_VERSION_1_3,
            graphics_queue: true,
            extensions: vec![
                ash::khr::swapchain::NAME,
                ash::khr::spirv_1_4::NAME,
                ash::khr::synchronization2::NAME,
                ash::khr::create_renderpass2::NAME,
            ],
            features: DeviceFeatures::DYNAMIC_RENDERING | DeviceFeatures::EXTENDED_DYNAMIC_STATE,
        }
    }

    pub fn check(&self, adapter: &AdapterDescriptor) -> Result<(), Unmet> {
        if adapter.api_version < self.min_api_version {
            return Err(Unmet::ApiVersion {
                required: self.min_api_version,
                found: adapter.api_version,
            });
        }
        if self.graphics_queue && !adapter.has_graphics_queue() {
            return Err(Unmet::GraphicsQueue);
        }
        if let Some(name) = self
            .extensions
            .iter()
            .copied()
            .find(|name| !adapter.supports_extension(name))
        {
            return Err(Unmet::Extension(name));
        }
        let missing = self.features - adapter.features;
        if !missing.is_empty() {
            return Err(Unmet::Features(missing));
        }
        Ok(())
    }

    pub fn is_met_by(&self, adapter: &AdapterDescriptor) -> bool {
        self.check(adapter).is_ok()
    }
}

impl Default for DeviceRequirements {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QueueFamilyDescriptor;
    use ash::vk::Handle;
    use std::ffi::CString;

    fn adapter() -> AdapterDescriptor {
        let reqs = DeviceRequirements::standard();
        AdapterDescriptor {
            handle: vk::PhysicalDevice::from_raw(1),
            name: "test".into(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::API_VERSION_1_3,
            queue_families: vec![QueueFamilyDescriptor {
                index: 0,
                flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
                queue_count: 1,
            }],
            extensions: reqs.extensions.iter().map(|e| CString::from(*e)).collect(),
            features: reqs.features,
        }
    }

    #[test]
    fn accepts_adapter_meeting_every_clause() {
        assert_eq!(DeviceRequirements::standard().check(&adapter()), Ok(()));
    }

    #[test]
    fn rejects_old_api_version() {
        let mut a = adapter();
        a.api_version = vk::API_VERSION_1_2;
        assert!(matches!(
            DeviceRequirements::standard().check(&a),
            Err(Unmet::ApiVersion { .. })
        ));
    }

    #[test]
    fn rejects_adapter_without_graphics_family() {
        let mut a = adapter();
        a.queue_families[0].flags = vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER;
        assert_eq!(
            DeviceRequirements::standard().check(&a),
            Err(Unmet::GraphicsQueue)
        );
    }

    #[test]
    fn graphics_clause_can_be_waived() {
        let mut a = adapter();
        a.queue_families.clear();
        let reqs = DeviceRequirements {
            graphics_queue: false,
            ..DeviceRequirements::standard()
        };
        assert!(reqs.is_met_by(&a));
    }

    #[test]
    fn extension_match_is_exact_and_case_sensitive() {
        let mut a = adapter();
        a.extensions.remove(ash::khr::spirv_1_4::NAME);
        a.extensions.insert(CString::new("vk_khr_spirv_1_4").unwrap());
        assert_eq!(
            DeviceRequirements::standard().check(&a),
            Err(Unmet::Extension(ash::khr::spirv_1_4::NAME))
        );
    }

    #[test]
    fn reports_only_the_missing_features() {
        let mut a = adapter();
        a.features = DeviceFeatures::DYNAMIC_RENDERING | DeviceFeatures::SYNCHRONIZATION_2;
        assert_eq!(
            DeviceRequirements::standard().check(&a),
            Err(Unmet::Features(DeviceFeatures::EXTENDED_DYNAMIC_STATE))
        );
    }

    #[test]
    fn extra_adapter_features_are_fine() {
        let mut a = adapter();
        a.features = DeviceFeatures::all();
        assert!(DeviceRequirements::standard().is_met_by(&a));
    }
}
