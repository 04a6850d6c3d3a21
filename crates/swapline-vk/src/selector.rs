// SPDX-License-Identifier: CEPL-1.0
use tracing::{debug, info};

use crate::catalog::AdapterDescriptor;
use crate::error::{PipelineError, PipelineResult};
use crate::requirements::DeviceRequirements;

/// First adapter, in enumeration order, meeting every requirement.
///
/// No ranking: a later discrete GPU never beats an earlier match.
pub fn select_adapter<'a>(
    adapters: &'a [AdapterDescriptor],
    requirements: &DeviceRequirements,
) -> PipelineResult<&'a AdapterDescriptor> {
    for adapter in adapters {
        match requirements.check(adapter) {
            Ok(()) => {
                info!(
                    "adapter selected: {} ({:?}, api {})",
                    adapter.name,
                    adapter.device_type,
                    adapter.api_version_string()
                );
                return Ok(adapter);
            }
            Err(unmet) => debug!("adapter rejected: {} ({unmet})", adapter.name),
        }
    }
    Err(PipelineError::NoSuitableAdapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QueueFamilyDescriptor;
    use crate::requirements::DeviceFeatures;
    use ash::vk::{self, Handle};
    use std::ffi::CString;

    fn adapter(id: u64, name: &str, api: u32, ty: vk::PhysicalDeviceType) -> AdapterDescriptor {
        let reqs = DeviceRequirements::standard();
        AdapterDescriptor {
            handle: vk::PhysicalDevice::from_raw(id),
            name: name.into(),
            device_type: ty,
            api_version: api,
            queue_families: vec![QueueFamilyDescriptor {
                index: 0,
                flags: vk::QueueFlags::GRAPHICS,
                queue_count: 1,
            }],
            extensions: reqs.extensions.iter().map(|e| CString::from(*e)).collect(),
            features: reqs.features,
        }
    }

    #[test]
    fn picks_first_match_not_best() {
        let adapters = vec![
            adapter(1, "old", vk::API_VERSION_1_1, vk::PhysicalDeviceType::DISCRETE_GPU),
            adapter(2, "igpu", vk::API_VERSION_1_3, vk::PhysicalDeviceType::INTEGRATED_GPU),
            adapter(3, "dgpu", vk::API_VERSION_1_3, vk::PhysicalDeviceType::DISCRETE_GPU),
        ];
        let picked = select_adapter(&adapters, &DeviceRequirements::standard()).unwrap();
        assert_eq!(picked.name, "igpu");
    }

    #[test]
    fn joint_predicate_must_hold_on_one_adapter() {
        let mut no_features = adapter(1, "a", vk::API_VERSION_1_3, vk::PhysicalDeviceType::CPU);
        no_features.features = DeviceFeatures::empty();
        let mut no_exts = adapter(2, "b", vk::API_VERSION_1_3, vk::PhysicalDeviceType::CPU);
        no_exts.extensions.clear();

        let err = select_adapter(&[no_features, no_exts], &DeviceRequirements::standard())
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoSuitableAdapter));
    }

    #[test]
    fn empty_catalog_fails() {
        let err = select_adapter(&[], &DeviceRequirements::standard()).unwrap_err();
        assert!(matches!(err, PipelineError::NoSuitableAdapter));
    }
}
