// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::{debug, info, warn};

use crate::catalog::{AdapterDescriptor, QueueFamilyDescriptor};
use crate::driver::{DeviceRequest, Driver};
use crate::error::{PipelineError, PipelineResult};
use crate::requirements::DeviceRequirements;

pub const QUEUE_PRIORITY: f32 = 0.5;

/// Logical device plus the single queue later submissions go to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceBundle {
    pub device: vk::Device,
    pub queue_family: u32,
    pub queue: vk::Queue,
}

/// First family in index order with graphics flags that `can_present`
/// confirms. Non-graphics families are never probed.
pub fn find_present_family<F>(families: &[QueueFamilyDescriptor], mut can_present: F) -> Option<u32>
where
    F: FnMut(u32) -> bool,
{
    families
        .iter()
        .filter(|q| q.supports_graphics())
        .map(|q| q.index)
        .find(|&index| can_present(index))
}

pub fn device_request(family: u32, requirements: &DeviceRequirements) -> DeviceRequest<'_> {
    DeviceRequest {
        family,
        priority: QUEUE_PRIORITY,
        extensions: &requirements.extensions,
        features: requirements.features,
    }
}

/// Opens the logical device on `adapter` with one queue able to both draw
/// and present to `surface`.
///
/// `requirements` must be the same value the adapter was selected with; it
/// is checked again here because this is where the opt-ins take effect.
pub fn build_device<D: Driver + ?Sized>(
    driver: &mut D,
    adapter: &AdapterDescriptor,
    surface: vk::SurfaceKHR,
    requirements: &DeviceRequirements,
) -> PipelineResult<DeviceBundle> {
    if let Err(unmet) = requirements.check(adapter) {
        warn!("adapter {} no longer meets requirements: {unmet}", adapter.name);
        return Err(PipelineError::NoSuitableAdapter);
    }

    let family = find_present_family(&adapter.queue_families, |index| {
        match driver.surface_support(adapter.handle, index, surface) {
            Ok(supported) => supported,
            Err(e) => {
                debug!("present support query failed for family {index}: {e}");
                false
            }
        }
    })
    .ok_or(PipelineError::NoSuitableQueueFamily)?;

    let request = device_request(family, requirements);
    let device = driver
        .create_device(adapter.handle, &request)
        .map_err(PipelineError::driver("vkCreateDevice"))?;
    let queue = driver.device_queue(family, 0);

    info!(
        "device ready on {} (queue family {family}, {} extensions, features {:?})",
        adapter.name,
        requirements.extensions.len(),
        requirements.features
    );
    Ok(DeviceBundle {
        device,
        queue_family: family,
        queue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(index: u32, flags: vk::QueueFlags) -> QueueFamilyDescriptor {
        QueueFamilyDescriptor {
            index,
            flags,
            queue_count: 1,
        }
    }

    #[test]
    fn needs_graphics_and_present_on_the_same_family() {
        let families = [
            family(0, vk::QueueFlags::GRAPHICS),
            family(1, vk::QueueFlags::TRANSFER),
            family(2, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
        ];
        // family 1 presents but cannot draw; family 0 draws but cannot present
        let found = find_present_family(&families, |i| i != 0);
        assert_eq!(found, Some(2));
    }

    #[test]
    fn only_graphics_families_are_probed() {
        let families = [
            family(0, vk::QueueFlags::COMPUTE),
            family(1, vk::QueueFlags::GRAPHICS),
        ];
        let mut probed = Vec::new();
        let found = find_present_family(&families, |i| {
            probed.push(i);
            true
        });
        assert_eq!(found, Some(1));
        assert_eq!(probed, vec![1]);
    }

    #[test]
    fn none_when_no_family_presents() {
        let families = [family(0, vk::QueueFlags::GRAPHICS)];
        assert_eq!(find_present_family(&families, |_| false), None);
    }

    #[test]
    fn request_mirrors_requirements() {
        let reqs = DeviceRequirements::standard();
        let request = device_request(4, &reqs);
        assert_eq!(request.family, 4);
        assert_eq!(request.priority, 0.5);
        assert_eq!(request.extensions, reqs.extensions.as_slice());
        assert_eq!(request.features, reqs.features);
    }
}
