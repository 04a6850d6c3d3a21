// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use ash::vk;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

#[derive(Clone, Debug)]
pub struct InstanceSettings {
    pub app_name: CString,
    pub api_version: u32,
    /// Khronos validation layer plus a debug messenger.
    pub validation: bool,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            app_name: c"swapline".to_owned(),
            api_version: vk::API_VERSION_1_3,
            validation: cfg!(debug_assertions),
        }
    }
}

impl InstanceSettings {
    /// Window-system extensions plus whatever validation needs.
    pub fn instance_extensions<'a>(&self, window_system: &[&'a CStr]) -> Vec<&'a CStr> {
        let mut extensions = window_system.to_vec();
        if self.validation {
            extensions.push(ash::ext::debug_utils::NAME);
        }
        extensions
    }

    pub fn layers(&self) -> Vec<&'static CStr> {
        if self.validation {
            vec![VALIDATION_LAYER]
        } else {
            Vec::new()
        }
    }
}

/// First entry of `required` absent from `available` (exact match).
pub fn first_missing(required: &[&CStr], available: &[CString]) -> Option<CString> {
    required
        .iter()
        .find(|name| !available.iter().any(|have| have.as_c_str() == **name))
        .map(|name| (*name).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_adds_debug_utils_and_layer() {
        let settings = InstanceSettings {
            validation: true,
            ..Default::default()
        };
        let exts = settings.instance_extensions(&[ash::khr::surface::NAME]);
        assert_eq!(exts, vec![ash::khr::surface::NAME, ash::ext::debug_utils::NAME]);
        assert_eq!(settings.layers(), vec![VALIDATION_LAYER]);
    }

    #[test]
    fn release_settings_request_nothing_extra() {
        let settings = InstanceSettings {
            validation: false,
            ..Default::default()
        };
        let exts = settings.instance_extensions(&[ash::khr::surface::NAME]);
        assert_eq!(exts, vec![ash::khr::surface::NAME]);
        assert!(settings.layers().is_empty());
    }

    #[test]
    fn reports_first_missing_name() {
        let available = vec![ash::khr::surface::NAME.to_owned()];
        assert_eq!(first_missing(&[ash::khr::surface::NAME], &available), None);
        assert_eq!(
            first_missing(
                &[ash::khr::surface::NAME, VALIDATION_LAYER, ash::ext::debug_utils::NAME],
                &available
            ),
            Some(VALIDATION_LAYER.to_owned())
        );
    }
}
