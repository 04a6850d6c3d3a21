// SPDX-License-Identifier: CEPL-1.0
use std::borrow::Cow;
use std::ffi::{c_void, CStr};

use ash::vk;
use tracing::{debug, error, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Verbose,
    Info,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    General,
    Validation,
    Performance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage<'a> {
    pub severity: Severity,
    pub category: Category,
    pub text: Cow<'a, str>,
}

impl DiagnosticMessage<'_> {
    pub fn classify(
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        types: vk::DebugUtilsMessageTypeFlagsEXT,
    ) -> (Severity, Category) {
        type S = vk::DebugUtilsMessageSeverityFlagsEXT;
        type T = vk::DebugUtilsMessageTypeFlagsEXT;

        let severity = if severity.contains(S::ERROR) {
            Severity::Error
        } else if severity.contains(S::WARNING) {
            Severity::Warning
        } else if severity.contains(S::INFO) {
            Severity::Info
        } else {
            Severity::Verbose
        };
        // validation outranks performance when a message carries both
        let category = if types.contains(T::VALIDATION) {
            Category::Validation
        } else if types.contains(T::PERFORMANCE) {
            Category::Performance
        } else {
            Category::General
        };
        (severity, category)
    }

    pub fn forward(&self) {
        let category = self.category;
        match self.severity {
            Severity::Error => error!(?category, "[vulkan] {}", self.text),
            Severity::Warning => warn!(?category, "[vulkan] {}", self.text),
            Severity::Info => debug!(?category, "[vulkan] {}", self.text),
            Severity::Verbose => trace!(?category, "[vulkan] {}", self.text),
        }
    }
}

pub fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let p_message = unsafe { (*data).p_message };
    if p_message.is_null() {
        return vk::FALSE;
    }
    let text = unsafe { CStr::from_ptr(p_message) }.to_string_lossy();
    let (severity, category) = DiagnosticMessage::classify(severity, types);
    DiagnosticMessage {
        severity,
        category,
        text,
    }
    .forward();
    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    type S = vk::DebugUtilsMessageSeverityFlagsEXT;
    type T = vk::DebugUtilsMessageTypeFlagsEXT;

    #[test]
    fn severity_maps_to_the_highest_bit() {
        assert_eq!(DiagnosticMessage::classify(S::ERROR, T::GENERAL).0, Severity::Error);
        assert_eq!(DiagnosticMessage::classify(S::WARNING, T::GENERAL).0, Severity::Warning);
        assert_eq!(DiagnosticMessage::classify(S::INFO, T::GENERAL).0, Severity::Info);
        assert_eq!(DiagnosticMessage::classify(S::VERBOSE, T::GENERAL).0, Severity::Verbose);
    }

    #[test]
    fn category_prefers_validation() {
        let (_, c) = DiagnosticMessage::classify(S::WARNING, T::PERFORMANCE | T::VALIDATION);
        assert_eq!(c, Category::Validation);
        let (_, c) = DiagnosticMessage::classify(S::WARNING, T::PERFORMANCE);
        assert_eq!(c, Category::Performance);
        let (_, c) = DiagnosticMessage::classify(S::INFO, T::GENERAL);
        assert_eq!(c, Category::General);
    }

    #[test]
    fn messenger_listens_to_warnings_and_errors() {
        let info = messenger_create_info();
        assert!(info.message_severity.contains(S::WARNING | S::ERROR));
        assert!(info.message_type.contains(T::VALIDATION));
        assert!(info.pfn_user_callback.is_some());
    }
}
