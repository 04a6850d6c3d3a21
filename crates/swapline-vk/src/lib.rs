// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
//! Vulkan device and swapchain negotiation.
//!
//! Catalog -> selector -> device -> negotiate -> views, driven by
//! [`Pipeline`]. Pure decision logic lives in the stage modules; driver
//! calls go through the [`Driver`] trait, implemented over `ash` by
//! [`AshDriver`].

pub mod ash_driver;
pub mod catalog;
pub mod device;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod instance;
pub mod ledger;
pub mod negotiate;
pub mod pipeline;
pub mod requirements;
pub mod selector;
pub mod views;

pub use ash;
pub use ash_driver::AshDriver;
pub use catalog::{AdapterDescriptor, QueueFamilyDescriptor};
pub use device::DeviceBundle;
pub use driver::{DeviceRequest, Driver};
pub use error::{PipelineError, PipelineResult};
pub use instance::InstanceSettings;
pub use ledger::{Ledger, Resource};
pub use negotiate::{PresentationChain, SwapchainPlan};
pub use pipeline::{Pipeline, Stage};
pub use requirements::{DeviceFeatures, DeviceRequirements, Unmet};
