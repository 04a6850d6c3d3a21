// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use swapline_surface::PresentTarget;
use tracing::{debug, info};

use crate::catalog::AdapterDescriptor;
use crate::device::{self, DeviceBundle};
use crate::driver::Driver;
use crate::error::{PipelineError, PipelineResult};
use crate::ledger::{Ledger, Resource};
use crate::negotiate::{self, PresentationChain};
use crate::requirements::DeviceRequirements;
use crate::selector;
use crate::views;

/// Forward-only progress of the pipeline. A failed stage is fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    AdapterSelected,
    DeviceReady,
    ChainReady,
    ViewsReady,
}

/// Adapter selection through image views, with every created object
/// recorded in a [`Ledger`] and released in reverse on drop.
pub struct Pipeline<D: Driver> {
    stage: Stage,
    surface: vk::SurfaceKHR,
    adapter: Option<AdapterDescriptor>,
    device: Option<DeviceBundle>,
    chain: Option<PresentationChain>,
    views: Vec<vk::ImageView>,
    ledger: Ledger,
    driver: D,
}

impl<D: Driver> Pipeline<D> {
    /// Creates the presentation surface for `target`; nothing else yet.
    pub fn new(mut driver: D, target: &dyn PresentTarget) -> PipelineResult<Self> {
        let surface = driver.create_surface(target)?;
        let mut ledger = Ledger::new();
        ledger.record(Resource::Surface(surface));
        Ok(Self {
            stage: Stage::Uninitialized,
            surface,
            adapter: None,
            device: None,
            chain: None,
            views: Vec::new(),
            ledger,
            driver,
        })
    }

    /// Runs every stage. The same `requirements` drive selection and
    /// device creation.
    pub fn initialize(
        driver: D,
        target: &dyn PresentTarget,
        requirements: &DeviceRequirements,
    ) -> PipelineResult<Self> {
        let mut pipeline = Self::new(driver, target)?;
        pipeline.select_adapter(requirements)?;
        pipeline.build_device(requirements)?;
        pipeline.negotiate_chain(target)?;
        pipeline.create_views()?;

        if let Some(chain) = &pipeline.chain {
            info!(
                "swapchain ready ({}x{}, {:?}, {} images, {} views)",
                chain.extent().width,
                chain.extent().height,
                chain.format(),
                chain.images.len(),
                pipeline.views.len()
            );
        }
        Ok(pipeline)
    }

    fn expect_stage(&self, expected: Stage) -> PipelineResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(PipelineError::OutOfOrder {
                expected,
                found: self.stage,
            })
        }
    }

    pub fn select_adapter(
        &mut self,
        requirements: &DeviceRequirements,
    ) -> PipelineResult<&AdapterDescriptor> {
        self.expect_stage(Stage::Uninitialized)?;
        let adapters = self
            .driver
            .enumerate_adapters()
            .map_err(PipelineError::driver("vkEnumeratePhysicalDevices"))?;
        debug!("{} adapter(s) enumerated", adapters.len());

        let chosen = selector::select_adapter(&adapters, requirements)?.clone();
        self.stage = Stage::AdapterSelected;
        Ok(self.adapter.insert(chosen))
    }

    pub fn build_device(
        &mut self,
        requirements: &DeviceRequirements,
    ) -> PipelineResult<&DeviceBundle> {
        self.expect_stage(Stage::AdapterSelected)?;
        let Some(adapter) = self.adapter.as_ref() else {
            return Err(PipelineError::OutOfOrder {
                expected: Stage::AdapterSelected,
                found: self.stage,
            });
        };

        let bundle = device::build_device(&mut self.driver, adapter, self.surface, requirements)?;
        self.ledger.record(Resource::Device(bundle.device));
        self.stage = Stage::DeviceReady;
        Ok(self.device.insert(bundle))
    }

    pub fn negotiate_chain(
        &mut self,
        target: &dyn PresentTarget,
    ) -> PipelineResult<&PresentationChain> {
        self.expect_stage(Stage::DeviceReady)?;
        let Some(adapter) = self.adapter.as_ref() else {
            return Err(PipelineError::OutOfOrder {
                expected: Stage::DeviceReady,
                found: self.stage,
            });
        };

        let ledger = &mut self.ledger;
        let chain = negotiate::create_chain(
            &mut self.driver,
            adapter,
            self.surface,
            || target.drawable_size(),
            |swapchain| ledger.record(Resource::Swapchain(swapchain)),
        )?;
        self.stage = Stage::ChainReady;
        Ok(self.chain.insert(chain))
    }

    pub fn create_views(&mut self) -> PipelineResult<&[vk::ImageView]> {
        self.expect_stage(Stage::ChainReady)?;
        let Some(chain) = self.chain.as_ref() else {
            return Err(PipelineError::OutOfOrder {
                expected: Stage::ChainReady,
                found: self.stage,
            });
        };

        let ledger = &mut self.ledger;
        self.views = views::create_views(&mut self.driver, chain, |view| {
            ledger.record(Resource::ImageView(view))
        })?;
        self.stage = Stage::ViewsReady;
        Ok(&self.views)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn adapter(&self) -> Option<&AdapterDescriptor> {
        self.adapter.as_ref()
    }

    pub fn device(&self) -> Option<&DeviceBundle> {
        self.device.as_ref()
    }

    pub fn queue(&self) -> Option<vk::Queue> {
        self.device.map(|d| d.queue)
    }

    pub fn queue_family(&self) -> Option<u32> {
        self.device.map(|d| d.queue_family)
    }

    /// Format, extent and images for the rendering stage, which must not
    /// reorder them.
    pub fn chain(&self) -> Option<&PresentationChain> {
        self.chain.as_ref()
    }

    /// Index-for-index with `chain().images`.
    pub fn views(&self) -> &[vk::ImageView] {
        &self.views
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

impl<D: Driver> Drop for Pipeline<D> {
    fn drop(&mut self) {
        self.driver.wait_idle();
        let count = self.ledger.len();
        for resource in self.ledger.unwind() {
            self.driver.destroy(resource);
        }
        debug!("pipeline released {count} object(s) at stage {:?}", self.stage);
    }
}
