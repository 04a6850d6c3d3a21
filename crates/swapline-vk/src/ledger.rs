// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

/// A driver object owned by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Surface(vk::SurfaceKHR),
    Device(vk::Device),
    Swapchain(vk::SwapchainKHR),
    ImageView(vk::ImageView),
}

/// Creation-ordered record of owned resources.
///
/// Every object depends on the ones recorded before it, so release must walk
/// the ledger backwards. `unwind` is the only way entries leave.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<Resource>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, resource: Resource) {
        self.entries.push(resource);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Resource] {
        &self.entries
    }

    /// Drain in reverse creation order.
    pub fn unwind(&mut self) -> impl Iterator<Item = Resource> + '_ {
        self.entries.drain(..).rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn unwinds_newest_first_and_empties() {
        let mut ledger = Ledger::new();
        ledger.record(Resource::Surface(vk::SurfaceKHR::from_raw(1)));
        ledger.record(Resource::Device(vk::Device::from_raw(2)));
        ledger.record(Resource::Swapchain(vk::SwapchainKHR::from_raw(3)));
        ledger.record(Resource::ImageView(vk::ImageView::from_raw(4)));
        ledger.record(Resource::ImageView(vk::ImageView::from_raw(5)));

        let order: Vec<_> = ledger.unwind().collect();
        assert_eq!(
            order,
            vec![
                Resource::ImageView(vk::ImageView::from_raw(5)),
                Resource::ImageView(vk::ImageView::from_raw(4)),
                Resource::Swapchain(vk::SwapchainKHR::from_raw(3)),
                Resource::Device(vk::Device::from_raw(2)),
                Resource::Surface(vk::SurfaceKHR::from_raw(1)),
            ]
        );
        assert!(ledger.is_empty());
    }
}
